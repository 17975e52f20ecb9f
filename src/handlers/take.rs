// src/handlers/take.rs
//
// Public respondent surface: JSON for script clients and a form-driven HTML taker.

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use chrono::Utc;
use serde_json::json;
use sqlx::{SqlitePool, types::Json as SqlJson};

use crate::{
    error::AppError,
    handlers::surveys::SURVEY_COLUMNS,
    models::{
        response::{Answers, SubmitAnswersRequest},
        survey::{PublicSurvey, Survey},
    },
    render::{MessageView, Renderer, TakeView},
    survey::{
        taker::{TakerSession, answers_from_form, single_question_pages},
        validate::{retain_known, validate_page},
    },
};

async fn load_published(pool: &SqlitePool, id: i64) -> Result<Survey, AppError> {
    sqlx::query_as::<_, Survey>(&format!(
        "SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = ? AND published = TRUE"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Survey not found".to_string()))
}

async fn response_count(pool: &SqlitePool, survey_id: i64) -> Result<i64, AppError> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM responses WHERE survey_id = ?")
            .bind(survey_id)
            .fetch_one(pool)
            .await?,
    )
}

/// Persists a complete, validated set of answers.
///
/// Fails with `Conflict` when the survey is past its closing date or its response limit.
/// Answers to ids outside the current structure are dropped.
async fn store_response(pool: &SqlitePool, survey: &Survey, answers: Answers) -> Result<i64, AppError> {
    // Immediate, so two submitters cannot both pass the limit check.
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM responses WHERE survey_id = ?")
        .bind(survey.id)
        .fetch_one(&mut *tx)
        .await?;
    if let Some(reason) = survey.settings.closed_reason(Utc::now(), count) {
        return Err(AppError::Conflict(reason.to_string()));
    }

    let answers = retain_known(&survey.questions, answers);
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO responses (survey_id, submitted_at, answers) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(survey.id)
    .bind(Utc::now())
    .bind(SqlJson(&answers))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store response for survey {}: {:?}", survey.id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    tx.commit().await?;
    tracing::info!("Response {} recorded for survey {}", id, survey.id);
    Ok(id)
}

pub async fn get_public_survey(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_published(&pool, id).await?;
    Ok(Json(PublicSurvey::from(survey)))
}

/// Checks the answers on one page before the respondent moves on.
pub async fn validate_survey_page(
    State(pool): State<SqlitePool>,
    Path((id, page)): Path<(i64, usize)>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_published(&pool, id).await?;
    let pages = single_question_pages(&survey.questions);
    let current = pages
        .get(page)
        .ok_or(AppError::NotFound("Page not found".to_string()))?;

    validate_page(&current.questions, &payload.answers).map_err(AppError::Validation)?;

    let is_last = page + 1 == pages.len();
    Ok(Json(json!({
        "next_page": if is_last { None } else { Some(page + 1) },
        "is_last": is_last,
    })))
}

pub async fn submit_response(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_published(&pool, id).await?;
    validate_page(&survey.questions, &payload.answers).map_err(AppError::Validation)?;

    let response_id = store_response(&pool, &survey, payload.answers).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": response_id }))))
}

fn take_view(survey: &Survey, session: &TakerSession) -> TakeView {
    TakeView::from_session(
        session,
        &survey.meta.title,
        Some(&survey.meta.consent),
        &format!("/take/{}", survey.id),
    )
}

fn closed_view(survey: &Survey, reason: String) -> MessageView {
    MessageView {
        title: survey.meta.title.clone(),
        message: reason,
        link: None,
    }
}

fn form_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// First page of the HTML taker.
pub async fn take_form(
    State(pool): State<SqlitePool>,
    State(templates): State<Arc<Renderer>>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let survey = load_published(&pool, id).await?;

    let count = response_count(&pool, survey.id).await?;
    if let Some(reason) = survey.settings.closed_reason(Utc::now(), count) {
        return Ok(Html(templates.closed(&closed_view(&survey, reason.to_string()))?));
    }

    let session = TakerSession::new(single_question_pages(&survey.questions));
    Ok(Html(templates.take(&take_view(&survey, &session))?))
}

/// Handles one navigation step of the HTML taker.
///
/// The form carries `__page`, `__action` (`prev`, `next` or `submit`) and every
/// answer given so far, so no server-side session is kept.
pub async fn take_step(
    State(pool): State<SqlitePool>,
    State(templates): State<Arc<Renderer>>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let survey = load_published(&pool, id).await?;

    let page = form_value(&pairs, "__page")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let answers = answers_from_form(survey.questions.iter(), &pairs);
    let mut session =
        TakerSession::resume(single_question_pages(&survey.questions), page, answers);

    match form_value(&pairs, "__action").unwrap_or("next") {
        "prev" => session.prev(),
        "submit" => {
            if let Ok(answers) = session.finish() {
                return match store_response(&pool, &survey, answers).await {
                    Ok(_) => Ok(Html(templates.thanks(&MessageView {
                        title: "Thank you".to_string(),
                        message: "Your response has been recorded.".to_string(),
                        link: None,
                    })?)),
                    Err(AppError::Conflict(reason)) => {
                        Ok(Html(templates.closed(&closed_view(&survey, reason))?))
                    }
                    Err(e) => Err(e),
                };
            }
        }
        _ => {
            session.next();
        }
    }

    Ok(Html(templates.take(&take_view(&survey, &session))?))
}
