// src/handlers/responses.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    export::{self, ExportFile, ExportFormat, ExportSheet, ResponseDocument, format_timestamp},
    handlers::surveys::load_owned,
    models::{response::SurveyResponse, survey::SurveySummary},
    render::{DetailView, Renderer, ResponseRow, ResponsesView},
    utils::jwt::Claims,
};

/// Responses of one survey, oldest first.
pub(crate) async fn load_responses(
    pool: &SqlitePool,
    survey_id: i64,
) -> Result<Vec<SurveyResponse>, AppError> {
    sqlx::query_as::<_, SurveyResponse>(
        "SELECT id, survey_id, submitted_at, answers FROM responses WHERE survey_id = ? ORDER BY id",
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load responses of survey {}: {:?}", survey_id, e);
        AppError::InternalServerError(e.to_string())
    })
}

async fn load_response(
    pool: &SqlitePool,
    survey_id: i64,
    response_id: i64,
) -> Result<SurveyResponse, AppError> {
    sqlx::query_as::<_, SurveyResponse>(
        "SELECT id, survey_id, submitted_at, answers FROM responses WHERE id = ? AND survey_id = ?",
    )
    .bind(response_id)
    .bind(survey_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Response not found".to_string()))
}

fn survey_export_links(survey_id: i64) -> Vec<(String, String)> {
    ["csv", "json", "xlsx", "pdf"]
        .iter()
        .map(|ext| {
            (
                ext.to_uppercase(),
                format!("/api/surveys/{survey_id}/export/{ext}"),
            )
        })
        .collect()
}

pub async fn list_responses(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_owned(&pool, id, claims.user_id()?).await?;
    let mut responses = load_responses(&pool, survey.id).await?;
    responses.reverse();
    Ok(Json(responses))
}

pub async fn get_response(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, rid)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_owned(&pool, id, claims.user_id()?).await?;
    let response = load_response(&pool, survey.id, rid).await?;
    Ok(Json(response))
}

pub async fn delete_response(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, rid)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_owned(&pool, id, claims.user_id()?).await?;

    let result = sqlx::query("DELETE FROM responses WHERE id = ? AND survey_id = ?")
        .bind(rid)
        .bind(survey.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete response {}: {:?}", rid, e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Response not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Total responses and the most recent submission time.
pub async fn survey_summary(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_owned(&pool, id, claims.user_id()?).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM responses WHERE survey_id = ?")
        .bind(survey.id)
        .fetch_one(&pool)
        .await?;

    let last_submitted_at: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT submitted_at FROM responses WHERE survey_id = ? ORDER BY submitted_at DESC, id DESC LIMIT 1",
    )
    .bind(survey.id)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(SurveySummary {
        total,
        last_submitted_at,
    }))
}

/// Every response of a survey as CSV, JSON, XLSX or PDF.
pub async fn export_survey(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, format)): Path<(i64, ExportFormat)>,
) -> Result<ExportFile, AppError> {
    let survey = load_owned(&pool, id, claims.user_id()?).await?;
    let responses = load_responses(&pool, survey.id).await?;
    let stem = format!("survey-{}-responses", survey.id);

    let file = match format {
        ExportFormat::Csv => {
            let sheet = ExportSheet::for_survey(&survey, &responses);
            ExportFile::new(&stem, format, export::csv::write_sheet(&sheet))
        }
        ExportFormat::Xlsx => {
            let sheet = ExportSheet::for_survey(&survey, &responses);
            ExportFile::new(&stem, format, export::xlsx::write_sheet(&sheet)?)
        }
        ExportFormat::Json => {
            ExportFile::new(&stem, format, export::json::survey_dump(&survey, &responses)?)
        }
        ExportFormat::Pdf => {
            let docs: Vec<ResponseDocument> = responses
                .iter()
                .map(|r| ResponseDocument::for_survey_response(&survey, r))
                .collect();
            ExportFile::new(
                &stem,
                format,
                export::pdf::write_documents_pdf(&survey.meta.title, &docs)?,
            )
        }
        ExportFormat::Txt => {
            return Err(AppError::BadRequest(
                "Survey exports are available as csv, json, xlsx or pdf".to_string(),
            ));
        }
    };

    tracing::info!(
        "Exported {} responses of survey {} as {}",
        responses.len(),
        survey.id,
        format.extension()
    );
    Ok(file)
}

/// One response as JSON, a text summary or PDF.
pub async fn export_response(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, rid, format)): Path<(i64, i64, ExportFormat)>,
) -> Result<ExportFile, AppError> {
    let survey = load_owned(&pool, id, claims.user_id()?).await?;
    let response = load_response(&pool, survey.id, rid).await?;
    let stem = format!("survey-response-{}", response.id);

    match format {
        ExportFormat::Json => Ok(ExportFile::new(
            &stem,
            format,
            export::json::record(&response)?,
        )),
        ExportFormat::Txt => {
            let doc = ResponseDocument::for_survey_response(&survey, &response);
            Ok(ExportFile::new(&stem, format, export::text::summary(&doc)))
        }
        ExportFormat::Pdf => {
            let doc = ResponseDocument::for_survey_response(&survey, &response);
            Ok(ExportFile::new(
                &stem,
                format,
                export::pdf::write_document_pdf(&doc)?,
            ))
        }
        ExportFormat::Csv | ExportFormat::Xlsx => Err(AppError::BadRequest(
            "Single responses are available as json, txt or pdf".to_string(),
        )),
    }
}

/// HTML list of collected responses, newest first.
pub async fn responses_page(
    State(pool): State<SqlitePool>,
    State(templates): State<Arc<Renderer>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_owned(&pool, id, claims.user_id()?).await?;
    let responses = load_responses(&pool, survey.id).await?;

    let rows: Vec<ResponseRow> = responses
        .iter()
        .rev()
        .map(|r| ResponseRow {
            label: format!("Response #{}", r.id),
            collected_at: format_timestamp(r.submitted_at),
            subtitle: None,
            detail_url: format!("/surveys/{}/responses/{}", survey.id, r.id),
        })
        .collect();

    let view = ResponsesView {
        title: format!("{}: Collected Responses", survey.meta.title),
        count: rows.len(),
        rows,
        export_links: survey_export_links(survey.id),
    };
    Ok(Html(templates.responses(&view)?))
}

pub async fn response_page(
    State(pool): State<SqlitePool>,
    State(templates): State<Arc<Renderer>>,
    Extension(claims): Extension<Claims>,
    Path((id, rid)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_owned(&pool, id, claims.user_id()?).await?;
    let response = load_response(&pool, survey.id, rid).await?;

    let export_links = ["json", "txt", "pdf"]
        .iter()
        .map(|ext| {
            (
                ext.to_uppercase(),
                format!("/api/surveys/{}/responses/{}/export/{ext}", survey.id, response.id),
            )
        })
        .collect();

    let view = DetailView::from_document(
        ResponseDocument::for_survey_response(&survey, &response),
        format!("/surveys/{}/responses", survey.id),
        export_links,
    );
    Ok(Html(templates.response_detail(&view)?))
}
