// src/handlers/surveys.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{
            CreateQuestionRequest, MoveRequest, OptionRequest, ReorderRequest,
            UpdateQuestionRequest,
        },
        survey::{CreateSurveyRequest, PublishRequest, Survey, UpdateSurveyRequest},
    },
    survey::builder::{BuilderError, Editor, check_publishable},
    utils::{
        jwt::Claims,
        text::{tidy, tidy_all},
    },
};

pub(crate) const SURVEY_COLUMNS: &str = "id, owner_id, title, organization, researcher, consent, \
     questions, closing_date, response_limit, published, next_question_seq, created_at, updated_at";

/// Loads a survey owned by `owner_id`. Surveys of other owners are reported as missing.
pub(crate) async fn load_owned<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    owner_id: i64,
) -> Result<Survey, AppError> {
    sqlx::query_as::<_, Survey>(&format!(
        "SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load survey {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Survey not found".to_string()))
}

/// Opens a write transaction up front, so a load inside it sees every earlier
/// committed edit and no other writer can commit until it ends.
async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, AppError> {
    pool.begin_with("BEGIN IMMEDIATE").await.map_err(|e| {
        tracing::error!("Failed to open write transaction: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })
}

async fn save_questions<'e>(
    executor: impl SqliteExecutor<'e>,
    survey: &mut Survey,
) -> Result<(), AppError> {
    survey.updated_at = Utc::now();
    sqlx::query(
        "UPDATE surveys SET questions = ?, next_question_seq = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&survey.questions)
    .bind(survey.next_question_seq)
    .bind(survey.updated_at)
    .bind(survey.id)
    .execute(executor)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save questions of survey {}: {:?}", survey.id, e);
        AppError::InternalServerError(e.to_string())
    })?;
    Ok(())
}

/// Loads the caller's survey, applies one structural edit and re-saves the question list,
/// all inside one write transaction. A failed edit rolls back.
async fn edit<T, F>(
    pool: &SqlitePool,
    claims: &Claims,
    id: i64,
    apply: F,
) -> Result<(Survey, T), AppError>
where
    F: FnOnce(&mut Editor<'_>) -> Result<T, BuilderError>,
{
    let owner_id = claims.user_id()?;
    let mut tx = begin_write(pool).await?;

    let mut survey = load_owned(&mut *tx, id, owner_id).await?;
    let out = {
        let mut editor = Editor::of(&mut survey);
        apply(&mut editor)?
    };
    save_questions(&mut *tx, &mut survey).await?;

    tx.commit().await?;
    Ok((survey, out))
}

/// Lists the caller's surveys, newest first.
pub async fn list_surveys(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let surveys = sqlx::query_as::<_, Survey>(&format!(
        "SELECT {SURVEY_COLUMNS} FROM surveys WHERE owner_id = ? ORDER BY id DESC"
    ))
    .bind(claims.user_id()?)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list surveys: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(surveys))
}

pub async fn create_survey(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSurveyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let now = Utc::now();
    let survey = sqlx::query_as::<_, Survey>(&format!(
        r#"
        INSERT INTO surveys
            (owner_id, title, organization, researcher, consent, questions,
             closing_date, response_limit, published, next_question_seq, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, '[]', ?, ?, FALSE, 0, ?, ?)
        RETURNING {SURVEY_COLUMNS}
        "#
    ))
    .bind(claims.user_id()?)
    .bind(tidy(&payload.title))
    .bind(tidy(&payload.organization))
    .bind(tidy(&payload.researcher))
    .bind(tidy(&payload.consent))
    .bind(payload.closing_date)
    .bind(payload.response_limit)
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create survey: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!("Survey {} created by owner {}", survey.id, survey.owner_id);
    Ok((StatusCode::CREATED, Json(survey)))
}

pub async fn get_survey(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let survey = load_owned(&pool, id, claims.user_id()?).await?;
    Ok(Json(survey))
}

/// Updates metadata and collection settings. Structure is edited through the question routes.
pub async fn update_survey(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSurveyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if let Some(Some(limit)) = payload.response_limit {
        if limit < 1 {
            return Err(AppError::BadRequest(
                "response_limit must be at least 1".to_string(),
            ));
        }
    }

    let owner_id = claims.user_id()?;
    let mut tx = begin_write(&pool).await?;
    let mut survey = load_owned(&mut *tx, id, owner_id).await?;

    if let Some(title) = payload.title {
        survey.meta.title = tidy(&title);
    }
    if let Some(organization) = payload.organization {
        survey.meta.organization = tidy(&organization);
    }
    if let Some(researcher) = payload.researcher {
        survey.meta.researcher = tidy(&researcher);
    }
    if let Some(consent) = payload.consent {
        survey.meta.consent = tidy(&consent);
    }
    if let Some(closing_date) = payload.closing_date {
        survey.settings.closing_date = closing_date;
    }
    if let Some(response_limit) = payload.response_limit {
        survey.settings.response_limit = response_limit;
    }
    survey.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE surveys
        SET title = ?, organization = ?, researcher = ?, consent = ?,
            closing_date = ?, response_limit = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&survey.meta.title)
    .bind(&survey.meta.organization)
    .bind(&survey.meta.researcher)
    .bind(&survey.meta.consent)
    .bind(survey.settings.closing_date)
    .bind(survey.settings.response_limit)
    .bind(survey.updated_at)
    .bind(survey.id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update survey {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    tx.commit().await?;
    Ok(Json(survey))
}

/// Deletes a survey together with every response collected for it.
pub async fn delete_survey(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_write(&pool).await?;

    let owned: Option<(i64,)> = sqlx::query_as("SELECT id FROM surveys WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(claims.user_id()?)
        .fetch_optional(&mut *tx)
        .await?;
    if owned.is_none() {
        return Err(AppError::NotFound("Survey not found".to_string()));
    }

    let removed = sqlx::query("DELETE FROM responses WHERE survey_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM surveys WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to delete survey {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!("Survey {} deleted with {} responses", id, removed);
    Ok(StatusCode::NO_CONTENT)
}

/// Opens or closes a survey to respondents. Opening requires a complete structure.
pub async fn publish_survey(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<PublishRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.user_id()?;
    let mut tx = begin_write(&pool).await?;
    let mut survey = load_owned(&mut *tx, id, owner_id).await?;
    if payload.published {
        check_publishable(&survey)?;
    }

    survey.published = payload.published;
    survey.updated_at = Utc::now();
    sqlx::query("UPDATE surveys SET published = ?, updated_at = ? WHERE id = ?")
        .bind(survey.published)
        .bind(survey.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Json(survey))
}

fn tidy_question(mut req: CreateQuestionRequest) -> CreateQuestionRequest {
    req.text = tidy(&req.text);
    req.options = tidy_all(&req.options);
    req
}

pub async fn add_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let payload = tidy_question(payload);

    let (_, question) = edit(&pool, &claims, id, |editor| Ok(editor.add_question(payload))).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn update_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid)): Path<(i64, String)>,
    Json(mut payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    payload.text = payload.text.map(|t| tidy(&t));
    payload.options = payload.options.map(|o| tidy_all(&o));

    let (_, question) = edit(&pool, &claims, id, |editor| {
        editor.update_question(&qid, payload)
    })
    .await?;
    Ok(Json(question))
}

/// Removes a question. Answers already collected for it are kept in stored responses.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    edit(&pool, &claims, id, |editor| editor.remove_question(&qid)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn duplicate_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (_, copy) = edit(&pool, &claims, id, |editor| editor.duplicate_question(&qid)).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// Moves one question; returns the new order.
pub async fn move_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid)): Path<(i64, String)>,
    Json(payload): Json<MoveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (survey, ()) = edit(&pool, &claims, id, |editor| {
        editor.move_question(&qid, payload.to)
    })
    .await?;
    Ok(Json(survey.questions.0))
}

/// Replaces the question order. `ids` must name every question exactly once.
pub async fn reorder_questions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ReorderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (survey, ()) = edit(&pool, &claims, id, |editor| editor.reorder(&payload.ids)).await?;
    Ok(Json(survey.questions.0))
}

pub async fn add_option(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid)): Path<(i64, String)>,
    Json(payload): Json<OptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let text = tidy(&payload.text);

    let (_, question) = edit(&pool, &claims, id, |editor| editor.add_option(&qid, text)).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn rename_option(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid, index)): Path<(i64, String, usize)>,
    Json(payload): Json<OptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let text = tidy(&payload.text);

    let (_, question) = edit(&pool, &claims, id, |editor| {
        editor.rename_option(&qid, index, text)
    })
    .await?;
    Ok(Json(question))
}

pub async fn delete_option(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid, index)): Path<(i64, String, usize)>,
) -> Result<impl IntoResponse, AppError> {
    let (_, question) = edit(&pool, &claims, id, |editor| editor.remove_option(&qid, index)).await?;
    Ok(Json(question))
}

pub async fn move_option(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid, index)): Path<(i64, String, usize)>,
    Json(payload): Json<MoveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (_, question) = edit(&pool, &claims, id, |editor| {
        editor.move_option(&qid, index, payload.to)
    })
    .await?;
    Ok(Json(question))
}
