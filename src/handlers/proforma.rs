// src/handlers/proforma.rs
//
// The static field proforma: dashboard, taker, listing and exports.

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use chrono::Utc;

use crate::{
    error::AppError,
    export::{self, ExportFile, ExportFormat, ExportSheet, ResponseDocument, format_timestamp},
    proforma::{self, ResponseLog, structure},
    render::{DetailView, HomeView, MessageView, Renderer, ResponseRow, ResponsesView, TakeView},
    survey::taker::{TakerSession, answers_from_form},
};

const TITLE: &str = "Field Survey Proforma";
const TAKE_URL: &str = "/proforma/take";

fn take_view(session: &TakerSession) -> TakeView {
    TakeView::from_session(session, TITLE, None, TAKE_URL)
}

/// Totals and the date of the most recent interview.
pub async fn dashboard(
    State(log): State<ResponseLog>,
    State(templates): State<Arc<Renderer>>,
) -> Result<impl IntoResponse, AppError> {
    let responses = log.load().await;
    let last_collection = responses
        .iter()
        .filter_map(|r| r.collected_at())
        .max()
        .map(format_timestamp)
        .unwrap_or_else(|| "N/A".to_string());

    let view = HomeView {
        title: "Field Survey Dashboard".to_string(),
        total_responses: responses.len(),
        last_collection,
    };
    Ok(Html(templates.home(&view)?))
}

pub async fn take_form(
    State(templates): State<Arc<Renderer>>,
) -> Result<impl IntoResponse, AppError> {
    let session = TakerSession::new(proforma::pages());
    Ok(Html(templates.take(&take_view(&session))?))
}

/// One navigation step; on submit the interview is appended to the log.
pub async fn take_step(
    State(log): State<ResponseLog>,
    State(templates): State<Arc<Renderer>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let pages = proforma::pages();
    let page = pairs
        .iter()
        .find(|(k, _)| k == "__page")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let action = pairs
        .iter()
        .find(|(k, _)| k == "__action")
        .map(|(_, v)| v.as_str())
        .unwrap_or("next");

    let answers = answers_from_form(pages.iter().flat_map(|p| p.questions.iter()), &pairs);
    let mut session = TakerSession::resume(pages, page, answers);

    match action {
        "prev" => session.prev(),
        "submit" => {
            if let Ok(answers) = session.finish() {
                let response = proforma::into_response(answers, Utc::now().timestamp_millis());
                let participant_id = log.add(response).await?;
                tracing::info!("Proforma response {} saved", participant_id);

                return Ok(Html(templates.thanks(&MessageView {
                    title: "Survey submitted".to_string(),
                    message: format!("Survey submitted successfully! Participant ID: {participant_id}"),
                    link: Some("/proforma".to_string()),
                })?));
            }
        }
        _ => {
            session.next();
        }
    }

    Ok(Html(templates.take(&take_view(&session))?))
}

pub async fn responses_page(
    State(log): State<ResponseLog>,
    State(templates): State<Arc<Renderer>>,
) -> Result<impl IntoResponse, AppError> {
    let responses = log.load().await;
    let rows: Vec<ResponseRow> = responses
        .iter()
        .rev()
        .map(|r| ResponseRow {
            label: r.participant_id.clone(),
            collected_at: r.collected_at().map(format_timestamp).unwrap_or_default(),
            subtitle: (!r.notes.tehsil.is_empty()).then(|| format!("Tehsil: {}", r.notes.tehsil)),
            detail_url: format!("/proforma/responses/{}", r.participant_id),
        })
        .collect();

    let view = ResponsesView {
        title: "Collected Responses".to_string(),
        count: rows.len(),
        rows,
        export_links: vec![
            ("CSV".to_string(), "/proforma/export/csv".to_string()),
            ("XLSX".to_string(), "/proforma/export/xlsx".to_string()),
        ],
    };
    Ok(Html(templates.responses(&view)?))
}

pub async fn response_page(
    State(log): State<ResponseLog>,
    State(templates): State<Arc<Renderer>>,
    Path(participant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let response = log
        .find(&participant_id)
        .await
        .ok_or(AppError::NotFound("Response not found".to_string()))?;

    let export_links = ["json", "txt", "pdf"]
        .iter()
        .map(|ext| {
            (
                ext.to_uppercase(),
                format!("/proforma/responses/{participant_id}/export/{ext}"),
            )
        })
        .collect();

    let view = DetailView::from_document(
        ResponseDocument::for_proforma(&response, &structure::sections()),
        "/proforma/responses".to_string(),
        export_links,
    );
    Ok(Html(templates.response_detail(&view)?))
}

pub async fn list_responses(State(log): State<ResponseLog>) -> impl IntoResponse {
    Json(log.load().await)
}

pub async fn delete_response(
    State(log): State<ResponseLog>,
    Path(participant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !log.delete(&participant_id).await? {
        return Err(AppError::NotFound("Response not found".to_string()));
    }
    tracing::info!("Proforma response {} deleted", participant_id);
    Ok(StatusCode::NO_CONTENT)
}

/// All interviews as CSV or XLSX.
pub async fn export_all(
    State(log): State<ResponseLog>,
    Path(format): Path<ExportFormat>,
) -> Result<ExportFile, AppError> {
    let sheet = ExportSheet::for_proforma(&log.load().await);
    let stem = "survey-responses-all";

    match format {
        ExportFormat::Csv => Ok(ExportFile::new(stem, format, export::csv::write_sheet(&sheet))),
        ExportFormat::Xlsx => Ok(ExportFile::new(stem, format, export::xlsx::write_sheet(&sheet)?)),
        _ => Err(AppError::BadRequest(
            "Proforma exports are available as csv or xlsx".to_string(),
        )),
    }
}

/// One interview as JSON, a text summary or PDF.
pub async fn export_one(
    State(log): State<ResponseLog>,
    Path((participant_id, format)): Path<(String, ExportFormat)>,
) -> Result<ExportFile, AppError> {
    let response = log
        .find(&participant_id)
        .await
        .ok_or(AppError::NotFound("Response not found".to_string()))?;
    let stem = format!("survey-response-{}", response.participant_id);

    match format {
        ExportFormat::Json => Ok(ExportFile::new(&stem, format, export::json::record(&response)?)),
        ExportFormat::Txt => {
            let doc = ResponseDocument::for_proforma(&response, &structure::sections());
            Ok(ExportFile::new(&stem, format, export::text::summary(&doc)))
        }
        ExportFormat::Pdf => {
            let doc = ResponseDocument::for_proforma(&response, &structure::sections());
            Ok(ExportFile::new(&stem, format, export::pdf::write_document_pdf(&doc)?))
        }
        ExportFormat::Csv | ExportFormat::Xlsx => Err(AppError::BadRequest(
            "Single responses are available as json, txt or pdf".to_string(),
        )),
    }
}
