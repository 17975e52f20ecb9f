// src/export/json.rs

use serde::Serialize;

use super::ExportError;
use crate::models::{response::SurveyResponse, survey::Survey};

#[derive(Serialize)]
struct SurveyDump<'a> {
    survey: &'a Survey,
    responses: &'a [SurveyResponse],
}

/// Pretty-printed dump of a survey and all of its responses.
pub fn survey_dump(survey: &Survey, responses: &[SurveyResponse]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&SurveyDump { survey, responses })?)
}

/// Pretty-printed dump of a single record.
pub fn record<T: Serialize>(record: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(record)?)
}
