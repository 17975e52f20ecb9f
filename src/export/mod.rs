//! Flattening of surveys and responses into exportable shapes, plus the
//! per-format writers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    models::{
        proforma::{ProformaResponse, Section},
        response::{Answer, SurveyResponse},
        survey::Survey,
    },
    proforma,
};

pub mod csv;
pub mod json;
pub mod pdf;
pub mod text;
pub mod xlsx;

#[derive(Debug)]
pub enum ExportError {
    Xlsx(rust_xlsxwriter::XlsxError),
    Pdf(String),
    Json(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Xlsx(e) => write!(f, "xlsx export failed: {e}"),
            ExportError::Pdf(e) => write!(f, "pdf export failed: {e}"),
            ExportError::Json(e) => write!(f, "json export failed: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Xlsx(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Json(err)
    }
}

/// Output formats, as they appear in export URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
    Pdf,
    Txt,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Txt => "txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }
}

/// Rendered export ready to be sent as an attachment.
#[derive(Debug)]
pub struct ExportFile {
    pub filename: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// `stem` is the file name without extension.
    pub fn new(stem: &str, format: ExportFormat, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: format!("{stem}.{}", format.extension()),
            format,
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl From<Option<&Answer>> for Cell {
    fn from(answer: Option<&Answer>) -> Self {
        match answer {
            None => Cell::Empty,
            Some(Answer::Number(n)) => Cell::Number(*n),
            Some(a) if a.is_blank() => Cell::Empty,
            Some(a) => Cell::Text(a.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    /// Machine-readable header, used by CSV.
    pub key: String,
    /// Human-readable header, used by XLSX.
    pub label: String,
}

impl Column {
    fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// All responses flattened into one table, one column per question.
#[derive(Debug, Clone)]
pub struct ExportSheet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

impl ExportSheet {
    /// Columns follow the current question order. Answers to questions that
    /// have since been removed are not exported.
    pub fn for_survey(survey: &Survey, responses: &[SurveyResponse]) -> Self {
        let mut columns = vec![
            Column::new("response_id", "Response ID"),
            Column::new("submitted_at", "Submitted At"),
        ];
        columns.extend(survey.questions.iter().map(|q| Column::new(&q.id, &q.text)));

        let rows = responses
            .iter()
            .map(|r| {
                let mut row = vec![
                    Cell::Number(r.id as f64),
                    Cell::Text(r.submitted_at.to_rfc3339()),
                ];
                row.extend(survey.questions.iter().map(|q| Cell::from(r.answers.get(&q.id))));
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn for_proforma(responses: &[ProformaResponse]) -> Self {
        let sections = proforma::structure::sections();
        let mut columns = vec![
            Column::new("participantId", "Participant ID"),
            Column::new("timestamp", "Timestamp"),
            Column::new("notes_language", "Language"),
            Column::new("notes_tehsil", "Tehsil"),
            Column::new("notes_observations", "Observations"),
        ];
        columns.extend(
            proforma::questions(&sections)
                .map(|(s, q)| Column::new(format!("{}_{}", s.id, q.id), &q.text)),
        );

        let rows = responses
            .iter()
            .map(|r| {
                let timestamp = r
                    .collected_at()
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default();
                let mut row = vec![
                    Cell::Text(r.participant_id.clone()),
                    Cell::Text(timestamp),
                    text_cell(&r.notes.language),
                    text_cell(&r.notes.tehsil),
                    text_cell(&r.notes.observations),
                ];
                row.extend(
                    proforma::questions(&sections).map(|(_, q)| Cell::from(r.answers.get(&q.id))),
                );
                row
            })
            .collect();

        Self { columns, rows }
    }
}

fn text_cell(s: &str) -> Cell {
    if s.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(s.to_string())
    }
}

/// Question/answer listing of a single response, used by the PDF and text writers.
#[derive(Debug, Clone)]
pub struct ResponseDocument {
    pub title: String,
    pub header: Vec<(String, String)>,
    pub sections: Vec<DocumentSection>,
}

#[derive(Debug, Clone)]
pub struct DocumentSection {
    pub title: String,
    /// Question text and the answer, `None` when unanswered.
    pub rows: Vec<(String, Option<String>)>,
}

/// Placeholder the file exports print for unanswered questions.
pub const NOT_ANSWERED: &str = "N/A";

fn answer_text(answer: Option<&Answer>) -> Option<String> {
    answer.filter(|a| !a.is_blank()).map(|a| a.to_string())
}

impl ResponseDocument {
    pub fn for_survey_response(survey: &Survey, response: &SurveyResponse) -> Self {
        let mut header = vec![("Survey".to_string(), survey.meta.title.clone())];
        if !survey.meta.organization.is_empty() {
            header.push(("Organization".to_string(), survey.meta.organization.clone()));
        }
        if !survey.meta.researcher.is_empty() {
            header.push(("Researcher".to_string(), survey.meta.researcher.clone()));
        }
        header.push(("Response ID".to_string(), response.id.to_string()));
        header.push(("Date".to_string(), format_timestamp(response.submitted_at)));

        let mut sections = vec![DocumentSection {
            title: "Answers".to_string(),
            rows: survey
                .questions
                .iter()
                .map(|q| (q.text.clone(), answer_text(response.answers.get(&q.id))))
                .collect(),
        }];

        let orphaned: Vec<(String, Option<String>)> = response
            .answers
            .iter()
            .filter(|(id, _)| !survey.questions.iter().any(|q| &q.id == *id))
            .map(|(id, a)| (id.clone(), answer_text(Some(a))))
            .collect();
        if !orphaned.is_empty() {
            sections.push(DocumentSection {
                title: "Removed questions".to_string(),
                rows: orphaned,
            });
        }

        Self {
            title: "Survey Response Summary".to_string(),
            header,
            sections,
        }
    }

    pub fn for_proforma(response: &ProformaResponse, sections: &[Section]) -> Self {
        let date = response
            .collected_at()
            .map(format_timestamp)
            .unwrap_or_default();
        let header = vec![
            ("Participant ID".to_string(), response.participant_id.clone()),
            ("Date".to_string(), date),
        ];

        let or_none = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        let mut doc_sections = vec![DocumentSection {
            title: "Survey Notes".to_string(),
            rows: vec![
                ("Language".to_string(), or_none(&response.notes.language)),
                ("Tehsil".to_string(), or_none(&response.notes.tehsil)),
                ("Observations".to_string(), or_none(&response.notes.observations)),
            ],
        }];
        doc_sections.extend(sections.iter().map(|s| DocumentSection {
            title: s.title.to_string(),
            rows: s
                .questions
                .iter()
                .map(|q| (q.text.clone(), answer_text(response.answers.get(&q.id))))
                .collect(),
        }));

        Self {
            title: "Survey Response Summary".to_string(),
            header,
            sections: doc_sections,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_sheet_follows_question_order() {
        let sheet = ExportSheet::for_survey(&fixtures::survey(), &fixtures::responses());
        let keys: Vec<&str> = sheet.columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["response_id", "submitted_at", "q1", "q2", "q3"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][3], Cell::Number(4.5));
        assert_eq!(sheet.rows[0][4], Cell::Text("Walk; Bus".into()));
        assert_eq!(sheet.rows[1][4], Cell::Empty);
    }

    #[test]
    fn proforma_sheet_prefixes_section_ids() {
        let sheet = ExportSheet::for_proforma(&[]);
        assert_eq!(sheet.columns[0].key, "participantId");
        assert!(sheet.columns.iter().any(|c| c.key == "demographic_age"));
        assert_eq!(sheet.columns.len(), 5 + 40);
    }

    #[test]
    fn document_lists_removed_questions_separately() {
        let survey = fixtures::survey();
        let responses = fixtures::responses();
        let doc = ResponseDocument::for_survey_response(&survey, &responses[1]);
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].rows[2], ("Transport".to_string(), None));
        assert_eq!(
            doc.sections[1].rows,
            vec![("q0".to_string(), Some("orphaned".to_string()))]
        );
    }
}
