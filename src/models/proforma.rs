// src/models/proforma.rs

use serde::{Deserialize, Serialize};

use super::{question::Question, response::Answers};

/// A titled group of questions in the static proforma.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: &'static str,
    pub title: &'static str,
    pub questions: Vec<Question>,
}

/// Interviewer notes collected on the final page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notes {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub tehsil: String,
    #[serde(default)]
    pub observations: String,
}

/// One proforma interview. Stored as an element of the flat list in the key/value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProformaResponse {
    /// `P-<milliseconds since epoch>`, with a `-2`, `-3`, ... suffix when that id is taken.
    pub participant_id: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub answers: Answers,
    #[serde(default)]
    pub notes: Notes,
}

impl ProformaResponse {
    pub fn collected_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
    }
}
