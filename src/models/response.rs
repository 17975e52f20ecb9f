// src/models/response.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// One answer: free text, a number, or a set of picked options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Number(f64),
    Text(String),
    Choices(Vec<String>),
}

impl Answer {
    /// Blank text and empty selections count as "not answered".
    pub fn is_blank(&self) -> bool {
        match self {
            Answer::Number(n) => n.is_nan(),
            Answer::Text(s) => s.trim().is_empty(),
            Answer::Choices(c) => c.iter().all(|c| c.trim().is_empty()),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Number(n) => write!(f, "{n}"),
            Answer::Text(s) => f.write_str(s),
            Answer::Choices(c) => f.write_str(&c.join("; ")),
        }
    }
}

/// Answers keyed by question id.
pub type Answers = BTreeMap<String, Answer>;

/// Represents the 'responses' table in the database.
/// One respondent's complete set of answers to a survey.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SurveyResponse {
    pub id: i64,
    pub survey_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub answers: Json<Answers>,
}

/// DTO for submitting or validating answers.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    #[serde(default)]
    pub answers: Answers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_deserialize_by_shape() {
        let answers: Answers = serde_json::from_value(serde_json::json!({
            "q1": "Walk",
            "q2": 42,
            "q3": ["Media", "Family"]
        }))
        .unwrap();
        assert_eq!(answers["q1"], Answer::Text("Walk".into()));
        assert_eq!(answers["q2"], Answer::Number(42.0));
        assert_eq!(
            answers["q3"],
            Answer::Choices(vec!["Media".into(), "Family".into()])
        );
    }

    #[test]
    fn display_joins_choices() {
        let a = Answer::Choices(vec!["A".into(), "B".into()]);
        assert_eq!(a.to_string(), "A; B");
        assert_eq!(Answer::Number(3.0).to_string(), "3");
        assert_eq!(Answer::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn blank_answers() {
        assert!(Answer::Text("   ".into()).is_blank());
        assert!(Answer::Choices(vec![]).is_blank());
        assert!(!Answer::Number(0.0).is_blank());
    }
}
