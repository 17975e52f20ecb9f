// src/models/survey.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use super::question::Question;

/// Descriptive fields shown to respondents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SurveyMeta {
    pub title: String,
    pub organization: String,
    pub researcher: String,
    /// Consent text displayed before the first question.
    pub consent: String,
}

/// Collection limits. Both are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SurveySettings {
    pub closing_date: Option<DateTime<Utc>>,
    pub response_limit: Option<i64>,
}

impl SurveySettings {
    /// Returns the reason submissions are refused, if any.
    pub fn closed_reason(&self, now: DateTime<Utc>, response_count: i64) -> Option<&'static str> {
        if let Some(closing) = self.closing_date {
            if now >= closing {
                return Some("This survey is closed");
            }
        }
        if let Some(limit) = self.response_limit {
            if response_count >= limit {
                return Some("This survey has reached its response limit");
            }
        }
        None
    }
}

/// Represents the 'surveys' table in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Survey {
    pub id: i64,

    pub owner_id: i64,

    #[sqlx(flatten)]
    pub meta: SurveyMeta,

    /// Ordered survey structure.
    /// Stored as a JSON array and re-saved wholesale on every edit.
    pub questions: Json<Vec<Question>>,

    #[sqlx(flatten)]
    pub settings: SurveySettings,

    pub published: bool,

    /// Source of the next question id. Never decreases, so ids are never reused.
    #[serde(skip)]
    pub next_question_seq: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for sending a survey to respondents (no owner data, no settings internals).
#[derive(Debug, Serialize)]
pub struct PublicSurvey {
    pub id: i64,
    #[serde(flatten)]
    pub meta: SurveyMeta,
    pub questions: Vec<Question>,
    pub closing_date: Option<DateTime<Utc>>,
    pub page_count: usize,
}

impl From<Survey> for PublicSurvey {
    fn from(survey: Survey) -> Self {
        let questions = survey.questions.0;
        PublicSurvey {
            id: survey.id,
            meta: survey.meta,
            page_count: questions.len(),
            questions,
            closing_date: survey.settings.closing_date,
        }
    }
}

/// DTO for creating a new survey.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSurveyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub organization: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub researcher: String,
    #[validate(length(max = 20000))]
    #[serde(default)]
    pub consent: String,
    pub closing_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub response_limit: Option<i64>,
}

/// DTO for updating survey metadata and settings. Fields are optional.
///
/// `closing_date` and `response_limit` use a nested option so a client can
/// clear them with an explicit `null`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSurveyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 200))]
    pub organization: Option<String>,
    #[validate(length(max = 200))]
    pub researcher: Option<String>,
    #[validate(length(max = 20000))]
    pub consent: Option<String>,
    #[serde(default, with = "double_option")]
    pub closing_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "double_option")]
    pub response_limit: Option<Option<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub published: bool,
}

/// Aggregate shown on the dashboard.
#[derive(Debug, Serialize)]
pub struct SurveySummary {
    pub total: i64,
    pub last_submitted_at: Option<DateTime<Utc>>,
}

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`).
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn closed_after_closing_date() {
        let now = Utc::now();
        let settings = SurveySettings {
            closing_date: Some(now - Duration::minutes(1)),
            response_limit: None,
        };
        assert!(settings.closed_reason(now, 0).is_some());

        let open = SurveySettings {
            closing_date: Some(now + Duration::days(1)),
            response_limit: None,
        };
        assert!(open.closed_reason(now, 0).is_none());
    }

    #[test]
    fn closed_when_limit_reached() {
        let settings = SurveySettings {
            closing_date: None,
            response_limit: Some(2),
        };
        assert!(settings.closed_reason(Utc::now(), 1).is_none());
        assert!(settings.closed_reason(Utc::now(), 2).is_some());
    }

    #[test]
    fn update_request_distinguishes_null_from_missing() {
        let req: UpdateSurveyRequest =
            serde_json::from_value(serde_json::json!({ "response_limit": null })).unwrap();
        assert_eq!(req.response_limit, Some(None));
        assert!(req.closing_date.is_none());
    }
}
