// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Kinds of question a survey can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[serde(alias = "text")]
    ShortText,
    LongText,
    Number,
    Date,
    #[serde(alias = "radio")]
    SingleChoice,
    #[serde(alias = "checkbox")]
    MultiChoice,
    Dropdown,
    Likert,
    Rating,
}

impl QuestionType {
    /// Whether answers are picked from `options`.
    pub fn is_choice(self) -> bool {
        matches!(
            self,
            QuestionType::SingleChoice
                | QuestionType::MultiChoice
                | QuestionType::Dropdown
                | QuestionType::Likert
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::ShortText => "short_text",
            QuestionType::LongText => "long_text",
            QuestionType::Number => "number",
            QuestionType::Date => "date",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultiChoice => "multi_choice",
            QuestionType::Dropdown => "dropdown",
            QuestionType::Likert => "likert",
            QuestionType::Rating => "rating",
        }
    }
}

pub const DEFAULT_RATING_SCALE: u8 = 5;

/// A single question inside a survey structure.
/// Questions are stored inline on the survey row as a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, unique within its survey. Answers are keyed by it.
    pub id: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub text: String,

    #[serde(default)]
    pub required: bool,

    /// Only meaningful for choice types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Upper bound of a rating question (1..=scale).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,
}

impl Question {
    pub fn rating_scale(&self) -> u8 {
        self.scale.unwrap_or(DEFAULT_RATING_SCALE)
    }
}

/// DTO for adding a question to a survey.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub required: bool,
    #[validate(custom(function = validate_options))]
    #[serde(default)]
    pub options: Vec<String>,
    #[validate(range(min = 2, max = 10))]
    pub scale: Option<u8>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    #[validate(length(max = 1000))]
    pub text: Option<String>,
    pub required: Option<bool>,
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<String>>,
    #[validate(range(min = 2, max = 10))]
    pub scale: Option<u8>,
}

/// DTO for moving a question or option to a new position.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub to: usize,
}

/// DTO for replacing the whole question order.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OptionRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() > 100 {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
