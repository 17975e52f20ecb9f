// src/survey/validate.rs

use chrono::NaiveDate;

use super::{FieldErrors, REQUIRED_MESSAGE};
use crate::models::{
    question::{Question, QuestionType},
    response::{Answer, Answers},
};

const SHORT_TEXT_MAX: usize = 500;
const LONG_TEXT_MAX: usize = 10_000;

/// Checks one answer against its question definition.
///
/// A missing or blank answer is only an error when the question is required.
pub fn validate_answer(question: &Question, answer: Option<&Answer>) -> Result<(), String> {
    let answer = match answer {
        Some(a) if !a.is_blank() => a,
        _ if question.required => return Err(REQUIRED_MESSAGE.to_string()),
        _ => return Ok(()),
    };

    match question.question_type {
        QuestionType::ShortText => check_text(answer, SHORT_TEXT_MAX),
        QuestionType::LongText => check_text(answer, LONG_TEXT_MAX),
        QuestionType::Number => numeric_value(answer)
            .map(|_| ())
            .ok_or_else(|| "Please enter a number.".to_string()),
        QuestionType::Date => match answer {
            Answer::Text(s) if NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok() => Ok(()),
            _ => Err("Please enter a date as YYYY-MM-DD.".to_string()),
        },
        QuestionType::SingleChoice | QuestionType::Dropdown | QuestionType::Likert => {
            match answer {
                Answer::Text(s) if question.options.iter().any(|o| o == s) => Ok(()),
                _ => Err("Please choose one of the listed options.".to_string()),
            }
        }
        QuestionType::MultiChoice => {
            let picked: Vec<&String> = match answer {
                Answer::Choices(c) => c.iter().collect(),
                Answer::Text(s) => vec![s],
                Answer::Number(_) => {
                    return Err("Please choose from the listed options.".to_string());
                }
            };
            for (i, p) in picked.iter().enumerate() {
                if !question.options.contains(p) {
                    return Err(format!("'{p}' is not one of the listed options."));
                }
                if picked[..i].contains(p) {
                    return Err(format!("'{p}' was selected more than once."));
                }
            }
            Ok(())
        }
        QuestionType::Rating => {
            let scale = question.rating_scale();
            match numeric_value(answer) {
                Some(n) if n.fract() == 0.0 && n >= 1.0 && n <= f64::from(scale) => Ok(()),
                _ => Err(format!("Please pick a rating from 1 to {scale}.")),
            }
        }
    }
}

/// Validates every question in `questions`, collecting one message per failing id.
pub fn validate_page(questions: &[Question], answers: &Answers) -> Result<(), FieldErrors> {
    let errors: FieldErrors = questions
        .iter()
        .filter_map(|q| {
            validate_answer(q, answers.get(&q.id))
                .err()
                .map(|msg| (q.id.clone(), msg))
        })
        .collect();

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Keeps only non-blank answers whose key is a question in the current structure.
/// Numeric strings for number and rating questions are stored as numbers.
pub fn retain_known(questions: &[Question], answers: Answers) -> Answers {
    answers
        .into_iter()
        .filter(|(_, a)| !a.is_blank())
        .filter_map(|(id, answer)| {
            let question = questions.iter().find(|q| q.id == id)?;
            let answer = match question.question_type {
                QuestionType::Number | QuestionType::Rating => numeric_value(&answer)
                    .map(Answer::Number)
                    .unwrap_or(answer),
                _ => answer,
            };
            Some((id, answer))
        })
        .collect()
}

fn check_text(answer: &Answer, max: usize) -> Result<(), String> {
    match answer {
        Answer::Text(s) if s.chars().count() > max => {
            Err(format!("Please keep this answer under {max} characters."))
        }
        Answer::Text(_) | Answer::Number(_) => Ok(()),
        Answer::Choices(_) => Err("Please enter text.".to_string()),
    }
}

fn numeric_value(answer: &Answer) -> Option<f64> {
    match answer {
        Answer::Number(n) if n.is_finite() => Some(*n),
        Answer::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
