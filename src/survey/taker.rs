// src/survey/taker.rs

use super::{FieldErrors, validate::validate_page};
use crate::models::{
    question::{Question, QuestionType},
    response::{Answer, Answers},
};

/// One screen of the taker.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
}

/// One question per page, titled "Question n".
pub fn single_question_pages(questions: &[Question]) -> Vec<Page> {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| Page {
            id: q.id.clone(),
            title: format!("Question {}", i + 1),
            questions: vec![q.clone()],
        })
        .collect()
}

/// Navigation state of one respondent: a linear index into `pages`.
#[derive(Debug, Clone)]
pub struct TakerSession {
    pages: Vec<Page>,
    index: usize,
    answers: Answers,
    errors: FieldErrors,
}

impl TakerSession {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            index: 0,
            answers: Answers::new(),
            errors: FieldErrors::new(),
        }
    }

    /// Restores a session at `index` (clamped) with previously collected answers.
    pub fn resume(pages: Vec<Page>, index: usize, answers: Answers) -> Self {
        let last = pages.len().saturating_sub(1);
        Self {
            pages,
            index: index.min(last),
            answers,
            errors: FieldErrors::new(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Page> {
        self.pages.get(self.index)
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.pages.len()
    }

    pub fn progress_percent(&self) -> u32 {
        if self.pages.is_empty() {
            return 100;
        }
        (self.index * 100 / self.pages.len()) as u32
    }

    /// Stores an answer; a blank answer clears it. Clears the error for that id.
    pub fn set_answer(&mut self, id: &str, answer: Answer) {
        if answer.is_blank() {
            self.answers.remove(id);
        } else {
            self.answers.insert(id.to_string(), answer);
        }
        self.errors.remove(id);
    }

    fn validate_current(&mut self) -> bool {
        let result = match self.current() {
            Some(page) => validate_page(&page.questions, &self.answers),
            None => Ok(()),
        };
        match result {
            Ok(()) => {
                self.errors.clear();
                true
            }
            Err(errors) => {
                self.errors = errors;
                false
            }
        }
    }

    /// Advances when the current page validates. Returns whether the index moved.
    pub fn next(&mut self) -> bool {
        if !self.validate_current() {
            return false;
        }
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Steps back without validating.
    pub fn prev(&mut self) {
        self.errors.clear();
        self.index = self.index.saturating_sub(1);
    }

    /// Validates every page. On failure the session jumps to the first failing page.
    pub fn finish(&mut self) -> Result<Answers, FieldErrors> {
        for (i, page) in self.pages.iter().enumerate() {
            if let Err(errors) = validate_page(&page.questions, &self.answers) {
                self.index = i;
                self.errors = errors.clone();
                return Err(errors);
            }
        }
        self.errors.clear();
        Ok(self.answers.clone())
    }
}

/// Builds answers from submitted form pairs.
///
/// Repeated keys collect into a list for multi-choice questions; number and
/// rating values are parsed when possible and otherwise kept as text so
/// validation can report them. Keys that are not question ids are ignored.
pub fn answers_from_form<'q, I>(questions: I, pairs: &[(String, String)]) -> Answers
where
    I: IntoIterator<Item = &'q Question>,
{
    let mut answers = Answers::new();
    for question in questions {
        let values: Vec<&str> = pairs
            .iter()
            .filter(|(k, v)| k == &question.id && !v.trim().is_empty())
            .map(|(_, v)| v.as_str())
            .collect();
        if values.is_empty() {
            continue;
        }

        let answer = match question.question_type {
            QuestionType::MultiChoice => {
                Answer::Choices(values.iter().map(|v| v.to_string()).collect())
            }
            QuestionType::Number | QuestionType::Rating => match values[0].trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Answer::Number(n),
                _ => Answer::Text(values[0].to_string()),
            },
            _ => Answer::Text(values[0].to_string()),
        };
        answers.insert(question.id.clone(), answer);
    }
    answers
}
