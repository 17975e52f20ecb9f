// src/survey/builder.rs

use std::fmt;

use crate::models::{
    question::{CreateQuestionRequest, DEFAULT_RATING_SCALE, Question, QuestionType, UpdateQuestionRequest},
    survey::Survey,
};

const DEFAULT_CHOICE_OPTION: &str = "Option 1";

const LIKERT_SCALE: [&str; 5] = [
    "Strongly disagree",
    "Disagree",
    "Neutral",
    "Agree",
    "Strongly agree",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    QuestionNotFound(String),
    OptionNotFound { question: String, index: usize },
    InvalidOrder(String),
    NotChoice(String),
    LastOption(String),
    Unpublishable(Vec<String>),
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderError::QuestionNotFound(id) => write!(f, "Question '{id}' not found"),
            BuilderError::OptionNotFound { question, index } => {
                write!(f, "Question '{question}' has no option at index {index}")
            }
            BuilderError::InvalidOrder(msg) => write!(f, "Invalid question order: {msg}"),
            BuilderError::NotChoice(id) => write!(f, "Question '{id}' does not take options"),
            BuilderError::LastOption(id) => {
                write!(f, "Question '{id}' must keep at least one option")
            }
            BuilderError::Unpublishable(problems) => {
                write!(f, "Survey cannot be published: {}", problems.join("; "))
            }
        }
    }
}

impl std::error::Error for BuilderError {}

/// Mutable view over a survey's ordered question list and its id sequence.
///
/// Every operation edits the list in place; the caller re-saves the whole list.
pub struct Editor<'a> {
    questions: &'a mut Vec<Question>,
    next_seq: &'a mut i64,
}

impl<'a> Editor<'a> {
    pub fn new(questions: &'a mut Vec<Question>, next_seq: &'a mut i64) -> Self {
        Self { questions, next_seq }
    }

    pub fn of(survey: &'a mut Survey) -> Self {
        Self::new(&mut survey.questions.0, &mut survey.next_question_seq)
    }

    fn allocate_id(&mut self) -> String {
        // Skip ids already taken, e.g. by imported structures.
        loop {
            *self.next_seq += 1;
            let id = format!("q{}", self.next_seq);
            if !self.questions.iter().any(|q| q.id == id) {
                return id;
            }
        }
    }

    fn position(&self, id: &str) -> Result<usize, BuilderError> {
        self.questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| BuilderError::QuestionNotFound(id.to_string()))
    }

    fn question_mut(&mut self, id: &str) -> Result<&mut Question, BuilderError> {
        let idx = self.position(id)?;
        Ok(&mut self.questions[idx])
    }

    /// Appends a question and returns it.
    pub fn add_question(&mut self, req: CreateQuestionRequest) -> Question {
        let id = self.allocate_id();
        let mut question = Question {
            id,
            question_type: req.question_type,
            text: req.text,
            required: req.required,
            options: req.options,
            scale: req.scale,
        };
        normalize_for_type(&mut question);
        self.questions.push(question.clone());
        question
    }

    /// Applies the present fields of `patch`.
    pub fn update_question(
        &mut self,
        id: &str,
        patch: UpdateQuestionRequest,
    ) -> Result<Question, BuilderError> {
        let question = self.question_mut(id)?;
        if let Some(text) = patch.text {
            question.text = text;
        }
        if let Some(required) = patch.required {
            question.required = required;
        }
        if let Some(options) = patch.options {
            question.options = options;
        }
        if let Some(scale) = patch.scale {
            question.scale = Some(scale);
        }
        if let Some(question_type) = patch.question_type {
            question.question_type = question_type;
        }
        normalize_for_type(question);
        Ok(question.clone())
    }

    pub fn remove_question(&mut self, id: &str) -> Result<Question, BuilderError> {
        let idx = self.position(id)?;
        Ok(self.questions.remove(idx))
    }

    /// Inserts a copy right after the original, under a fresh id.
    pub fn duplicate_question(&mut self, id: &str) -> Result<Question, BuilderError> {
        let idx = self.position(id)?;
        let mut copy = self.questions[idx].clone();
        copy.id = self.allocate_id();
        self.questions.insert(idx + 1, copy.clone());
        Ok(copy)
    }

    /// Drag-reorder: moves the question to `to`, clamped to the end of the list.
    pub fn move_question(&mut self, id: &str, to: usize) -> Result<(), BuilderError> {
        let from = self.position(id)?;
        let question = self.questions.remove(from);
        let to = to.min(self.questions.len());
        self.questions.insert(to, question);
        Ok(())
    }

    /// Replaces the order with `ids`, which must be a permutation of the current ids.
    pub fn reorder(&mut self, ids: &[String]) -> Result<(), BuilderError> {
        if ids.len() != self.questions.len() {
            return Err(BuilderError::InvalidOrder(format!(
                "expected {} ids, got {}",
                self.questions.len(),
                ids.len()
            )));
        }
        let mut reordered = Vec::with_capacity(ids.len());
        for id in ids {
            if reordered.iter().any(|q: &Question| &q.id == id) {
                return Err(BuilderError::InvalidOrder(format!("'{id}' listed twice")));
            }
            let question = self
                .questions
                .iter()
                .find(|q| &q.id == id)
                .ok_or_else(|| BuilderError::InvalidOrder(format!("unknown question '{id}'")))?;
            reordered.push(question.clone());
        }
        *self.questions = reordered;
        Ok(())
    }

    fn choice_question_mut(&mut self, id: &str) -> Result<&mut Question, BuilderError> {
        let question = self.question_mut(id)?;
        if !question.question_type.is_choice() {
            return Err(BuilderError::NotChoice(id.to_string()));
        }
        Ok(question)
    }

    pub fn add_option(&mut self, id: &str, text: String) -> Result<Question, BuilderError> {
        let question = self.choice_question_mut(id)?;
        question.options.push(text);
        Ok(question.clone())
    }

    pub fn rename_option(
        &mut self,
        id: &str,
        index: usize,
        text: String,
    ) -> Result<Question, BuilderError> {
        let question = self.choice_question_mut(id)?;
        let slot = question
            .options
            .get_mut(index)
            .ok_or_else(|| BuilderError::OptionNotFound {
                question: id.to_string(),
                index,
            })?;
        *slot = text;
        Ok(question.clone())
    }

    pub fn remove_option(&mut self, id: &str, index: usize) -> Result<Question, BuilderError> {
        let question = self.choice_question_mut(id)?;
        if index >= question.options.len() {
            return Err(BuilderError::OptionNotFound {
                question: id.to_string(),
                index,
            });
        }
        if question.options.len() == 1 {
            return Err(BuilderError::LastOption(id.to_string()));
        }
        question.options.remove(index);
        Ok(question.clone())
    }

    pub fn move_option(
        &mut self,
        id: &str,
        from: usize,
        to: usize,
    ) -> Result<Question, BuilderError> {
        let question = self.choice_question_mut(id)?;
        if from >= question.options.len() {
            return Err(BuilderError::OptionNotFound {
                question: id.to_string(),
                index: from,
            });
        }
        let option = question.options.remove(from);
        let to = to.min(question.options.len());
        question.options.insert(to, option);
        Ok(question.clone())
    }
}

/// Keeps `options` and `scale` consistent with the question type.
fn normalize_for_type(question: &mut Question) {
    let question_type = question.question_type;
    if question_type.is_choice() {
        if question.options.is_empty() {
            question.options = match question_type {
                QuestionType::Likert => LIKERT_SCALE.iter().map(|s| s.to_string()).collect(),
                _ => vec![DEFAULT_CHOICE_OPTION.to_string()],
            };
        }
    } else {
        question.options.clear();
    }

    if question_type == QuestionType::Rating {
        question.scale.get_or_insert(DEFAULT_RATING_SCALE);
    } else {
        question.scale = None;
    }
}

/// Lists everything that prevents the survey from being distributed.
pub fn check_publishable(survey: &Survey) -> Result<(), BuilderError> {
    let mut problems = Vec::new();

    if survey.meta.title.trim().is_empty() {
        problems.push("the survey needs a title".to_string());
    }
    if survey.questions.is_empty() {
        problems.push("the survey has no questions".to_string());
    }
    for (n, q) in survey.questions.iter().enumerate() {
        if q.text.trim().is_empty() {
            problems.push(format!("question {} has no text", n + 1));
        }
        if q.question_type.is_choice() {
            if q.options.iter().any(|o| o.trim().is_empty()) {
                problems.push(format!("question {} has a blank option", n + 1));
            }
            let has_duplicates = q
                .options
                .iter()
                .enumerate()
                .any(|(i, o)| q.options[..i].contains(o));
            if has_duplicates {
                problems.push(format!("question {} repeats an option", n + 1));
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(BuilderError::Unpublishable(problems))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(question_type: QuestionType, text: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question_type,
            text: text.to_string(),
            required: false,
            options: vec![],
            scale: None,
        }
    }

    fn ids(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn ids_are_never_reused() {
        let mut questions = Vec::new();
        let mut seq = 0;
        let mut editor = Editor::new(&mut questions, &mut seq);
        editor.add_question(draft(QuestionType::ShortText, "a"));
        let second = editor.add_question(draft(QuestionType::ShortText, "b"));
        editor.remove_question(&second.id).unwrap();
        let third = editor.add_question(draft(QuestionType::ShortText, "c"));
        assert_eq!(third.id, "q3");
        assert_eq!(ids(&questions), vec!["q1", "q3"]);
    }

    #[test]
    fn choice_types_get_default_options() {
        let mut questions = Vec::new();
        let mut seq = 0;
        let mut editor = Editor::new(&mut questions, &mut seq);
        let radio = editor.add_question(draft(QuestionType::SingleChoice, "Pick"));
        let likert = editor.add_question(draft(QuestionType::Likert, "Agree?"));
        let rating = editor.add_question(draft(QuestionType::Rating, "Stars"));
        assert_eq!(radio.options, vec!["Option 1"]);
        assert_eq!(likert.options.len(), 5);
        assert_eq!(rating.scale, Some(DEFAULT_RATING_SCALE));
        assert!(rating.options.is_empty());
    }

    #[test]
    fn changing_type_clears_or_seeds_options() {
        let mut questions = Vec::new();
        let mut seq = 0;
        let mut editor = Editor::new(&mut questions, &mut seq);
        let q = editor.add_question(CreateQuestionRequest {
            options: vec!["Yes".into(), "No".into()],
            ..draft(QuestionType::SingleChoice, "Trust?")
        });

        let as_text = editor
            .update_question(
                &q.id,
                UpdateQuestionRequest {
                    question_type: Some(QuestionType::LongText),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(as_text.options.is_empty());

        let as_dropdown = editor
            .update_question(
                &q.id,
                UpdateQuestionRequest {
                    question_type: Some(QuestionType::Dropdown),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(as_dropdown.options, vec!["Option 1"]);
    }

    #[test]
    fn move_and_reorder() {
        let mut questions = Vec::new();
        let mut seq = 0;
        let mut editor = Editor::new(&mut questions, &mut seq);
        for t in ["a", "b", "c"] {
            editor.add_question(draft(QuestionType::ShortText, t));
        }
        editor.move_question("q1", 2).unwrap();
        editor.move_question("q3", 99).unwrap();
        editor
            .reorder(&["q3".to_string(), "q2".to_string(), "q1".to_string()])
            .unwrap();
        assert!(editor.reorder(&["q3".to_string(), "q3".to_string(), "q1".to_string()]).is_err());
        assert!(editor.reorder(&["q3".to_string()]).is_err());
        assert_eq!(ids(&questions), vec!["q3", "q2", "q1"]);
    }

    #[test]
    fn duplicate_lands_after_original() {
        let mut questions = Vec::new();
        let mut seq = 0;
        let mut editor = Editor::new(&mut questions, &mut seq);
        editor.add_question(draft(QuestionType::ShortText, "a"));
        editor.add_question(draft(QuestionType::ShortText, "b"));
        let copy = editor.duplicate_question("q1").unwrap();
        assert_eq!(copy.text, "a");
        assert_eq!(ids(&questions), vec!["q1", "q3", "q2"]);
    }

    #[test]
    fn option_editing() {
        let mut questions = Vec::new();
        let mut seq = 0;
        let mut editor = Editor::new(&mut questions, &mut seq);
        let q = editor.add_question(draft(QuestionType::MultiChoice, "Sources"));
        editor.rename_option(&q.id, 0, "Media".into()).unwrap();
        editor.add_option(&q.id, "Family".into()).unwrap();
        let moved = editor.move_option(&q.id, 1, 0).unwrap();
        assert_eq!(moved.options, vec!["Family", "Media"]);
        editor.remove_option(&q.id, 0).unwrap();
        assert_eq!(
            editor.remove_option(&q.id, 0),
            Err(BuilderError::LastOption(q.id.clone()))
        );
        assert!(matches!(
            editor.rename_option(&q.id, 5, "x".into()),
            Err(BuilderError::OptionNotFound { index: 5, .. })
        ));

        let text = editor.add_question(draft(QuestionType::ShortText, "Name"));
        assert_eq!(
            editor.add_option(&text.id, "x".into()),
            Err(BuilderError::NotChoice(text.id.clone()))
        );
    }
}
