//! HTML views: pure functions from taker/listing state to markup.
//!
//! Templates are compiled into the binary and autoescaped.

use serde::Serialize;
use tera::{Context, Tera};

use crate::{
    export::ResponseDocument,
    models::{
        question::{Question, QuestionType},
        response::Answer,
    },
    survey::taker::TakerSession,
};

const TEMPLATES: [(&str, &str); 7] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("take.html", include_str!("../../templates/take.html")),
    ("thanks.html", include_str!("../../templates/thanks.html")),
    ("closed.html", include_str!("../../templates/closed.html")),
    ("responses.html", include_str!("../../templates/responses.html")),
    ("response_detail.html", include_str!("../../templates/response_detail.html")),
    ("home.html", include_str!("../../templates/home.html")),
];

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    fn render<T: Serialize>(&self, template: &str, view: &T) -> Result<String, tera::Error> {
        let ctx = Context::from_serialize(view)?;
        self.tera.render(template, &ctx)
    }

    pub fn take(&self, view: &TakeView) -> Result<String, tera::Error> {
        self.render("take.html", view)
    }

    pub fn thanks(&self, view: &MessageView) -> Result<String, tera::Error> {
        self.render("thanks.html", view)
    }

    pub fn closed(&self, view: &MessageView) -> Result<String, tera::Error> {
        self.render("closed.html", view)
    }

    pub fn responses(&self, view: &ResponsesView) -> Result<String, tera::Error> {
        self.render("responses.html", view)
    }

    pub fn response_detail(&self, view: &DetailView) -> Result<String, tera::Error> {
        self.render("response_detail.html", view)
    }

    pub fn home(&self, view: &HomeView) -> Result<String, tera::Error> {
        self.render("home.html", view)
    }
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub value: String,
    pub checked: bool,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub id: String,
    pub text: String,
    pub required: bool,
    /// One of: text, textarea, number, date, radio, checkbox, select.
    pub widget: &'static str,
    pub value: String,
    pub options: Vec<OptionView>,
    pub error: Option<String>,
}

fn widget_for(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::ShortText => "text",
        QuestionType::LongText => "textarea",
        QuestionType::Number => "number",
        QuestionType::Date => "date",
        QuestionType::SingleChoice | QuestionType::Likert | QuestionType::Rating => "radio",
        QuestionType::MultiChoice => "checkbox",
        QuestionType::Dropdown => "select",
    }
}

fn field_view(question: &Question, answer: Option<&Answer>, error: Option<&String>) -> FieldView {
    let picked: Vec<String> = match answer {
        Some(Answer::Choices(c)) => c.clone(),
        Some(a) => vec![a.to_string()],
        None => vec![],
    };

    let choices: Vec<String> = if question.question_type == QuestionType::Rating {
        (1..=question.rating_scale()).map(|n| n.to_string()).collect()
    } else {
        question.options.clone()
    };

    FieldView {
        id: question.id.clone(),
        text: question.text.clone(),
        required: question.required,
        widget: widget_for(question.question_type),
        value: match answer {
            Some(Answer::Choices(_)) | None => String::new(),
            Some(a) => a.to_string(),
        },
        options: choices
            .into_iter()
            .map(|value| OptionView {
                checked: picked.contains(&value),
                value,
            })
            .collect(),
        error: error.cloned(),
    }
}

/// State of one taker screen.
#[derive(Debug, Serialize)]
pub struct TakeView {
    pub survey_title: String,
    /// Shown above the first page only.
    pub intro: Option<String>,
    pub action: String,
    pub page_index: usize,
    pub page_number: usize,
    pub page_count: usize,
    pub page_title: String,
    pub progress: u32,
    pub is_first: bool,
    pub is_last: bool,
    pub fields: Vec<FieldView>,
    /// Answers from other pages, re-posted as hidden inputs.
    pub carried: Vec<(String, String)>,
    pub has_errors: bool,
}

impl TakeView {
    pub fn from_session(
        session: &TakerSession,
        survey_title: &str,
        intro: Option<&str>,
        action: &str,
    ) -> Self {
        let answers = session.answers();
        let errors = session.errors();
        let page = session.current();

        let on_page = |id: &str| page.is_some_and(|p| p.questions.iter().any(|q| q.id == id));

        let carried = answers
            .iter()
            .filter(|(id, _)| !on_page(id))
            .flat_map(|(id, answer)| match answer {
                Answer::Choices(c) => c.iter().map(|v| (id.clone(), v.clone())).collect::<Vec<_>>(),
                other => vec![(id.clone(), other.to_string())],
            })
            .collect();

        Self {
            survey_title: survey_title.to_string(),
            intro: intro
                .filter(|s| !s.trim().is_empty() && session.is_first())
                .map(str::to_string),
            action: action.to_string(),
            page_index: session.index(),
            page_number: session.index() + 1,
            page_count: session.pages().len(),
            page_title: page.map(|p| p.title.clone()).unwrap_or_default(),
            progress: session.progress_percent(),
            is_first: session.is_first(),
            is_last: session.is_last(),
            fields: page
                .map(|p| {
                    p.questions
                        .iter()
                        .map(|q| field_view(q, answers.get(&q.id), errors.get(&q.id)))
                        .collect()
                })
                .unwrap_or_default(),
            carried,
            has_errors: !errors.is_empty(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResponseRow {
    pub label: String,
    pub collected_at: String,
    pub subtitle: Option<String>,
    pub detail_url: String,
}

#[derive(Debug, Serialize)]
pub struct ResponsesView {
    pub title: String,
    pub count: usize,
    /// Newest first.
    pub rows: Vec<ResponseRow>,
    pub export_links: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
pub struct DetailSection {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
pub struct DetailView {
    pub title: String,
    pub header: Vec<(String, String)>,
    pub sections: Vec<DetailSection>,
    pub back_url: String,
    pub export_links: Vec<(String, String)>,
}

impl DetailView {
    pub fn from_document(
        doc: ResponseDocument,
        back_url: String,
        export_links: Vec<(String, String)>,
    ) -> Self {
        Self {
            title: "Response Details".to_string(),
            header: doc.header,
            sections: doc
                .sections
                .into_iter()
                .map(|s| DetailSection {
                    title: s.title,
                    rows: s
                        .rows
                        .into_iter()
                        .map(|(q, a)| (q, a.unwrap_or_else(|| "Not answered".to_string())))
                        .collect(),
                })
                .collect(),
            back_url,
            export_links,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub title: String,
    pub total_responses: usize,
    /// `N/A` when nothing was collected yet.
    pub last_collection: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::response::Answers,
        survey::taker::{Page, TakerSession},
    };

    fn question(id: &str, question_type: QuestionType) -> Question {
        Question {
            id: id.into(),
            question_type,
            text: format!("<b>{id}</b>"),
            required: true,
            options: vec!["Yes".into(), "No".into()],
            scale: None,
        }
    }

    fn session() -> TakerSession {
        let pages = vec![
            Page {
                id: "a".into(),
                title: "First".into(),
                questions: vec![question("trust", QuestionType::SingleChoice)],
            },
            Page {
                id: "b".into(),
                title: "Second".into(),
                questions: vec![question("sources", QuestionType::MultiChoice)],
            },
        ];
        TakerSession::new(pages)
    }

    #[test]
    fn first_page_shows_errors_and_hides_prev() {
        let renderer = Renderer::new().unwrap();
        let mut session = session();
        assert!(!session.next());

        let view = TakeView::from_session(&session, "Access", Some("We ask a few things."), "/take/1");
        assert!(view.is_first);
        assert!(view.has_errors);
        let html = renderer.take(&view).unwrap();
        assert!(html.contains("This field is required."));
        assert!(html.contains("We ask a few things."));
        assert!(html.contains("Section 1 of 2"));
        assert!(html.contains("value=\"next\""));
        // user-authored text is escaped
        assert!(html.contains("&lt;b&gt;trust&lt;&#x2F;b&gt;"));
    }

    #[test]
    fn answers_from_other_pages_are_carried() {
        let mut answers = Answers::new();
        answers.insert("trust".into(), Answer::Text("Yes".into()));
        answers.insert(
            "sources".into(),
            Answer::Choices(vec!["Yes".into(), "No".into()]),
        );
        let session = TakerSession::resume(session().pages().to_vec(), 1, answers);

        let view = TakeView::from_session(&session, "Access", None, "/take/1");
        assert!(view.is_last);
        assert_eq!(view.carried, vec![("trust".to_string(), "Yes".to_string())]);
        assert!(view.fields[0].options.iter().all(|o| o.checked));

        let html = Renderer::new().unwrap().take(&view).unwrap();
        assert!(html.contains("type=\"hidden\" name=\"trust\" value=\"Yes\""));
        assert!(html.contains("value=\"submit\""));
    }

    #[test]
    fn rating_offers_scale_points() {
        let mut q = question("stars", QuestionType::Rating);
        q.scale = Some(3);
        let view = field_view(&q, Some(&Answer::Number(2.0)), None);
        let values: Vec<&str> = view.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["1", "2", "3"]);
        assert!(view.options[1].checked);
    }

    #[test]
    fn empty_response_list_shows_empty_state() {
        let html = Renderer::new()
            .unwrap()
            .responses(&ResponsesView {
                title: "Collected Responses".into(),
                count: 0,
                rows: vec![],
                export_links: vec![],
            })
            .unwrap();
        assert!(html.contains("0 response(s) found."));
        assert!(html.contains("No responses yet"));
    }
}
