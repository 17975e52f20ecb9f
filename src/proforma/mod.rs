//! The static field proforma: a fixed sectioned survey whose responses are
//! kept as one flat list in the key/value store.

use crate::{
    models::{
        proforma::{Notes, ProformaResponse, Section},
        question::Question,
        response::Answers,
    },
    survey::taker::Page,
};

pub mod log;
pub mod structure;

pub use log::ResponseLog;

/// One taker page per section, then the notes page.
pub fn pages() -> Vec<Page> {
    let mut pages: Vec<Page> = structure::sections()
        .into_iter()
        .map(|s| Page {
            id: s.id.to_string(),
            title: s.title.to_string(),
            questions: s.questions,
        })
        .collect();
    pages.push(Page {
        id: structure::NOTES_PAGE_ID.to_string(),
        title: "Survey Notes".to_string(),
        questions: structure::note_questions(),
    });
    pages
}

/// Every survey question (notes excluded), in display order.
pub fn questions(sections: &[Section]) -> impl Iterator<Item = (&Section, &Question)> {
    sections
        .iter()
        .flat_map(|s| s.questions.iter().map(move |q| (s, q)))
}

/// Splits taker answers into survey answers and interviewer notes.
pub fn into_response(mut answers: Answers, timestamp_ms: i64) -> ProformaResponse {
    let mut take_note = |id: &str| match answers.remove(id) {
        Some(answer) => answer.to_string(),
        None => String::new(),
    };
    let notes = Notes {
        language: take_note(structure::NOTE_LANGUAGE),
        tehsil: take_note(structure::NOTE_TEHSIL),
        observations: take_note(structure::NOTE_OBSERVATIONS),
    };

    ProformaResponse {
        participant_id: format!("P-{timestamp_ms}"),
        timestamp: timestamp_ms,
        answers,
        notes,
    }
}
