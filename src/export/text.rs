// src/export/text.rs

use std::fmt::Write;

use super::{NOT_ANSWERED, ResponseDocument};

/// Plain-text summary of one response.
pub fn summary(doc: &ResponseDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", doc.title);
    let _ = writeln!(out, "{}", "=".repeat(doc.title.chars().count()));
    out.push('\n');

    for (label, value) in &doc.header {
        let _ = writeln!(out, "{label}: {value}");
    }
    out.push('\n');

    for section in &doc.sections {
        let _ = writeln!(out, "--- {} ---", section.title);
        for (question, answer) in &section.rows {
            let answer = answer.as_deref().unwrap_or(NOT_ANSWERED);
            let _ = writeln!(out, "{question}: {answer}");
        }
        out.push('\n');
    }
    out
}
