// src/utils/text.rs

/// Normalizes owner-authored survey text (titles, consent, questions, options).
///
/// Text is stored as typed: `<`, `>` and `&` stay literal so answers compare
/// against the same string the respondent sees. Templates escape on render.
/// Surrounding whitespace and control characters other than newlines and tabs
/// are removed.
pub fn tidy(input: &str) -> String {
    let kept: String = input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect();
    kept.trim().to_string()
}

/// Applies [`tidy`] to every entry.
pub fn tidy_all(inputs: &[String]) -> Vec<String> {
    inputs.iter().map(|s| tidy(s)).collect()
}
