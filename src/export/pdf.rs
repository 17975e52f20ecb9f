// src/export/pdf.rs

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use super::{ExportError, NOT_ANSWERED, ResponseDocument};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 14.0;
const LINE_HEIGHT: f32 = 6.0;
/// Characters per line at body size; longer text is wrapped.
const WRAP_WIDTH: usize = 90;

fn pdf_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(e.to_string())
}

/// Writes text top to bottom, starting a new page when the current one fills.
struct Cursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl Cursor {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
    }

    fn line(&mut self, text: &str, size: f32, bold: bool, indent: f32) {
        self.ensure_room(LINE_HEIGHT);
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size, Mm(MARGIN + indent), Mm(self.y), font);
        self.y -= LINE_HEIGHT * (size / 11.0).max(1.0);
    }

    fn wrapped(&mut self, text: &str, size: f32, bold: bool, indent: f32) {
        for line in wrap(text, WRAP_WIDTH) {
            self.line(&line, size, bold, indent);
        }
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        self.doc.save_to_bytes().map_err(pdf_err)
    }
}

fn write_document(cursor: &mut Cursor, doc: &ResponseDocument) {
    cursor.line(&doc.title, 18.0, true, 0.0);
    cursor.gap();
    for (label, value) in &doc.header {
        cursor.wrapped(&format!("{label}: {value}"), 11.0, false, 0.0);
    }

    for section in &doc.sections {
        cursor.gap();
        // keep a heading together with its first row
        cursor.ensure_room(LINE_HEIGHT * 3.0);
        cursor.line(&section.title, 14.0, true, 0.0);
        for (question, answer) in &section.rows {
            cursor.wrapped(question, 11.0, true, 0.0);
            cursor.wrapped(answer.as_deref().unwrap_or(NOT_ANSWERED), 11.0, false, 6.0);
        }
    }
}

/// Question/answer dump of one response.
pub fn write_document_pdf(doc: &ResponseDocument) -> Result<Vec<u8>, ExportError> {
    let mut cursor = Cursor::new(&doc.title)?;
    write_document(&mut cursor, doc);
    cursor.finish()
}

/// Every response of a survey, one after another, each starting on a new page.
pub fn write_documents_pdf(title: &str, docs: &[ResponseDocument]) -> Result<Vec<u8>, ExportError> {
    let mut cursor = Cursor::new(title)?;
    if docs.is_empty() {
        cursor.line(title, 18.0, true, 0.0);
        cursor.line("No responses collected yet.", 11.0, false, 0.0);
    }
    for (i, doc) in docs.iter().enumerate() {
        if i > 0 {
            cursor.new_page();
        }
        write_document(&mut cursor, doc);
    }
    cursor.finish()
}

/// Greedy word wrap on character count.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;

    #[test]
    fn wrap_breaks_on_words() {
        assert_eq!(wrap("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
        assert_eq!(wrap("one\ntwo", 10), vec!["one", "two"]);
    }

    #[test]
    fn writes_a_pdf() {
        let survey = fixtures::survey();
        let docs: Vec<ResponseDocument> = fixtures::responses()
            .iter()
            .map(|r| ResponseDocument::for_survey_response(&survey, r))
            .collect();

        let single = write_document_pdf(&docs[0]).unwrap();
        assert!(single.starts_with(b"%PDF"));

        let all = write_documents_pdf("Clinic access", &docs).unwrap();
        assert!(all.starts_with(b"%PDF"));
    }
}
