// src/export/csv.rs

use super::{Cell, ExportSheet};

/// Writes the sheet as CSV with a header of column keys.
///
/// Commas inside text are replaced by semicolons and text cells are quoted,
/// so every row splits on `,` into exactly one field per column.
pub fn write_sheet(sheet: &ExportSheet) -> String {
    let header = sheet
        .columns
        .iter()
        .map(|c| c.key.replace(',', ";"))
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(sheet.rows.len() + 1);
    lines.push(header);
    lines.extend(sheet.rows.iter().map(|row| {
        row.iter().map(write_cell).collect::<Vec<_>>().join(",")
    }));
    lines.join("\n")
}

fn write_cell(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Number(n) => n.to_string(),
        Cell::Text(s) => format!("\"{}\"", s.replace(',', ";").replace('"', "\"\"")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;

    /// Splits one exported line back into cells.
    fn parse_line(line: &str) -> Vec<String> {
        line.split(',')
            .map(|field| {
                let field = field
                    .strip_prefix('"')
                    .and_then(|f| f.strip_suffix('"'))
                    .unwrap_or(field);
                field.replace("\"\"", "\"")
            })
            .collect()
    }

    #[test]
    fn commas_become_semicolons_inside_quotes() {
        let csv = write_sheet(&ExportSheet::for_survey(
            &fixtures::survey(),
            &fixtures::responses(),
        ));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "response_id,submitted_at,q1,q2,q3");
        assert!(lines[1].contains("\"Gishkaur; upper\""));
        assert!(lines[1].contains(",4.5,"));
        assert!(lines[2].ends_with(",12,"));
    }

    #[test]
    fn exported_pairs_match_the_model() {
        let survey = fixtures::survey();
        let responses = fixtures::responses();
        let csv = write_sheet(&ExportSheet::for_survey(&survey, &responses));
        let mut lines = csv.lines();
        let header = parse_line(lines.next().unwrap());

        for (line, response) in lines.zip(&responses) {
            let cells = parse_line(line);
            assert_eq!(cells.len(), header.len());
            for q in survey.questions.iter() {
                let col = header.iter().position(|h| h == &q.id).unwrap();
                let expected = response
                    .answers
                    .get(&q.id)
                    .map(|a| a.to_string().replace(',', ";"))
                    .unwrap_or_default();
                assert_eq!(cells[col], expected, "question {}", q.id);
            }
        }
    }

    #[test]
    fn quotes_are_doubled() {
        let sheet = ExportSheet {
            columns: vec![],
            rows: vec![vec![Cell::Text("say \"hi\"".into())]],
        };
        assert_eq!(write_sheet(&sheet).lines().nth(1), Some("\"say \"\"hi\"\"\""));
    }
}
