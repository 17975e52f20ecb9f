// src/export/xlsx.rs

use rust_xlsxwriter::{Format, Workbook};

use super::{Cell, ExportError, ExportSheet};

pub const SHEET_NAME: &str = "Survey Responses";

/// Writes the sheet as a single-worksheet workbook with labelled headers.
pub fn write_sheet(sheet: &ExportSheet) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, column) in sheet.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, &column.label, &header_format)?;
    }

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Empty => {}
                Cell::Number(n) => {
                    worksheet.write_number(row_num, col as u16, *n)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col as u16, s)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
