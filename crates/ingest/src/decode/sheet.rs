//! Spreadsheet decoding via calamine: first worksheet only, from in-memory
//! bytes. Serial-date cells become canonical date strings, text cells get
//! their whitespace normalized, and right-to-left spans are recorded as
//! advisory coordinates without altering content.

use std::io::Cursor;

use calamine::{Data, Reader};
use colligo_core::dates::{is_serial_date, serial_to_canonical};
use colligo_core::{Cell, RawTable};

use crate::error::IngestError;

pub fn decode(bytes: &[u8]) -> Result<RawTable, IngestError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::Parse {
            kind: "spreadsheet",
            message: e.to_string(),
        })?;

    let sheet_names = workbook.sheet_names();
    let Some(first) = sheet_names.first().cloned() else {
        return Err(IngestError::Validation { rows: 0 });
    };
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| IngestError::Parse {
            kind: "spreadsheet",
            message: e.to_string(),
        })?;

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut rtl_cells: Vec<(usize, usize)> = Vec::new();
    for (row_index, row) in range.rows().enumerate() {
        let mut cells = Vec::with_capacity(row.len());
        for (col_index, data) in row.iter().enumerate() {
            cells.push(convert_cell(data, row_index, col_index, &mut rtl_cells));
        }
        rows.push(cells);
    }

    Ok(RawTable::with_rtl_cells(rows, rtl_cells))
}

fn convert_cell(
    data: &Data,
    row: usize,
    col: usize,
    rtl_cells: &mut Vec<(usize, usize)>,
) -> Cell {
    match data {
        Data::Empty => Cell::empty(),
        Data::String(s) => {
            let text = normalize_whitespace(s);
            if contains_rtl(&text) {
                rtl_cells.push((row, col));
            }
            Cell::Text(text)
        }
        Data::Float(f) => {
            if is_serial_date(*f) {
                Cell::Text(serial_to_canonical(*f))
            } else {
                Cell::Number(*f)
            }
        }
        Data::Int(i) => {
            let f = *i as f64;
            if is_serial_date(f) {
                Cell::Text(serial_to_canonical(f))
            } else {
                Cell::Number(f)
            }
        }
        Data::DateTime(dt) => Cell::Text(serial_to_canonical(dt.as_f64())),
        Data::DateTimeIso(s) => Cell::Text(s.chars().take(10).collect()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Error(e) => Cell::Text(format!("{e:?}")),
    }
}

/// Collapse interior whitespace runs to single spaces and trim the ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the text contains characters from a right-to-left script
/// (Hebrew, Arabic and their presentation-form blocks).
fn contains_rtl(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{0590}'..='\u{08FF}'
            | '\u{FB1D}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}')
    })
}
