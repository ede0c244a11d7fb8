//! Delimited-text decoding with a bespoke quote-aware splitter.
//!
//! The field contract honors two quote conventions at once — a doubled quote
//! inside quotes is a literal quote, and a backslash-escaped quote is a
//! literal quote — plus per-field trimming and trailing-empty-field dropping.

use colligo_core::{Cell, RawTable};

use crate::error::IngestError;

const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '\t', '|'];

/// Split one line into trimmed fields. A quote toggles quoted mode; inside
/// quotes the delimiter is literal. Trailing all-empty fields are dropped, so
/// `" a , b , "` yields `["a", "b"]`.
pub fn parse_row(line: &str, delimiter: char) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
            }
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            c => field.push(c),
        }
    }
    fields.push(field);

    let mut fields: Vec<String> = fields.into_iter().map(|f| f.trim().to_string()).collect();
    while fields.last().is_some_and(String::is_empty) {
        fields.pop();
    }
    fields
}

/// Pick the candidate delimiter occurring most often in the line; comma wins
/// ties by candidate order.
pub fn sniff_delimiter(line: &str) -> char {
    let mut best = ',';
    let mut best_count = 0usize;
    for candidate in DELIMITER_CANDIDATES {
        let count = line.matches(candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Decode full delimited-text content. Empty lines produce no row.
pub fn decode(text: &str) -> Result<RawTable, IngestError> {
    let delimiter = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(sniff_delimiter)
        .unwrap_or(',');

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = parse_row(line, delimiter);
        if fields.is_empty() {
            continue;
        }
        rows.push(fields.into_iter().map(Cell::Text).collect());
    }

    Ok(RawTable::new(rows))
}
