//! Row-to-transaction conversion for a confirmed import.

use std::collections::HashSet;

use colligo_core::dates::{is_serial_date, parse_ambiguous, serial_to_canonical};
use colligo_core::{Cell, FieldTag, HeaderMapping, RawTable, Transaction};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Materialize every data row at or after `data_row_index`. Entirely empty
/// rows are skipped, never emitted as blank transactions. Each transaction
/// gets a deterministic id unique within this batch and carries its file name
/// and 1-based source row for traceability.
pub fn materialize(
    table: &RawTable,
    mapping: &HeaderMapping,
    data_row_index: usize,
    file_name: &str,
) -> Vec<Transaction> {
    let stem = id_stem(file_name);
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut transactions = Vec::new();

    for (index, row) in table.rows().iter().enumerate().skip(data_row_index) {
        if row.iter().all(Cell::is_empty) {
            continue;
        }

        let mut date = String::new();
        let mut description_parts: Vec<String> = Vec::new();
        let mut income = None;
        let mut expenses = None;

        for (column, tag) in mapping.tags().iter().enumerate() {
            let Some(cell) = row.get(column) else {
                continue;
            };
            match tag {
                FieldTag::Ignore => {}
                FieldTag::Date => date = normalize_date_cell(cell),
                FieldTag::Income => income = parse_money(cell),
                FieldTag::Expenses => expenses = parse_money(cell),
                FieldTag::Description => {
                    if !cell.is_empty() {
                        description_parts.push(cell.as_text());
                    }
                }
            }
        }

        let source_row = index + 1;
        transactions.push(Transaction {
            id: mint_id(&stem, source_row, &mut seen_ids),
            date,
            description: description_parts.join(" "),
            category: String::new(),
            income,
            expenses,
            currency: String::new(),
            file_name: file_name.to_string(),
            source_row,
        });
    }

    transactions
}

/// Canonicalize a date cell: serial numbers convert via the spreadsheet
/// epoch, recognizable strings via the ambiguity heuristic, and anything else
/// passes through in textual form.
fn normalize_date_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(n) if is_serial_date(*n) => serial_to_canonical(*n),
        Cell::Number(_) => cell.as_text(),
        Cell::Text(s) => {
            if let Some(date) = parse_ambiguous(s) {
                return date.format("%Y-%m-%d").to_string();
            }
            if let Ok(n) = s.trim().parse::<f64>() {
                if is_serial_date(n) {
                    return serial_to_canonical(n);
                }
            }
            s.trim().to_string()
        }
    }
}

/// Monetary cell parsing in the usual bank-export shapes: thousands commas,
/// currency symbols, accounting parentheses for negatives. Unparseable or
/// empty cells are absent, not zero.
fn parse_money(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            let (negative, s) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
                Some(inner) => (true, inner),
                None => (false, s),
            };
            let cleaned = s.replace([',', '$', '€', '£', ' '], "");
            let value = Decimal::from_str(&cleaned).ok()?;
            Some(if negative { -value } else { value })
        }
    }
}

fn id_stem(file_name: &str) -> String {
    let base = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    let stem: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    if stem.is_empty() {
        "import".to_string()
    } else {
        stem
    }
}

/// Deterministic batch-unique id: file stem + row, suffixed on collision.
fn mint_id(stem: &str, row: usize, seen: &mut HashSet<String>) -> String {
    let mut candidate = format!("{stem}-{row}");
    let mut attempt = 1usize;
    while !seen.insert(candidate.clone()) {
        attempt += 1;
        candidate = format!("{stem}-{row}-{attempt}");
    }
    candidate
}
