//! Markup decoding without an XML dependency.
//!
//! Exporter markup is frequently OFX-style SGML that strict parsers reject
//! (unclosed leaf tags, stray headers), so rows are recovered by scanning:
//! first try conventional row-element names, then infer the row unit from tag
//! frequency, and as a last resort pull `(tag, text)` leaf pairs straight out
//! of the raw text.

use std::sync::OnceLock;

use colligo_core::{Cell, RawTable};
use regex::Regex;

use crate::error::IngestError;

/// Conventional row-unit element names, tried in order before any counting.
const ROW_ELEMENT_CANDIDATES: &[&str] = &["row", "entry", "transaction", "record", "item", "stmttrn"];

/// A tag repeating at least this often is noise, not a row unit.
const TAG_FREQUENCY_CEILING: usize = 10_000;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_open_tag, r"<([A-Za-z][A-Za-z0-9_.:-]*)");
re!(re_leaf_element, r"<([A-Za-z][A-Za-z0-9_.:-]*)(?:\s[^>]*)?>\s*([^<\s][^<]*)");

/// Decode markup content. The structural scanner and the leaf-pair fallback
/// agree on output shape for well-formed input; the fallback only widens
/// coverage to malformed documents.
pub fn decode(text: &str) -> Result<RawTable, IngestError> {
    if let Some(table) = structural_rows(text) {
        return Ok(table);
    }
    tracing::warn!("no repeated row element found, falling back to leaf-pair extraction");
    Ok(leaf_pairs(text))
}

/// Locate a repeated row element and expand each occurrence into one row.
/// Row 0 carries the first occurrence's child tag names so downstream stages
/// see the usual header-then-data shape.
fn structural_rows(text: &str) -> Option<RawTable> {
    let row_tag = find_row_tag(text)?;
    let blocks = extract_blocks(text, &row_tag);
    if blocks.len() < 2 {
        return None;
    }

    let header: Vec<String> = collect_pairs(blocks[0])
        .into_iter()
        .map(|(tag, _)| tag)
        .collect();
    if header.is_empty() {
        return None;
    }

    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(blocks.len() + 1);
    rows.push(header.iter().map(|t| Cell::from(t.as_str())).collect());

    for block in &blocks {
        let mut pairs = collect_pairs(block);
        let mut row: Vec<Cell> = Vec::with_capacity(header.len());
        for tag in &header {
            // Consume the first unclaimed pair with this tag so repeated
            // child tags keep their document order.
            let value = pairs
                .iter()
                .position(|(t, _)| t == tag)
                .map(|i| pairs.remove(i).1)
                .unwrap_or_default();
            row.push(Cell::Text(value));
        }
        rows.push(row);
    }

    Some(RawTable::new(rows))
}

/// Conventional names first; otherwise count every opening tag and keep the
/// first-seen name with a strictly greater count inside (1, ceiling). Ties
/// resolve to the earliest name, which is the enclosing container since it
/// opens before its children.
fn find_row_tag(text: &str) -> Option<String> {
    for candidate in ROW_ELEMENT_CANDIDATES {
        if count_open_tags(text, candidate) > 1 {
            return Some((*candidate).to_string());
        }
    }

    let mut counts: Vec<(String, usize)> = Vec::new();
    for cap in re_open_tag().captures_iter(text) {
        let name = cap[1].to_lowercase();
        match counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }

    let mut best: Option<(String, usize)> = None;
    for (name, count) in counts {
        if count > 1 && count < TAG_FREQUENCY_CEILING {
            if best.as_ref().map_or(true, |(_, c)| count > *c) {
                best = Some((name, count));
            }
        }
    }
    best.map(|(name, _)| name)
}

/// ASCII lowercasing keeps byte offsets aligned with the original text,
/// which full Unicode lowercasing does not guarantee.
fn ascii_lower(text: &str) -> String {
    text.chars().map(|c| c.to_ascii_lowercase()).collect()
}

fn count_open_tags(text: &str, tag: &str) -> usize {
    let lower = ascii_lower(text);
    let needle = format!("<{tag}");
    let mut count = 0;
    let mut from = 0;
    while let Some(pos) = lower[from..].find(&needle) {
        let at = from + pos;
        let after = lower[at + needle.len()..].chars().next();
        // Reject prefix hits like "<rowset" when counting "<row".
        if matches!(after, Some('>') | Some(' ') | Some('\t') | Some('\r') | Some('\n') | None) {
            count += 1;
        }
        from = at + needle.len();
    }
    count
}

/// Inner content of every `<tag>...</tag>` occurrence. An occurrence without
/// a closing tag extends to the next opening of the same tag or end of input,
/// which is how OFX-style SGML nests its records.
fn extract_blocks<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
    let lower = ascii_lower(text);
    let open = format!("<{tag}");
    let close = format!("</{tag}");

    let mut blocks = Vec::new();
    let mut from = 0;
    while let Some(pos) = lower[from..].find(&open) {
        let at = from + pos;
        let after = lower[at + open.len()..].chars().next();
        if !matches!(after, Some('>') | Some(' ') | Some('\t') | Some('\r') | Some('\n')) {
            from = at + open.len();
            continue;
        }
        let Some(content_rel) = lower[at..].find('>') else {
            break;
        };
        let start = at + content_rel + 1;

        let close_at = lower[start..].find(&close).map(|p| start + p);
        let next_open_at = lower[start..].find(&open).map(|p| start + p);
        let end = match (close_at, next_open_at) {
            (Some(c), Some(n)) => c.min(n),
            (Some(c), None) => c,
            (None, Some(n)) => n,
            (None, None) => text.len(),
        };

        blocks.push(&text[start..end]);
        from = end.max(start);
        if from == at {
            break;
        }
    }
    blocks
}

/// `(tag, text)` pairs for every leaf element carrying non-empty text.
fn collect_pairs(text: &str) -> Vec<(String, String)> {
    re_leaf_element()
        .captures_iter(text)
        .filter_map(|cap| {
            let value = cap[2].trim().to_string();
            if value.is_empty() {
                None
            } else {
                Some((cap[1].to_lowercase(), value))
            }
        })
        .collect()
}

/// Fallback shape: one row per leaf pair, `[tag, text]`.
fn leaf_pairs(text: &str) -> RawTable {
    let rows = collect_pairs(text)
        .into_iter()
        .map(|(tag, value)| vec![Cell::Text(tag), Cell::Text(value)])
        .collect();
    RawTable::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── leaf-pair fallback ────────────────────────────────────────────────────

    #[test]
    fn flat_document_decodes_to_leaf_pairs() {
        let table = decode("<root><a>1</a><b>2</b></root>").unwrap();
        let rows: Vec<Vec<String>> = table
            .rows()
            .iter()
            .map(|r| r.iter().map(Cell::as_text).collect())
            .collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.contains(&vec!["a".to_string(), "1".to_string()]));
        assert!(rows.contains(&vec!["b".to_string(), "2".to_string()]));
    }

    #[test]
    fn malformed_markup_still_yields_pairs() {
        let table = decode("<<x>>\n<date>2024-01-15\n<amount>-4.99\n").unwrap();
        let rows: Vec<Vec<String>> = table
            .rows()
            .iter()
            .map(|r| r.iter().map(Cell::as_text).collect())
            .collect();
        assert!(rows.contains(&vec!["date".to_string(), "2024-01-15".to_string()]));
        assert!(rows.contains(&vec!["amount".to_string(), "-4.99".to_string()]));
    }

    // ── structural path ───────────────────────────────────────────────────────

    #[test]
    fn conventional_row_element_becomes_rows() {
        let doc = "<export>\
                   <record><date>2024-01-15</date><amount>-4.99</amount></record>\
                   <record><date>2024-01-16</date><amount>12.00</amount></record>\
                   </export>";
        let table = decode(doc).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.header().unwrap().iter().map(Cell::as_text).collect::<Vec<_>>(),
            vec!["date", "amount"]
        );
        assert_eq!(table.rows()[1][0].as_text(), "2024-01-15");
        assert_eq!(table.rows()[2][1].as_text(), "12.00");
    }

    #[test]
    fn unconventional_row_element_found_by_frequency() {
        let doc = "<statement>\
                   <mvt><d>2024-01-15</d><m>-4.99</m></mvt>\
                   <mvt><d>2024-01-16</d><m>12.00</m></mvt>\
                   <mvt><d>2024-01-17</d><m>3.50</m></mvt>\
                   </statement>";
        let table = decode(doc).unwrap();
        // d and m repeat three times each, but mvt opens first and also
        // repeats three times, so the tie resolves to the container.
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.rows()[3][1].as_text(), "3.50");
    }

    #[test]
    fn ofx_style_unclosed_leaves_parse() {
        let doc = "<STMTTRN>\n<DTPOSTED>20240115\n<TRNAMT>-49.99\n</STMTTRN>\n\
                   <STMTTRN>\n<DTPOSTED>20240120\n<TRNAMT>1500.00\n</STMTTRN>\n";
        let table = decode(doc).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.header().unwrap().iter().map(Cell::as_text).collect::<Vec<_>>(),
            vec!["dtposted", "trnamt"]
        );
        assert_eq!(table.rows()[2][0].as_text(), "20240120");
    }

    #[test]
    fn missing_child_leaves_empty_cell() {
        let doc = "<record><date>2024-01-15</date><amount>-4.99</amount></record>\
                   <record><date>2024-01-16</date></record>";
        let table = decode(doc).unwrap();
        assert_eq!(table.rows()[2][1].as_text(), "");
    }

    #[test]
    fn prefix_tags_are_not_counted_as_row_elements() {
        assert_eq!(count_open_tags("<rowset><row>1</row><row>2</row></rowset>", "row"), 2);
    }

    #[test]
    fn single_occurrence_is_not_a_row_unit() {
        // One <record> only: falls through to leaf pairs.
        let table = decode("<record><a>1</a><b>2</b></record>").unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.rows()[0][0].as_text(), "a");
    }
}
