//! Structure and mapping fingerprints.
//!
//! The token is a 64-bit rolling hash, deliberately non-cryptographic: it is
//! a memoization key for "have I seen this file shape / this confirmed
//! mapping before", scoped to one user's imports. A collision mislabels a
//! preview the user then corrects; it cannot corrupt data. See DESIGN.md.

use colligo_core::dates::{is_serial_date, parse_ambiguous};
use colligo_core::{Cell, FieldTag, HeaderMapping, RawTable};
use serde::{Deserialize, Serialize};

use crate::decode::SourceKind;

/// Sentinel returned instead of an error so preview can proceed even when
/// fingerprinting degrades (no header row, all-ignored mapping).
pub const SIGNATURE_DEGENERATE: &str = "sig:degenerate";

/// Data rows sampled per column when inferring a markup type profile.
const TYPE_SAMPLE_ROWS: usize = 5;

/// The pair of opaque tokens identifying one confirmed import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSignature {
    pub structure: String,
    pub mapping: String,
}

/// djb2-style 64-bit rolling hash, rendered as a fixed 16-hex-char token.
fn rolling_hash(input: &str) -> String {
    let mut hash: u64 = 5381;
    for byte in input.as_bytes() {
        hash = hash.wrapping_mul(33) ^ u64::from(*byte);
    }
    format!("{hash:016x}")
}

/// Fingerprint of a file's shape, independent of user intent. Ordinary
/// tabular kinds hash the normalized header text; markup kinds hash a
/// per-column value-type profile instead, because exporter tag names vary
/// while the underlying shape does not. Never fails.
pub fn structure_signature(kind: SourceKind, table: &RawTable) -> String {
    let Some(header) = table.header() else {
        return SIGNATURE_DEGENERATE.to_string();
    };
    if header.is_empty() {
        return SIGNATURE_DEGENERATE.to_string();
    }

    let descriptor = match kind {
        SourceKind::Markup => column_type_profile(table).join("|"),
        _ => header
            .iter()
            .map(|cell| normalize_header(&cell.as_text()))
            .collect::<Vec<_>>()
            .join("|"),
    };
    rolling_hash(&format!("{}:{}:{}", kind.token(), header.len(), descriptor))
}

/// Fingerprint of a confirmed mapping, independent of header wording.
/// Ignore-tagged columns are excluded so cosmetic extra columns do not split
/// the group. Never fails.
pub fn mapping_signature(kind: SourceKind, mapping: &HeaderMapping) -> String {
    let filtered: Vec<&str> = mapping
        .tags()
        .iter()
        .filter(|tag| **tag != FieldTag::Ignore)
        .map(FieldTag::label)
        .collect();
    if filtered.is_empty() {
        return SIGNATURE_DEGENERATE.to_string();
    }
    rolling_hash(&format!("{}:{}", kind.token(), filtered.join("|")))
}

fn normalize_header(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One of `date` / `number` / `text` / `unknown` per column, majority over up
/// to [`TYPE_SAMPLE_ROWS`] non-empty samples; ties resolve date over number
/// over text.
fn column_type_profile(table: &RawTable) -> Vec<String> {
    (0..table.column_count())
        .map(|column| {
            let mut dates = 0usize;
            let mut numbers = 0usize;
            let mut texts = 0usize;
            for cell in table
                .column_values(column, 1)
                .filter(|c| !c.is_empty())
                .take(TYPE_SAMPLE_ROWS)
            {
                match classify(cell) {
                    "date" => dates += 1,
                    "number" => numbers += 1,
                    _ => texts += 1,
                }
            }
            if dates == 0 && numbers == 0 && texts == 0 {
                "unknown"
            } else if dates >= numbers && dates >= texts {
                "date"
            } else if numbers >= texts {
                "number"
            } else {
                "text"
            }
            .to_string()
        })
        .collect()
}

fn classify(cell: &Cell) -> &'static str {
    if let Some(n) = cell.as_number() {
        if is_serial_date(n) {
            return "date";
        }
        return "number";
    }
    if parse_ambiguous(&cell.as_text()).is_some() {
        return "date";
    }
    "text"
}
