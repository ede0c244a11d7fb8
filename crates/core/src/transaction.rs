use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One canonical transaction, materialized from a confirmed import. The
/// canonical set is always rebuilt wholesale from its source records;
/// transactions are never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique within the canonical set; minted during materialization.
    pub id: String,
    /// Canonical `YYYY-MM-DD`, or the source's textual form when the value
    /// could not be read as a date.
    pub date: String,
    pub description: String,
    pub category: String,
    pub income: Option<Decimal>,
    pub expenses: Option<Decimal>,
    pub currency: String,
    /// Originating file, for traceability.
    pub file_name: String,
    /// 1-based row index in the originating file.
    pub source_row: usize,
}
