//! Merge coordination: the set of confirmed imports and the canonical
//! transaction list derived from it.

use std::collections::HashSet;

use colligo_core::{HeaderMapping, RawTable, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::materialize::materialize;
use crate::signature::FileSignature;

/// One confirmed import: the unit of deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedFileRecord {
    pub file_name: String,
    pub mapping: HeaderMapping,
    pub table: RawTable,
    /// First data row; everything above is header/preamble.
    pub data_row_index: usize,
    pub signature: FileSignature,
    pub selected: bool,
}

/// Owns the imported records in upload order and the canonical transaction
/// set, which is a derived view: rebuilt wholesale after every mutation,
/// never hand-edited.
#[derive(Debug, Default)]
pub struct MergeCoordinator {
    records: Vec<MergedFileRecord>,
    transactions: Vec<Transaction>,
}

impl MergeCoordinator {
    pub fn new() -> Self {
        MergeCoordinator::default()
    }

    pub fn records(&self) -> &[MergedFileRecord] {
        &self.records
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Append the record, unless an existing record shares its signature —
    /// re-uploading an already-imported file is expected user behavior, so
    /// the duplicate is a silent no-op, not an error. Returns whether the
    /// record was appended.
    pub fn add_or_skip(&mut self, record: MergedFileRecord) -> bool {
        if self
            .records
            .iter()
            .any(|existing| existing.signature == record.signature)
        {
            tracing::debug!(file = %record.file_name, "duplicate signature, skipping re-import");
            return false;
        }
        self.records.push(record);
        self.rebuild();
        true
    }

    /// Remove a record; its transactions disappear with the rebuild.
    pub fn remove(&mut self, index: usize) -> Option<MergedFileRecord> {
        if index >= self.records.len() {
            return None;
        }
        let removed = self.records.remove(index);
        self.rebuild();
        Some(removed)
    }

    /// Toggle a record's inclusion in the canonical set.
    pub fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        match self.records.get_mut(index) {
            Some(record) => {
                record.selected = selected;
                self.rebuild();
                true
            }
            None => false,
        }
    }

    /// Replace a record's mapping after the user re-edits it. The mapping is
    /// validated; an exclusivity violation is rejected, never auto-resolved.
    pub fn update_mapping(
        &mut self,
        index: usize,
        mapping: HeaderMapping,
    ) -> Result<(), IngestError> {
        mapping.validate()?;
        if let Some(record) = self.records.get_mut(index) {
            record.mapping = mapping;
            self.rebuild();
        }
        Ok(())
    }

    /// Flatten materializer output over every selected record, in record
    /// insertion order then row order. No sorting — ordering beyond that is a
    /// presentation concern. Ids are kept unique across the whole set by
    /// deterministic re-minting on collision.
    pub fn rebuild(&mut self) {
        let mut transactions: Vec<Transaction> = self
            .records
            .iter()
            .filter(|record| record.selected)
            .flat_map(|record| {
                materialize(
                    &record.table,
                    &record.mapping,
                    record.data_row_index,
                    &record.file_name,
                )
            })
            .collect();

        let mut seen: HashSet<String> = HashSet::with_capacity(transactions.len());
        for tx in &mut transactions {
            if !seen.insert(tx.id.clone()) {
                let mut attempt = 2usize;
                let mut candidate = format!("{}-{attempt}", tx.id);
                while !seen.insert(candidate.clone()) {
                    attempt += 1;
                    candidate = format!("{}-{attempt}", tx.id);
                }
                tx.id = candidate;
            }
        }

        self.transactions = transactions;
    }
}
