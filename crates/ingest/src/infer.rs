//! Header-mapping inference: keyword match on header text first, then
//! classification of sampled data values. First match wins per column, and a
//! running claim set guarantees the suggestion never carries a duplicate
//! exclusive tag.

use std::sync::OnceLock;

use colligo_core::dates::{is_serial_date, parse_ambiguous};
use colligo_core::{Cell, FieldTag, HeaderMapping, RawTable};
use regex::Regex;
use serde::Deserialize;

use crate::error::IngestError;

/// Non-empty data values sampled per column.
const SAMPLE_LIMIT: usize = 5;

fn re_letter_run() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\p{Alphabetic}{2,}").expect("invalid regex"))
}

/// Multilingual header vocabulary, one list per concept. Deployments extend
/// the built-ins from a TOML document with bank-specific wording.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    date: Vec<String>,
    expenses: Vec<String>,
    income: Vec<String>,
    description: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct KeywordOverrides {
    #[serde(default)]
    date: Vec<String>,
    #[serde(default)]
    expenses: Vec<String>,
    #[serde(default)]
    income: Vec<String>,
    #[serde(default)]
    description: Vec<String>,
}

impl Default for KeywordSet {
    fn default() -> Self {
        let list = |words: &[&str]| words.iter().map(|w| (*w).to_string()).collect();
        KeywordSet {
            date: list(&[
                "date", "datum", "fecha", "data", "дата", "日付", "buchungstag", "valuta",
                "posted",
            ]),
            expenses: list(&[
                "expense", "debit", "withdrawal", "ausgabe", "gasto", "uscite", "spesa", "soll",
                "расход", "支出", "débit",
            ]),
            income: list(&[
                "income", "credit", "deposit", "einnahme", "ingreso", "entrate", "haben",
                "доход", "收入", "crédit",
            ]),
            description: list(&[
                "description", "memo", "payee", "narrative", "beschreibung", "descripción",
                "causale", "verwendungszweck", "concepto", "摘要",
            ]),
        }
    }
}

impl KeywordSet {
    /// Concept suggested by a (lowercased) header text, checked in the order
    /// date, expenses, income, description.
    fn concept_of(&self, header: &str) -> Option<FieldTag> {
        let matches = |words: &[String]| words.iter().any(|w| header.contains(w.as_str()));
        if matches(&self.date) {
            Some(FieldTag::Date)
        } else if matches(&self.expenses) {
            Some(FieldTag::Expenses)
        } else if matches(&self.income) {
            Some(FieldTag::Income)
        } else if matches(&self.description) {
            Some(FieldTag::Description)
        } else {
            None
        }
    }

    /// Extend the vocabulary from a TOML document of the form
    /// `date = ["buchung"]` etc. Unknown concepts are rejected by serde.
    pub fn extend_from_toml(&mut self, doc: &str) -> Result<(), IngestError> {
        let overrides: KeywordOverrides =
            toml::from_str(doc).map_err(|e| IngestError::Parse {
                kind: "keyword config",
                message: e.to_string(),
            })?;
        let lower = |words: Vec<String>| words.into_iter().map(|w| w.to_lowercase());
        self.date.extend(lower(overrides.date));
        self.expenses.extend(lower(overrides.expenses));
        self.income.extend(lower(overrides.income));
        self.description.extend(lower(overrides.description));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ClaimedTags {
    date: bool,
    income: bool,
    expenses: bool,
}

impl ClaimedTags {
    fn has(&self, tag: FieldTag) -> bool {
        match tag {
            FieldTag::Date => self.date,
            FieldTag::Income => self.income,
            FieldTag::Expenses => self.expenses,
            _ => false,
        }
    }

    fn claim(&mut self, tag: FieldTag) {
        match tag {
            FieldTag::Date => self.date = true,
            FieldTag::Income => self.income = true,
            FieldTag::Expenses => self.expenses = true,
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct MappingInference {
    keywords: KeywordSet,
}

impl MappingInference {
    pub fn new(keywords: KeywordSet) -> Self {
        MappingInference { keywords }
    }

    /// Propose one tag per column. Only the first column matching an
    /// exclusive concept takes it; later contenders fall through to data
    /// sampling and, if that is claimed too, degrade to `Description`.
    pub fn suggest(&self, table: &RawTable) -> HeaderMapping {
        let header: Vec<String> = table
            .header()
            .map(|row| row.iter().map(|c| c.as_text().to_lowercase()).collect())
            .unwrap_or_default();

        let mut claimed = ClaimedTags::default();
        let mut tags = Vec::with_capacity(table.column_count());
        for column in 0..table.column_count() {
            let tag = self.suggest_column(table, header.get(column).map(String::as_str), column, &claimed);
            claimed.claim(tag);
            tags.push(tag);
        }
        HeaderMapping::new(tags)
    }

    fn suggest_column(
        &self,
        table: &RawTable,
        header: Option<&str>,
        column: usize,
        claimed: &ClaimedTags,
    ) -> FieldTag {
        if let Some(tag) = header.and_then(|h| self.keywords.concept_of(h)) {
            if !claimed.has(tag) {
                return tag;
            }
        }
        match sample_tag(table, column) {
            Some(tag) if !claimed.has(tag) => tag,
            _ => FieldTag::Description,
        }
    }
}

/// Classify a column from up to [`SAMPLE_LIMIT`] non-empty data values, in
/// priority order: date strings, serial dates, monetary/plain numerics by
/// sign, then text with letter runs.
fn sample_tag(table: &RawTable, column: usize) -> Option<FieldTag> {
    let samples: Vec<&Cell> = table
        .column_values(column, 1)
        .filter(|c| !c.is_empty())
        .take(SAMPLE_LIMIT)
        .collect();
    if samples.is_empty() {
        return None;
    }

    if samples
        .iter()
        .all(|c| parse_ambiguous(&c.as_text()).is_some())
    {
        return Some(FieldTag::Date);
    }

    let numbers: Vec<f64> = samples.iter().filter_map(|c| c.as_number()).collect();
    if numbers.len() == samples.len() {
        if numbers.iter().all(|n| is_serial_date(*n)) {
            return Some(FieldTag::Date);
        }
        let negatives = numbers.iter().filter(|n| **n < 0.0).count();
        let positives = numbers.iter().filter(|n| **n > 0.0).count();
        // All-nonnegative reads as income, all-nonpositive as expenses;
        // mixed columns go to the majority sign, income on a tie.
        return Some(if negatives == 0 {
            FieldTag::Income
        } else if positives == 0 {
            FieldTag::Expenses
        } else if negatives > positives {
            FieldTag::Expenses
        } else {
            FieldTag::Income
        });
    }

    if samples
        .iter()
        .any(|c| re_letter_run().is_match(&c.as_text()))
    {
        return Some(FieldTag::Description);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use FieldTag::*;

    fn table(rows: Vec<Vec<&str>>) -> RawTable {
        RawTable::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Cell::from).collect())
                .collect(),
        )
    }

    // ── header keywords ───────────────────────────────────────────────────────

    #[test]
    fn english_headers_map_by_keyword() {
        let t = table(vec![
            vec!["Date", "Description", "Debit"],
            vec!["2024-01-15", "coffee", "4.50"],
        ]);
        let mapping = MappingInference::default().suggest(&t);
        assert_eq!(mapping.tags(), &[Date, Description, Expenses]);
    }

    #[test]
    fn german_headers_map_by_keyword() {
        let t = table(vec![
            vec!["Buchungstag", "Verwendungszweck", "Soll", "Haben"],
            vec!["15.01.2024", "Miete Januar", "850,00", ""],
        ]);
        let mapping = MappingInference::default().suggest(&t);
        assert_eq!(mapping.tags(), &[Date, Description, Expenses, Income]);
    }

    #[test]
    fn second_date_like_header_does_not_reclaim() {
        let t = table(vec![
            vec!["Date", "Value Date", "Amount"],
            vec!["2024-01-15", "2024-01-17", "-4.50"],
        ]);
        let mapping = MappingInference::default().suggest(&t);
        assert_eq!(mapping.tags()[0], Date);
        // Second column matches the date keyword and samples as dates, but
        // Date is claimed: it degrades to Description.
        assert_eq!(mapping.tags()[1], Description);
    }

    // ── data sampling ─────────────────────────────────────────────────────────

    #[test]
    fn headerless_columns_classify_from_samples() {
        let t = table(vec![
            vec!["c1", "c2", "c3"],
            vec!["2024-01-15", "AMAZON MARKETPLACE", "-49.99"],
            vec!["2024-01-16", "STARBUCKS", "-5.00"],
        ]);
        let mapping = MappingInference::default().suggest(&t);
        assert_eq!(mapping.tags(), &[Date, Description, Expenses]);
    }

    #[test]
    fn nonnegative_numbers_read_as_income() {
        let t = table(vec![
            vec!["a", "b"],
            vec!["x", "1500.00"],
            vec!["y", "0"],
            vec!["z", "2200.50"],
        ]);
        let mapping = MappingInference::default().suggest(&t);
        assert_eq!(mapping.tags()[1], Income);
    }

    #[test]
    fn serial_numbers_read_as_date() {
        let t = table(vec![
            vec!["c1", "c2"],
            vec!["45000", "note one"],
            vec!["45001", "note two"],
        ]);
        let mapping = MappingInference::default().suggest(&t);
        assert_eq!(mapping.tags(), &[Date, Description]);
    }

    #[test]
    fn empty_column_defaults_to_description() {
        let t = table(vec![vec!["h1", "h2"], vec!["-3.00", ""], vec!["-4.00", ""]]);
        let mapping = MappingInference::default().suggest(&t);
        assert_eq!(mapping.tags(), &[Expenses, Description]);
    }

    // ── invariant ─────────────────────────────────────────────────────────────

    #[test]
    fn suggestion_never_duplicates_exclusive_tags() {
        // Three all-negative amount columns fight over Expenses.
        let t = table(vec![
            vec!["a", "b", "c"],
            vec!["-1.10", "-2.20", "-3.30"],
            vec!["-4.40", "-5.50", "-6.60"],
        ]);
        let mapping = MappingInference::default().suggest(&t);
        assert!(mapping.validate().is_ok());
        assert_eq!(
            mapping.tags().iter().filter(|t| **t == Expenses).count(),
            1
        );
    }

    // ── keyword configuration ─────────────────────────────────────────────────

    #[test]
    fn toml_overrides_extend_the_vocabulary() {
        let mut keywords = KeywordSet::default();
        keywords
            .extend_from_toml(r#"date = ["wertstellung"]"#)
            .unwrap();
        let t = table(vec![
            vec!["Wertstellung", "Text"],
            vec!["15.01.2024", "whatever"],
        ]);
        let mapping = MappingInference::new(keywords).suggest(&t);
        assert_eq!(mapping.tags()[0], Date);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let mut keywords = KeywordSet::default();
        assert!(matches!(
            keywords.extend_from_toml("date = 5"),
            Err(IngestError::Parse { .. })
        ));
    }
}
