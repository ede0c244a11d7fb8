use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Semantic role of one column. `Date`, `Income` and `Expenses` are
/// exclusive: at most one column per table may carry each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTag {
    Date,
    Income,
    Expenses,
    Description,
    Ignore,
}

impl FieldTag {
    pub fn is_exclusive(&self) -> bool {
        matches!(self, FieldTag::Date | FieldTag::Income | FieldTag::Expenses)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldTag::Date => "date",
            FieldTag::Income => "income",
            FieldTag::Expenses => "expenses",
            FieldTag::Description => "description",
            FieldTag::Ignore => "ignore",
        }
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    #[error("columns {first} and {second} both claim the exclusive tag '{tag}'")]
    Ambiguous {
        tag: FieldTag,
        first: usize,
        second: usize,
    },
}

/// One tag per column, in column order. Inference produces one, a human may
/// overwrite it, and both the materializer and the signature generator
/// consume it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderMapping(Vec<FieldTag>);

impl HeaderMapping {
    pub fn new(tags: Vec<FieldTag>) -> Self {
        HeaderMapping(tags)
    }

    pub fn tags(&self) -> &[FieldTag] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column index carrying `tag`, if any. For exclusive tags on a valid
    /// mapping this is unique by construction.
    pub fn column_of(&self, tag: FieldTag) -> Option<usize> {
        self.0.iter().position(|t| *t == tag)
    }

    /// Enforce the exclusivity invariant. Inference upholds it by
    /// construction; this exists for human-edited mappings, which must be
    /// rejected (never auto-resolved) when two columns claim the same
    /// exclusive tag.
    pub fn validate(&self) -> Result<(), MappingError> {
        for tag in [FieldTag::Date, FieldTag::Income, FieldTag::Expenses] {
            let mut claimed: Option<usize> = None;
            for (column, t) in self.0.iter().enumerate() {
                if *t != tag {
                    continue;
                }
                match claimed {
                    None => claimed = Some(column),
                    Some(first) => {
                        return Err(MappingError::Ambiguous {
                            tag,
                            first,
                            second: column,
                        })
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<FieldTag>> for HeaderMapping {
    fn from(tags: Vec<FieldTag>) -> Self {
        HeaderMapping(tags)
    }
}
