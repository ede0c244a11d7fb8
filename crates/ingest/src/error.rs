use thiserror::Error;

/// Failure taxonomy for the whole upload flow. A decoder failure aborts the
/// upload as a single user-facing error; there is no partial-row recovery
/// within one decode.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file needs a header row and at least one data row, found {rows} row(s)")]
    Validation { rows: usize },
    #[error("unsupported file format: '{0}'")]
    UnsupportedFormat(String),
    #[error("failed to parse {kind} content: {message}")]
    Parse {
        kind: &'static str,
        message: String,
    },
    #[error(transparent)]
    AmbiguousMapping(#[from] colligo_core::MappingError),
    #[error("mapping store failure: {0}")]
    Store(#[from] colligo_storage::StoreError),
}
