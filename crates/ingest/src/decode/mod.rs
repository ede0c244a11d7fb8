//! Format decoding: one strategy per source kind, resolved once at decode
//! time into the canonical [`RawTable`]. Downstream stages never re-inspect
//! the source kind except as an explicit signature input.

pub mod delimited;
pub mod markup;
pub mod sheet;

use std::borrow::Cow;
use std::sync::mpsc;
use std::thread;

use colligo_core::RawTable;

use crate::error::IngestError;

/// File kind, resolved from the file extension exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Delimited,
    Markup,
    Spreadsheet,
}

impl SourceKind {
    pub fn from_name(name: &str) -> Result<Self, IngestError> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" | "tsv" | "txt" => Ok(SourceKind::Delimited),
            "xml" | "ofx" | "qfx" | "html" | "htm" => Ok(SourceKind::Markup),
            "xlsx" | "xls" | "xlsb" | "ods" => Ok(SourceKind::Spreadsheet),
            _ => Err(IngestError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Stable token mixed into signatures.
    pub fn token(&self) -> &'static str {
        match self {
            SourceKind::Delimited => "delimited",
            SourceKind::Markup => "markup",
            SourceKind::Spreadsheet => "sheet",
        }
    }
}

/// Raw upload payload: text for the line-oriented kinds, bytes for
/// spreadsheets. Either form converts to the other on demand.
#[derive(Debug, Clone)]
pub enum FileContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl FileContent {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FileContent::Text(s) => Cow::Borrowed(s.as_str()),
            FileContent::Bytes(b) => String::from_utf8_lossy(b),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(s) => s.as_bytes(),
            FileContent::Bytes(b) => b,
        }
    }
}

/// Decode `content` as `kind` and enforce the minimum shape: one header row
/// plus at least one data row. Both decode paths route through here, which is
/// what makes their outputs comparable byte for byte.
pub fn decode_table(kind: SourceKind, content: &FileContent) -> Result<RawTable, IngestError> {
    tracing::debug!(kind = kind.token(), "decoding upload");
    let table = match kind {
        SourceKind::Delimited => delimited::decode(&content.as_text())?,
        SourceKind::Markup => markup::decode(&content.as_text())?,
        SourceKind::Spreadsheet => sheet::decode(content.as_bytes())?,
    };
    if table.row_count() < 2 {
        return Err(IngestError::Validation {
            rows: table.row_count(),
        });
    }
    Ok(table)
}

/// One of two interchangeable decode paths. Implementations must produce
/// identical output for identical input; the integration suite holds them to
/// that.
pub trait TableDecoder {
    fn decode(&self, kind: SourceKind, content: FileContent) -> Result<RawTable, IngestError>;
}

/// In-place decoding on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncDecoder;

impl TableDecoder for SyncDecoder {
    fn decode(&self, kind: SourceKind, content: FileContent) -> Result<RawTable, IngestError> {
        decode_table(kind, &content)
    }
}

struct DecodeJob {
    kind: SourceKind,
    content: FileContent,
    reply: mpsc::Sender<Result<RawTable, IngestError>>,
}

/// Off-thread decoding: jobs are submitted to a dedicated worker over a
/// channel and awaited. Spreadsheet decodes always stay on the calling
/// thread. There is no cancellation and no timeout — a submitted decode runs
/// to completion or failure.
pub struct ThreadedDecoder {
    jobs: mpsc::Sender<DecodeJob>,
}

impl ThreadedDecoder {
    /// Capability probe: `None` when the worker thread cannot be spawned, in
    /// which case the caller should use [`SyncDecoder`].
    pub fn spawn() -> Option<Self> {
        let (jobs, inbox) = mpsc::channel::<DecodeJob>();
        thread::Builder::new()
            .name("colligo-decode".to_string())
            .spawn(move || {
                // Exits when the last sender is dropped.
                for job in inbox {
                    let result = decode_table(job.kind, &job.content);
                    let _ = job.reply.send(result);
                }
            })
            .ok()?;
        Some(ThreadedDecoder { jobs })
    }
}

impl TableDecoder for ThreadedDecoder {
    fn decode(&self, kind: SourceKind, content: FileContent) -> Result<RawTable, IngestError> {
        if kind == SourceKind::Spreadsheet {
            tracing::debug!("spreadsheet decode stays on the calling thread");
            return decode_table(kind, &content);
        }

        let (reply, results) = mpsc::channel();
        match self.jobs.send(DecodeJob { kind, content, reply }) {
            Ok(()) => results.recv().unwrap_or_else(|_| {
                Err(IngestError::Parse {
                    kind: "decode worker",
                    message: "worker terminated before replying".to_string(),
                })
            }),
            Err(mpsc::SendError(job)) => {
                tracing::warn!("decode worker gone, falling back to synchronous path");
                decode_table(job.kind, &job.content)
            }
        }
    }
}

/// Best available decode path: off-thread when the worker spawns, otherwise
/// synchronous.
pub fn default_decoder() -> Box<dyn TableDecoder> {
    match ThreadedDecoder::spawn() {
        Some(decoder) => Box::new(decoder),
        None => {
            tracing::warn!("off-thread decoding unavailable, using synchronous path");
            Box::new(SyncDecoder)
        }
    }
}
