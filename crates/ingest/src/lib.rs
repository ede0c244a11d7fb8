//! Ingestion pipeline for heterogeneous tabular financial exports.
//!
//! A file flows: decode into a [`colligo_core::RawTable`] → structure
//! fingerprint → mapping-store lookup (known shapes skip inference) →
//! suggested [`colligo_core::HeaderMapping`] → human confirmation →
//! materialization into canonical transactions, merged and deduplicated by
//! [`merge::MergeCoordinator`].

pub mod decode;
pub mod error;
pub mod infer;
pub mod materialize;
pub mod merge;
pub mod session;
pub mod signature;

pub use decode::{
    default_decoder, FileContent, SourceKind, SyncDecoder, TableDecoder, ThreadedDecoder,
};
pub use error::IngestError;
pub use infer::{KeywordSet, MappingInference};
pub use materialize::materialize;
pub use merge::{MergeCoordinator, MergedFileRecord};
pub use session::{confirm, preview, PreviewSession};
pub use signature::{mapping_signature, structure_signature, FileSignature};
