//! Preview/confirm orchestration. The in-flight upload is an explicit
//! session value threaded by parameter — there is no module-level "currently
//! previewed file" state.

use chrono::Utc;
use colligo_core::{HeaderMapping, RawTable};
use colligo_storage::{MappingStore, SavedMapping};

use crate::decode::{FileContent, SourceKind, TableDecoder};
use crate::error::IngestError;
use crate::infer::MappingInference;
use crate::merge::MergedFileRecord;
use crate::signature::{mapping_signature, structure_signature, FileSignature};

/// Everything the confirmation step (and the preview UI) needs about one
/// decoded upload.
#[derive(Debug, Clone)]
pub struct PreviewSession {
    pub file_name: String,
    pub kind: SourceKind,
    pub table: RawTable,
    pub structure_sig: String,
    /// Recalled from the store for a known shape, otherwise inferred.
    pub mapping: HeaderMapping,
    /// True when the mapping came from the store and needs no confirmation
    /// round-trip.
    pub known: bool,
}

/// Decode an upload, fingerprint its structure, and either recall the
/// mapping memoized for that shape or propose one by inference.
pub fn preview(
    file_name: &str,
    content: FileContent,
    decoder: &dyn TableDecoder,
    inference: &MappingInference,
    store: &dyn MappingStore,
) -> Result<PreviewSession, IngestError> {
    let kind = SourceKind::from_name(file_name)?;
    let table = decoder.decode(kind, content)?;
    let structure_sig = structure_signature(kind, &table);

    let (mapping, known) = match store.get(&structure_sig) {
        Some(saved) => {
            tracing::debug!(sig = %structure_sig, "known structure, recalling mapping");
            (saved.mapping, true)
        }
        None => (inference.suggest(&table), false),
    };

    Ok(PreviewSession {
        file_name: file_name.to_string(),
        kind,
        table,
        structure_sig,
        mapping,
        known,
    })
}

/// Turn a session plus the human-confirmed mapping into a merged record,
/// memoizing the mapping under the structure signature on the way. An
/// exclusivity violation in the edited mapping is rejected here — persistence
/// must not proceed until the human resolves it.
pub fn confirm(
    session: PreviewSession,
    confirmed: HeaderMapping,
    data_row_index: usize,
    store: &mut dyn MappingStore,
) -> Result<MergedFileRecord, IngestError> {
    confirmed.validate()?;

    let mapping_sig = mapping_signature(session.kind, &confirmed);
    store.set(
        &session.structure_sig,
        SavedMapping {
            mapping: confirmed.clone(),
            structure_sig: session.structure_sig.clone(),
            mapping_sig: mapping_sig.clone(),
            created_at: Utc::now(),
        },
    )?;

    Ok(MergedFileRecord {
        file_name: session.file_name,
        mapping: confirmed,
        table: session.table,
        data_row_index,
        signature: FileSignature {
            structure: session.structure_sig,
            mapping: mapping_sig,
        },
        selected: true,
    })
}
