//! End-to-end pipeline behavior: the two-file merge scenario, re-import
//! idempotence, mapping-independent grouping, and the contract shared by the
//! synchronous and off-thread decode paths.

use colligo_core::FieldTag::{self, *};
use colligo_core::HeaderMapping;
use colligo_ingest::{
    confirm, mapping_signature, preview, structure_signature, FileContent, MappingInference,
    MergeCoordinator, SourceKind, SyncDecoder, TableDecoder, ThreadedDecoder,
};
use colligo_storage::MemoryStore;

const FILE_A: &str = "X,Y,Z\n2024-01-15,coffee,-4.50\n2024-01-16,books,-12.00\n2024-01-17,rent,-850.00\n";
const FILE_B: &str = "P,Q,R\n01/20/2024,salary,-1.00\n01/21/2024,snacks,-2.50\n";

fn import(
    merge: &mut MergeCoordinator,
    store: &mut MemoryStore,
    name: &str,
    content: &str,
    mapping: Vec<FieldTag>,
) -> bool {
    let session = preview(
        name,
        FileContent::Text(content.to_string()),
        &SyncDecoder,
        &MappingInference::default(),
        &*store,
    )
    .unwrap();
    let record = confirm(session, HeaderMapping::new(mapping), 1, &mut *store).unwrap();
    merge.add_or_skip(record)
}

// ── merge scenario ────────────────────────────────────────────────────────────

#[test]
fn two_files_same_mapping_merge_into_one_list() {
    let mut merge = MergeCoordinator::new();
    let mut store = MemoryStore::new();

    import(&mut merge, &mut store, "a.csv", FILE_A, vec![Date, Description, Expenses]);
    import(&mut merge, &mut store, "b.csv", FILE_B, vec![Date, Description, Expenses]);

    // Different headers → two distinct records...
    assert_eq!(merge.records().len(), 2);
    assert_ne!(
        merge.records()[0].signature.structure,
        merge.records()[1].signature.structure
    );
    // ...same confirmed mapping → identical mapping token.
    assert_eq!(
        merge.records()[0].signature.mapping,
        merge.records()[1].signature.mapping
    );
    // The flat list is the sum of both files' data rows, record order first.
    assert_eq!(merge.transactions().len(), 5);
    assert_eq!(merge.transactions()[0].file_name, "a.csv");
    assert_eq!(merge.transactions()[3].file_name, "b.csv");
    assert_eq!(merge.transactions()[0].date, "2024-01-15");
    assert_eq!(merge.transactions()[3].date, "2024-01-20");
}

#[test]
fn reupload_of_identical_content_is_a_no_op() {
    let mut merge = MergeCoordinator::new();
    let mut store = MemoryStore::new();

    assert!(import(&mut merge, &mut store, "a.csv", FILE_A, vec![Date, Description, Expenses]));

    // Second upload: the structure is known, the stored mapping is recalled,
    // and the record's signature pair matches — so the merge skips it.
    let session = preview(
        "a.csv",
        FileContent::Text(FILE_A.to_string()),
        &SyncDecoder,
        &MappingInference::default(),
        &store,
    )
    .unwrap();
    assert!(session.known);
    let mapping = session.mapping.clone();
    let record = confirm(session, mapping, 1, &mut store).unwrap();
    assert!(!merge.add_or_skip(record));

    assert_eq!(merge.records().len(), 1);
    assert_eq!(merge.transactions().len(), 3);
}

#[test]
fn mapping_signatures_group_across_header_wordings() {
    let mapping = HeaderMapping::new(vec![Date, Description, Expenses]);
    let sig_a = mapping_signature(SourceKind::Delimited, &mapping);
    let sig_b = mapping_signature(SourceKind::Delimited, &mapping);
    assert_eq!(sig_a, sig_b);

    let other = HeaderMapping::new(vec![Date, Description, Income]);
    assert_ne!(sig_a, mapping_signature(SourceKind::Delimited, &other));
}

#[test]
fn removing_a_record_invalidates_its_transactions() {
    let mut merge = MergeCoordinator::new();
    let mut store = MemoryStore::new();

    import(&mut merge, &mut store, "a.csv", FILE_A, vec![Date, Description, Expenses]);
    import(&mut merge, &mut store, "b.csv", FILE_B, vec![Date, Description, Expenses]);
    assert_eq!(merge.transactions().len(), 5);

    merge.remove(0);
    assert_eq!(merge.transactions().len(), 2);
    assert!(merge.transactions().iter().all(|t| t.file_name == "b.csv"));
}

// ── decode-path contract ──────────────────────────────────────────────────────

fn assert_paths_agree(name: &str, content: &str) {
    let kind = SourceKind::from_name(name).unwrap();
    let threaded = ThreadedDecoder::spawn().expect("spawn worker");

    let sync_table = SyncDecoder
        .decode(kind, FileContent::Text(content.to_string()))
        .unwrap();
    let threaded_table = threaded
        .decode(kind, FileContent::Text(content.to_string()))
        .unwrap();

    assert_eq!(sync_table, threaded_table);
    // Same table, same fingerprint.
    assert_eq!(
        structure_signature(kind, &sync_table),
        structure_signature(kind, &threaded_table)
    );
}

#[test]
fn decode_paths_agree_on_delimited_content() {
    assert_paths_agree("a.csv", FILE_A);
    assert_paths_agree(
        "quoted.csv",
        "h1,h2\n\"a,1\",\"say \"\"hi\"\"\"\n x , y \n",
    );
}

#[test]
fn decode_paths_agree_on_markup_content() {
    assert_paths_agree(
        "export.xml",
        "<export>\
         <record><date>2024-01-15</date><amount>-4.99</amount></record>\
         <record><date>2024-01-16</date><amount>12.00</amount></record>\
         </export>",
    );
    assert_paths_agree("flat.xml", "<root><a>1</a><b>2</b></root>");
}

#[test]
fn decode_paths_agree_on_failures() {
    let threaded = ThreadedDecoder::spawn().expect("spawn worker");
    let header_only = FileContent::Text("date,amount\n".to_string());

    let sync_err = SyncDecoder
        .decode(SourceKind::Delimited, header_only.clone())
        .unwrap_err();
    let threaded_err = threaded
        .decode(SourceKind::Delimited, header_only)
        .unwrap_err();
    assert_eq!(sync_err.to_string(), threaded_err.to_string());
}

// ── store recall across file kinds ────────────────────────────────────────────

#[test]
fn markup_reupload_with_renamed_tags_is_still_known() {
    let mut store = MemoryStore::new();
    let inference = MappingInference::default();

    let doc_a = "<stmt>\
                 <mvt><d>2024-01-15</d><m>-4.99</m></mvt>\
                 <mvt><d>2024-01-16</d><m>12.00</m></mvt>\
                 </stmt>";
    // Same exporter, different tag vocabulary, same shape: a date column and
    // a number column.
    let doc_b = "<stmt>\
                 <zeile><tag>2024-02-01</tag><wert>-8.00</wert></zeile>\
                 <zeile><tag>2024-02-02</tag><wert>3.00</wert></zeile>\
                 </stmt>";

    let session_a = preview("a.xml", FileContent::Text(doc_a.to_string()), &SyncDecoder, &inference, &store).unwrap();
    assert!(!session_a.known);
    confirm(session_a, HeaderMapping::new(vec![Date, Expenses]), 1, &mut store).unwrap();

    let session_b = preview("b.xml", FileContent::Text(doc_b.to_string()), &SyncDecoder, &inference, &store).unwrap();
    assert!(session_b.known, "type-profile signature should match across tag vocabularies");
    assert_eq!(session_b.mapping.tags(), &[Date, Expenses]);
}
