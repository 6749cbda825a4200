//! Dirty-flag protocol: what gets acknowledged, what gets written, in which
//! order, and which advisories come out.

mod support;

use rstest::rstest;
use serde_json::{json, Value};

use support::{clean, dirty, init_tracing, source, unknown_source, Call, FakeDocuments, FakeRecords, Journal};
use wikisync_core::{AckOrdering, DirtyMarker, DocumentId};
use wikisync_sync::{Advisory, Operation, SyncError, SyncOptions, Synchronizer, WriteResult};

fn options(acknowledge: AckOrdering) -> SyncOptions {
    SyncOptions {
        acknowledge,
        dry_run: false,
    }
}

fn stale_advisories(advisories: &[Advisory]) -> usize {
    advisories
        .iter()
        .filter(|a| matches!(a, Advisory::StaleDetailDocuments { .. }))
        .count()
}

// ---------------------------------------------------------------------------
// sync_summary_document
// ---------------------------------------------------------------------------

#[test]
fn summary_sync_acknowledges_dirty_and_writes_full_table() {
    init_tracing();
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let src = source(vec![dirty("r1", "A"), clean("r2", "B")], true);
    let result = session.sync_summary_document(&src).unwrap();

    assert_eq!(result.records_processed, 1);
    assert_eq!(result.operation, Operation::SyncSummary);
    assert_eq!(
        journal.calls(),
        vec![
            Call::Ack {
                record: "r1".into(),
                field: "Modified".into(),
                value: Value::Bool(false),
            },
            Call::Write {
                document: "tables:test".into(),
                markup: "| A |\n| B |\n".into(),
            },
        ]
    );
    assert_eq!(stale_advisories(&result.advisories), 1);
    assert_eq!(result.acknowledged.len(), 1);
    assert_eq!(
        result.documents,
        vec![WriteResult::Written {
            document: DocumentId::from("tables:test")
        }]
    );
}

#[test]
fn summary_sync_with_nothing_dirty_is_a_no_op() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let src = source(vec![clean("r1", "A"), clean("r2", "B")], true);
    let result = session.sync_summary_document(&src).unwrap();

    assert_eq!(result.records_processed, 0);
    assert!(journal.calls().is_empty());
    assert!(result.documents.is_empty());
    assert!(result.advisories.is_empty(), "no stale-pages advisory without dirty records");
}

#[rstest]
#[case::linked_with_dirty(true, true, 1)]
#[case::linked_all_clean(true, false, 0)]
#[case::unlinked_with_dirty(false, true, 0)]
#[case::unlinked_all_clean(false, false, 0)]
fn stale_detail_advisory_follows_linkage_and_dirtiness(
    #[case] linked: bool,
    #[case] any_dirty: bool,
    #[case] expected: usize,
) {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let first = if any_dirty { dirty("r1", "A") } else { clean("r1", "A") };
    let src = source(vec![first, clean("r2", "B")], linked);
    let result = session.sync_summary_document(&src).unwrap();
    assert_eq!(stale_advisories(&result.advisories), expected);
}

#[test]
fn every_dirty_record_is_acknowledged_exactly_once() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let src = source(
        vec![dirty("r1", "A"), clean("r2", "B"), dirty("r3", "C"), dirty("r4", "D")],
        false,
    );
    session.sync_summary_document(&src).unwrap();

    assert_eq!(journal.acks(), vec!["r1", "r3", "r4"]);
    assert_eq!(journal.written_documents(), vec!["tables:test"]);
}

#[test]
fn unknown_source_gets_default_layout_advisory_pointing_at_summary() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    // Emitted even when nothing was dirty.
    let src = unknown_source(vec![clean("r1", "A")]);
    let result = session.sync_summary_document(&src).unwrap();
    assert_eq!(
        result.advisories,
        vec![Advisory::DefaultLayout {
            source: "Theories".into(),
            location: "tables:test".into(),
        }]
    );
    assert!(result.advisories[0].to_string().contains("tables:test"));
}

// ---------------------------------------------------------------------------
// sync_detail_documents
// ---------------------------------------------------------------------------

#[test]
fn detail_sync_writes_one_document_per_dirty_record() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let mut src = source(vec![dirty("r1", "A"), clean("r2", "B"), dirty("r3", "C")], true);
    let result = session.sync_detail_documents(&mut src).unwrap();

    assert_eq!(result.records_processed, 2);
    assert_eq!(journal.written_documents(), vec!["pages:r1", "pages:r3"]);
    assert!(!journal.written_documents().contains(&"tables:test".to_string()));
    assert_eq!(journal.acks(), vec!["r1", "r3"]);
    assert!(result.advisories.is_empty());
}

#[test]
fn detail_sync_narrows_snapshot_to_dirty_subset() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let mut src = source(vec![clean("r1", "A"), dirty("r2", "B")], true);
    session.sync_detail_documents(&mut src).unwrap();
    let ids: Vec<_> = src.records().iter().map(|r| r.id.0.as_str()).collect();
    assert_eq!(ids, vec!["r2"]);

    // Nothing dirty: snapshot left as is.
    let mut all_clean = source(vec![clean("r1", "A"), clean("r2", "B")], true);
    session.sync_detail_documents(&mut all_clean).unwrap();
    assert_eq!(all_clean.records().len(), 2);
}

#[test]
fn detail_sync_skips_records_without_a_detail_document() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let nameless = support::record("r2", json!({"Modified": true}));
    let mut src = source(vec![dirty("r1", "A"), nameless], true);
    let result = session.sync_detail_documents(&mut src).unwrap();

    assert_eq!(result.records_processed, 1);
    assert_eq!(journal.written_documents(), vec!["pages:r1"]);
    assert_eq!(journal.acks(), vec!["r1", "r2"], "still acknowledged at discovery");
}

#[test]
fn unknown_source_detail_advisory_points_at_detail_namespace() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let mut src = unknown_source(vec![dirty("r1", "A")]);
    let result = session.sync_detail_documents(&mut src).unwrap();
    assert_eq!(
        result.advisories,
        vec![Advisory::DefaultLayout {
            source: "Theories".into(),
            location: "pages:".into(),
        }]
    );
}

// ---------------------------------------------------------------------------
// Acknowledgment ordering and failures
// ---------------------------------------------------------------------------

#[rstest]
#[case::before_write(AckOrdering::BeforeWrite)]
#[case::after_write(AckOrdering::AfterWrite)]
fn ordering_of_ack_and_summary_write(#[case] ordering: AckOrdering) {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), options(ordering));

    let src = source(vec![dirty("r1", "A")], false);
    session.sync_summary_document(&src).unwrap();

    let ack = journal.position(|c| matches!(c, Call::Ack { .. })).unwrap();
    let write = journal.position(|c| matches!(c, Call::Write { .. })).unwrap();
    match ordering {
        AckOrdering::BeforeWrite => assert!(ack < write),
        AckOrdering::AfterWrite => assert!(write < ack),
    }
}

#[rstest]
#[case::before_write(AckOrdering::BeforeWrite, vec!["r1", "r2"])]
#[case::after_write(AckOrdering::AfterWrite, vec![])]
fn failed_summary_write_leaves_records_per_ordering(
    #[case] ordering: AckOrdering,
    #[case] expected_acks: Vec<&str>,
) {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal).failing_on("tables:test");
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), options(ordering));

    let src = source(vec![dirty("r1", "A"), dirty("r2", "B")], false);
    let err = session.sync_summary_document(&src).unwrap_err();

    assert!(matches!(err, SyncError::Write { ref document, .. } if document.0 == "tables:test"));
    assert_eq!(journal.acks(), expected_acks);
    assert!(journal.writes().is_empty());
}

#[rstest]
#[case::before_write(AckOrdering::BeforeWrite, vec!["r1", "r2", "r3"])]
#[case::after_write(AckOrdering::AfterWrite, vec!["r1"])]
fn failed_detail_write_aborts_the_loop(
    #[case] ordering: AckOrdering,
    #[case] expected_acks: Vec<&str>,
) {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal).failing_on("pages:r2");
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), options(ordering));

    let mut src = source(vec![dirty("r1", "A"), dirty("r2", "B"), dirty("r3", "C")], true);
    let err = session.sync_detail_documents(&mut src).unwrap_err();

    assert!(matches!(err, SyncError::Write { .. }));
    assert_eq!(journal.written_documents(), vec!["pages:r1"]);
    assert_eq!(docs.attempted_before_failure(), 1);
    // Before-write has already cleared r3, whose page was never written.
    assert_eq!(journal.acks(), expected_acks);
}

#[test]
fn failed_acknowledgment_propagates_with_record_id() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]).failing_ack_on("r2");
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let src = source(vec![dirty("r1", "A"), dirty("r2", "B"), dirty("r3", "C")], false);
    let err = session.sync_summary_document(&src).unwrap_err();

    match err {
        SyncError::Acknowledge { record, table, .. } => {
            assert_eq!(record.0, "r2");
            assert_eq!(table, "Stub");
        }
        other => panic!("expected acknowledge error, got {other:?}"),
    }
    assert_eq!(journal.acks(), vec!["r1"]);
    assert!(journal.writes().is_empty(), "no write after a failed acknowledgment");
}

#[test]
fn custom_dirty_marker_is_the_field_that_gets_cleared() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let marker = DirtyMarker("Needs publish".to_string());
    let session = Synchronizer::new(&records, &docs, marker.clone(), SyncOptions::default());

    let fields = serde_json::from_value(json!({"Needs publish": 1, "Name": "A"})).unwrap();
    let rec = wikisync_core::Record::from_remote("r1", fields, &marker);
    session.sync_summary_document(&source(vec![rec], false)).unwrap();

    assert!(matches!(
        &journal.calls()[0],
        Call::Ack { field, .. } if field == "Needs publish"
    ));
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_touches_nothing_but_reports_would_write() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let opts = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), opts);

    let mut src = source(vec![dirty("r1", "A"), clean("r2", "B")], true);
    let result = session.sync_all_documents(&mut src).unwrap();

    assert!(journal.calls().is_empty());
    assert!(result.dry_run);
    assert!(result.acknowledged.is_empty());
    assert_eq!(result.records_processed, 1);
    assert_eq!(
        result.documents,
        vec![
            WriteResult::WouldWrite {
                document: DocumentId::from("tables:test")
            },
            WriteResult::WouldWrite {
                document: DocumentId::from("pages:r1")
            },
        ]
    );
}

// ---------------------------------------------------------------------------
// Combined sync
// ---------------------------------------------------------------------------

#[rstest]
#[case::before_write(AckOrdering::BeforeWrite)]
#[case::after_write(AckOrdering::AfterWrite)]
fn combined_sync_acknowledges_each_dirty_record_once(#[case] ordering: AckOrdering) {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), options(ordering));

    let mut src = source(vec![dirty("r1", "A"), clean("r2", "B"), dirty("r3", "C")], true);
    let result = session.sync_all_documents(&mut src).unwrap();

    assert_eq!(journal.acks(), vec!["r1", "r3"]);
    assert_eq!(
        journal.written_documents(),
        vec!["tables:test", "pages:r1", "pages:r3"]
    );
    // Summary covers the full snapshot, not just the dirty subset.
    assert_eq!(journal.writes()[0].1, "| A |\n| B |\n| C |\n");
    assert_eq!(stale_advisories(&result.advisories), 0);
    assert_eq!(result.operation, Operation::SyncAll);
}

#[test]
fn combined_sync_on_unknown_source_advises_both_locations() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let mut src = unknown_source(vec![clean("r1", "A")]);
    let result = session.sync_all_documents(&mut src).unwrap();
    let locations: Vec<_> = result
        .advisories
        .iter()
        .filter_map(|a| match a {
            Advisory::DefaultLayout { location, .. } => Some(location.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(locations, vec!["tables:test", "pages:"]);
    assert!(journal.calls().is_empty());
}

#[test]
fn advisories_serialize_as_their_messages() {
    let journal = Journal::default();
    let records = FakeRecords::new(&journal, vec![]);
    let docs = FakeDocuments::new(&journal);
    let session = Synchronizer::new(&records, &docs, DirtyMarker::default(), SyncOptions::default());

    let src = unknown_source(vec![clean("r1", "A")]);
    let result = session.publish_summary_document(&src).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    let expected = result.advisories[0].to_string();
    assert_eq!(json["advisories"], json!([expected]));
    assert!(json["advisories"][0].as_str().unwrap().contains("uses the default layout"));
}
