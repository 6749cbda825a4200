//! In-memory collaborators shared by the sync integration tests.
//!
//! Both fake stores append to one [`Journal`] so tests can assert on the
//! relative order of acknowledgments and writes.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{json, Value};

use wikisync_core::{
    ContainerId, DirtyMarker, DocumentId, Record, RecordId, SourceBinding, SourceName,
    StrategyKind,
};
use wikisync_renderer::{DocumentStrategy, RenderError};
use wikisync_sync::{DocumentStore, RecordStore, Source, StoreError};

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch { table: String },
    Lookup { record: String },
    Ack { record: String, field: String, value: Value },
    Write { document: String, markup: String },
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Call>>>);

impl Journal {
    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn acks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Ack { record, .. } => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Write { document, markup } => Some((document, markup)),
                _ => None,
            })
            .collect()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Lookup { record } => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn written_documents(&self) -> Vec<String> {
        self.writes().into_iter().map(|(d, _)| d).collect()
    }

    /// Position of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().position(pred)
    }
}

// ---------------------------------------------------------------------------
// Fake record store
// ---------------------------------------------------------------------------

pub struct FakeRecords {
    journal: Journal,
    records: Vec<Record>,
    linked: Vec<Record>,
    fail_fetch: bool,
    fail_ack_on: Option<String>,
}

impl FakeRecords {
    pub fn new(journal: &Journal, records: Vec<Record>) -> Self {
        FakeRecords {
            journal: journal.clone(),
            records,
            linked: Vec::new(),
            fail_fetch: false,
            fail_ack_on: None,
        }
    }

    /// Records reachable only through linked-record columns.
    pub fn with_linked(mut self, linked: Vec<Record>) -> Self {
        self.linked = linked;
        self
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn failing_ack_on(mut self, record: &str) -> Self {
        self.fail_ack_on = Some(record.to_string());
        self
    }
}

impl RecordStore for FakeRecords {
    fn fetch_records(&self, _container: &ContainerId, table: &str) -> Result<Vec<Record>, StoreError> {
        self.journal.push(Call::Fetch {
            table: table.to_string(),
        });
        if self.fail_fetch {
            return Err("connection refused".into());
        }
        Ok(self.records.clone())
    }

    fn fetch_record(
        &self,
        _container: &ContainerId,
        _table: &str,
        record: &RecordId,
    ) -> Result<Record, StoreError> {
        self.journal.push(Call::Lookup {
            record: record.0.clone(),
        });
        self.records
            .iter()
            .chain(&self.linked)
            .find(|r| &r.id == record)
            .cloned()
            .ok_or_else(|| format!("404 {record} not found").into())
    }

    fn update_field(
        &self,
        _container: &ContainerId,
        _table: &str,
        record: &RecordId,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        if self.fail_ack_on.as_deref() == Some(record.0.as_str()) {
            return Err("422 unprocessable".into());
        }
        self.journal.push(Call::Ack {
            record: record.0.clone(),
            field: field.to_string(),
            value,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake document store
// ---------------------------------------------------------------------------

pub struct FakeDocuments {
    journal: Journal,
    fail_on: Option<String>,
    writes_before_failure: Cell<usize>,
}

impl FakeDocuments {
    pub fn new(journal: &Journal) -> Self {
        FakeDocuments {
            journal: journal.clone(),
            fail_on: None,
            writes_before_failure: Cell::new(0),
        }
    }

    /// Fail every write of `document`.
    pub fn failing_on(mut self, document: &str) -> Self {
        self.fail_on = Some(document.to_string());
        self
    }

    pub fn attempted_before_failure(&self) -> usize {
        self.writes_before_failure.get()
    }
}

impl DocumentStore for FakeDocuments {
    fn write_document(&self, document: &DocumentId, markup: &str) -> Result<(), StoreError> {
        if self.fail_on.as_deref() == Some(document.0.as_str()) {
            return Err(format!("wiki rejected {document}").into());
        }
        self.writes_before_failure.set(self.writes_before_failure.get() + 1);
        self.journal.push(Call::Write {
            document: document.0.clone(),
            markup: markup.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stub strategy
// ---------------------------------------------------------------------------

/// Renders `Name` fields; detail documents live at `pages:<record id>`.
pub struct StubStrategy {
    pub linked: bool,
}

impl DocumentStrategy for StubStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Generic
    }

    fn render_summary(&self, records: &[Record]) -> Result<String, RenderError> {
        Ok(records
            .iter()
            .map(|r| format!("| {} |\n", r.text("Name")))
            .collect())
    }

    fn render_detail(&self, record: &Record) -> Result<String, RenderError> {
        Ok(format!("===== {} =====\n", record.text("Name")))
    }

    fn detail_document_id(&self, record: &Record) -> Option<DocumentId> {
        record.get("Name")?;
        Some(DocumentId(format!("pages:{}", record.id)))
    }

    fn has_linked_documents(&self) -> bool {
        self.linked
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn record(id: &str, fields: Value) -> Record {
    let fields = serde_json::from_value(fields).expect("object fields");
    Record::from_remote(id, fields, &DirtyMarker::default())
}

pub fn dirty(id: &str, name: &str) -> Record {
    record(id, json!({"Modified": true, "Name": name}))
}

pub fn clean(id: &str, name: &str) -> Record {
    record(id, json!({"Name": name}))
}

pub fn binding(name: &str, known: bool) -> SourceBinding {
    SourceBinding {
        name: SourceName::from(name),
        kind: StrategyKind::Generic,
        container: ContainerId::from("appTest"),
        table: name.to_string(),
        summary_document: DocumentId::from("tables:test"),
        detail_namespace: Some("pages:".to_string()),
        known,
    }
}

/// A known source with the stub strategy over `records`.
pub fn source(records: Vec<Record>, linked: bool) -> Source {
    Source::new(binding("Stub", true), Box::new(StubStrategy { linked }), records)
}

pub fn unknown_source(records: Vec<Record>) -> Source {
    Source::new(
        binding("Theories", false),
        Box::new(StubStrategy { linked: true }),
        records,
    )
}

/// Route `tracing` output through the test harness; `RUST_LOG` applies.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
