//! Dirty-flag synchronization and full publication.
//!
//! ## Sync protocol (update mode)
//!
//! 1. Scan the record snapshot for dirty records.
//! 2. Acknowledge each one to the record store (clear its marker).
//! 3. Regenerate the affected documents through the source's strategy.
//! 4. Write them to the document store (full overwrite).
//!
//! With [`AckOrdering::BeforeWrite`] step 2 happens as each record is
//! discovered, so a failed write in step 4 leaves already-acknowledged
//! records that will not be picked up again. [`AckOrdering::AfterWrite`]
//! moves each acknowledgment after the write of the document covering it.
//!
//! Nothing is retried and nothing is rolled back; the first error aborts the
//! operation.
//!
//! Records whose detail documents collide (names that differ only in
//! punctuation) produce one write; the last such record wins.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use wikisync_core::{AckOrdering, DirtyMarker, DocumentId, Record, RecordId, SourceName};

use crate::error::SyncError;
use crate::source::Source;
use crate::store::{DocumentStore, RecordStore};

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Behaviour switches for a [`Synchronizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    pub acknowledge: AckOrdering,
    /// Skip acknowledgments and writes; report what would be written.
    pub dry_run: bool,
}

/// Which operation produced a [`SyncResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    SyncSummary,
    SyncDetails,
    SyncAll,
    PublishSummary,
    PublishDetails,
    PublishAll,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::SyncSummary => "table sync",
            Operation::SyncDetails => "pages sync",
            Operation::SyncAll => "table + pages sync",
            Operation::PublishSummary => "table publish",
            Operation::PublishDetails => "pages publish",
            Operation::PublishAll => "table + pages publish",
        };
        f.write_str(s)
    }
}

/// Outcome of an individual document write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum WriteResult {
    /// Document was written.
    Written { document: DocumentId },
    /// Dry-run mode: the document *would* have been written.
    WouldWrite { document: DocumentId },
}

impl WriteResult {
    pub fn document(&self) -> &DocumentId {
        match self {
            WriteResult::Written { document } | WriteResult::WouldWrite { document } => document,
        }
    }
}

/// Informational follow-up for the operator. Never an error.
///
/// Serialized as its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The source has no bespoke layout; output went to a default location.
    DefaultLayout { source: SourceName, location: String },
    /// The summary was regenerated but linked detail documents were not.
    StaleDetailDocuments { source: SourceName },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::DefaultLayout { source, location } => write!(
                f,
                "'{source}' uses the default layout. Go to '{location}' in the wiki to see the \
                 generated content; to change its formatting, add a dedicated layout for this source."
            ),
            Advisory::StaleDetailDocuments { source } => write!(
                f,
                "'{source}' has linked detail pages. Run a pages sync to update them."
            ),
        }
    }
}

impl Serialize for Advisory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Caller feedback for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub source: SourceName,
    pub operation: Operation,
    /// Sync: dirty records found (table) or detail documents regenerated
    /// (pages). Publish: records rendered.
    pub records_processed: usize,
    /// Records whose acknowledgment was issued, in issue order.
    pub acknowledged: Vec<RecordId>,
    pub documents: Vec<WriteResult>,
    pub advisories: Vec<Advisory>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
}

impl SyncResult {
    fn new(source: &Source, operation: Operation, dry_run: bool) -> Self {
        SyncResult {
            source: source.name().clone(),
            operation,
            records_processed: 0,
            acknowledged: Vec::new(),
            documents: Vec::new(),
            advisories: Vec::new(),
            dry_run,
            started_at: Utc::now(),
        }
    }

    fn advise(&mut self, advisory: Advisory) {
        tracing::warn!("{advisory}");
        self.advisories.push(advisory);
    }
}

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

/// Runs sync and publish operations against one record store and one
/// document store.
pub struct Synchronizer<'a> {
    records: &'a dyn RecordStore,
    documents: &'a dyn DocumentStore,
    marker: DirtyMarker,
    options: SyncOptions,
}

impl<'a> Synchronizer<'a> {
    pub fn new(
        records: &'a dyn RecordStore,
        documents: &'a dyn DocumentStore,
        marker: DirtyMarker,
        options: SyncOptions,
    ) -> Self {
        Synchronizer {
            records,
            documents,
            marker,
            options,
        }
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    fn acknowledge_first(&self) -> bool {
        self.options.acknowledge == AckOrdering::BeforeWrite
    }

    // -- update mode --------------------------------------------------------

    /// Regenerate the summary document if any record is dirty.
    pub fn sync_summary_document(&self, source: &Source) -> Result<SyncResult, SyncError> {
        let mut result = SyncResult::new(source, Operation::SyncSummary, self.options.dry_run);
        let dirty = self.scan(source, &mut result)?;
        result.records_processed = dirty.len();

        if !dirty.is_empty() {
            self.write_summary(source, &mut result)?;
            if !self.acknowledge_first() {
                for record in &dirty {
                    self.acknowledge(source, &record.id, &mut result)?;
                }
            }
            if source.has_linked_documents() {
                result.advise(Advisory::StaleDetailDocuments {
                    source: source.name().clone(),
                });
            }
        } else {
            tracing::debug!(source = %source.name(), "no dirty records; summary left alone");
        }

        if !source.is_known() {
            result.advise(default_layout(source, source.summary_document().to_string()));
        }
        Ok(result)
    }

    /// Regenerate the detail document of every dirty record.
    ///
    /// On a non-empty dirty set the source's snapshot is narrowed to it.
    pub fn sync_detail_documents(&self, source: &mut Source) -> Result<SyncResult, SyncError> {
        let mut result = SyncResult::new(source, Operation::SyncDetails, self.options.dry_run);
        let dirty = self.scan(source, &mut result)?;

        if !dirty.is_empty() {
            source.replace_records(dirty);
            for (record, document) in source.records().iter().zip(detail_documents(source)) {
                if self.write_detail(source, record, document, &mut result)? {
                    result.records_processed += 1;
                }
                if !self.acknowledge_first() {
                    self.acknowledge(source, &record.id, &mut result)?;
                }
            }
        }

        if !source.is_known() {
            result.advise(default_layout(source, detail_location(source)));
        }
        Ok(result)
    }

    /// Regenerate the summary and every dirty record's detail document,
    /// acknowledging each dirty record once.
    pub fn sync_all_documents(&self, source: &mut Source) -> Result<SyncResult, SyncError> {
        let mut result = SyncResult::new(source, Operation::SyncAll, self.options.dry_run);
        let dirty = self.scan(source, &mut result)?;
        result.records_processed = dirty.len();

        if !dirty.is_empty() {
            self.write_summary(source, &mut result)?;
            source.replace_records(dirty);
            for (record, document) in source.records().iter().zip(detail_documents(source)) {
                self.write_detail(source, record, document, &mut result)?;
                if !self.acknowledge_first() {
                    self.acknowledge(source, &record.id, &mut result)?;
                }
            }
        }

        if !source.is_known() {
            result.advise(default_layout(source, source.summary_document().to_string()));
            result.advise(default_layout(source, detail_location(source)));
        }
        Ok(result)
    }

    // -- create mode --------------------------------------------------------

    /// Render and write the summary document regardless of dirty state.
    pub fn publish_summary_document(&self, source: &Source) -> Result<SyncResult, SyncError> {
        let mut result = SyncResult::new(source, Operation::PublishSummary, self.options.dry_run);
        self.write_summary(source, &mut result)?;
        result.records_processed = source.records().len();
        if !source.is_known() {
            result.advise(default_layout(source, source.summary_document().to_string()));
        }
        Ok(result)
    }

    /// Render and write the detail document of every record that has one.
    pub fn publish_detail_documents(&self, source: &Source) -> Result<SyncResult, SyncError> {
        let mut result = SyncResult::new(source, Operation::PublishDetails, self.options.dry_run);
        for (record, document) in source.records().iter().zip(detail_documents(source)) {
            if self.write_detail(source, record, document, &mut result)? {
                result.records_processed += 1;
            }
        }
        if !source.is_known() {
            result.advise(default_layout(source, detail_location(source)));
        }
        Ok(result)
    }

    /// Publish the summary and all detail documents.
    pub fn publish_all_documents(&self, source: &Source) -> Result<SyncResult, SyncError> {
        let mut result = SyncResult::new(source, Operation::PublishAll, self.options.dry_run);
        self.write_summary(source, &mut result)?;
        for (record, document) in source.records().iter().zip(detail_documents(source)) {
            self.write_detail(source, record, document, &mut result)?;
        }
        result.records_processed = source.records().len();
        if !source.is_known() {
            result.advise(default_layout(source, source.summary_document().to_string()));
            result.advise(default_layout(source, detail_location(source)));
        }
        Ok(result)
    }

    // -- steps --------------------------------------------------------------

    /// Collect dirty records, acknowledging each on discovery when the
    /// ordering says so.
    fn scan(&self, source: &Source, result: &mut SyncResult) -> Result<Vec<Record>, SyncError> {
        let mut dirty = Vec::new();
        for record in source.records().iter().filter(|r| r.is_dirty()) {
            tracing::debug!(source = %source.name(), record = %record.id, "dirty record");
            if self.acknowledge_first() {
                self.acknowledge(source, &record.id, result)?;
            }
            dirty.push(record.clone());
        }
        Ok(dirty)
    }

    fn acknowledge(
        &self,
        source: &Source,
        record: &RecordId,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        if self.options.dry_run {
            tracing::info!("[dry-run] would acknowledge: {record}");
            return Ok(());
        }
        let binding = source.binding();
        self.records
            .update_field(
                &binding.container,
                &binding.table,
                record,
                self.marker.field(),
                self.marker.cleared_value(),
            )
            .map_err(|e| SyncError::Acknowledge {
                table: binding.table.clone(),
                record: record.clone(),
                source: e,
            })?;
        tracing::info!("acknowledged: {record}");
        result.acknowledged.push(record.clone());
        Ok(())
    }

    fn write_summary(&self, source: &Source, result: &mut SyncResult) -> Result<(), SyncError> {
        let markup = source.strategy().render_summary(source.records())?;
        self.write(source.summary_document(), &markup, result)
    }

    /// Returns `false` when the record writes no detail document.
    fn write_detail(
        &self,
        source: &Source,
        record: &Record,
        document: Option<DocumentId>,
        result: &mut SyncResult,
    ) -> Result<bool, SyncError> {
        let Some(document) = document else {
            tracing::debug!(record = %record.id, "no detail document for record");
            return Ok(false);
        };
        let markup = source.strategy().render_detail(record)?;
        self.write(&document, &markup, result)?;
        Ok(true)
    }

    fn write(
        &self,
        document: &DocumentId,
        markup: &str,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        if self.options.dry_run {
            tracing::info!("[dry-run] would write: {document}");
            result.documents.push(WriteResult::WouldWrite {
                document: document.clone(),
            });
            return Ok(());
        }
        self.documents
            .write_document(document, markup)
            .map_err(|e| SyncError::Write {
                document: document.clone(),
                source: e,
            })?;
        tracing::info!("wrote: {document}");
        result.documents.push(WriteResult::Written {
            document: document.clone(),
        });
        Ok(())
    }
}

fn default_layout(source: &Source, location: String) -> Advisory {
    Advisory::DefaultLayout {
        source: source.name().clone(),
        location,
    }
}

/// Detail document of each record in the snapshot, in snapshot order.
/// Only the last record mapping to a given document keeps it.
fn detail_documents(source: &Source) -> Vec<Option<DocumentId>> {
    let mut seen = HashSet::new();
    let mut documents: Vec<Option<DocumentId>> = source
        .records()
        .iter()
        .rev()
        .map(|record| {
            let document = source.strategy().detail_document_id(record)?;
            if seen.insert(document.clone()) {
                Some(document)
            } else {
                tracing::warn!(
                    record = %record.id,
                    %document,
                    "detail document is shared with a later record; skipped"
                );
                None
            }
        })
        .collect();
    documents.reverse();
    documents
}

fn detail_location(source: &Source) -> String {
    source.detail_namespace().unwrap_or_default().to_string()
}
