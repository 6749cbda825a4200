//! Collaborator contracts: the remote record store and the document store.
//!
//! Both are blocking and are called strictly sequentially. Implementations
//! must not retry on the caller's behalf.

use serde_json::Value;

use wikisync_core::{ContainerId, DocumentId, Record, RecordId};

/// Error type returned by collaborators.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Remote tabular data source.
pub trait RecordStore {
    /// All records of `table` in `container`, in remote order.
    fn fetch_records(&self, container: &ContainerId, table: &str) -> Result<Vec<Record>, StoreError>;

    /// One record by id. Used to follow linked-record columns, so `table` is
    /// the table the link was found in.
    fn fetch_record(
        &self,
        container: &ContainerId,
        table: &str,
        record: &RecordId,
    ) -> Result<Record, StoreError>;

    /// Set one field of one record.
    fn update_field(
        &self,
        container: &ContainerId,
        table: &str,
        record: &RecordId,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError>;
}

/// Target of generated documents. Writes are full overwrites.
pub trait DocumentStore {
    fn write_document(&self, document: &DocumentId, markup: &str) -> Result<(), StoreError>;
}
