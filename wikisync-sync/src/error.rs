//! Error types for wikisync-sync.

use thiserror::Error;

use wikisync_core::{ContainerId, DocumentId, RecordId};
use wikisync_renderer::RenderError;

use crate::store::StoreError;

/// All errors that can arise from sync operations.
///
/// Collaborator failures are carried as-is in `source`; the variant only
/// records which step failed and on what.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the document strategy.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Loading the record snapshot failed.
    #[error("failed to fetch records of '{table}' from {container}: {source}")]
    Fetch {
        container: ContainerId,
        table: String,
        #[source]
        source: StoreError,
    },

    /// Clearing a record's dirty marker failed.
    #[error("failed to acknowledge record {record} of '{table}': {source}")]
    Acknowledge {
        table: String,
        record: RecordId,
        #[source]
        source: StoreError,
    },

    /// Writing a document failed.
    #[error("failed to write document {document}: {source}")]
    Write {
        document: DocumentId,
        #[source]
        source: StoreError,
    },
}
