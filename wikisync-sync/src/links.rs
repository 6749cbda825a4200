//! Linked-record lookups through the record store.

use std::sync::Arc;

use wikisync_core::{ContainerId, Record, RecordId};
use wikisync_renderer::{LinkError, LinkResolver};

use crate::store::RecordStore;

/// Resolves linked-record ids found in one table of one container.
///
/// Wrap it in a [`wikisync_renderer::LinkCache`] so a sync fetches each
/// linked record once.
pub struct StoreLinks {
    store: Arc<dyn RecordStore>,
    container: ContainerId,
    table: String,
}

impl StoreLinks {
    pub fn new(store: Arc<dyn RecordStore>, container: ContainerId, table: impl Into<String>) -> Self {
        StoreLinks {
            store,
            container,
            table: table.into(),
        }
    }
}

impl LinkResolver for StoreLinks {
    fn linked_record(&self, id: &RecordId) -> Result<Option<Record>, LinkError> {
        tracing::trace!(record = %id, table = %self.table, "following link");
        let record = self.store.fetch_record(&self.container, &self.table, id)?;
        Ok(Some(record))
    }
}
