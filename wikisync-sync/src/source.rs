//! A resolved source bound to its strategy and its current record snapshot.

use wikisync_core::{DocumentId, Record, SourceBinding, SourceName};
use wikisync_renderer::DocumentStrategy;

use crate::error::SyncError;
use crate::store::RecordStore;

/// One data source for the duration of a sync session. Never persisted.
pub struct Source {
    binding: SourceBinding,
    strategy: Box<dyn DocumentStrategy>,
    records: Vec<Record>,
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("binding", &self.binding)
            .field("strategy", &self.strategy.kind())
            .field("records", &self.records.len())
            .finish()
    }
}

impl Source {
    pub fn new(
        binding: SourceBinding,
        strategy: Box<dyn DocumentStrategy>,
        records: Vec<Record>,
    ) -> Self {
        Source {
            binding,
            strategy,
            records,
        }
    }

    /// Fetch the record snapshot for `binding` and bind it to `strategy`.
    pub fn load(
        binding: SourceBinding,
        strategy: Box<dyn DocumentStrategy>,
        store: &dyn RecordStore,
    ) -> Result<Self, SyncError> {
        let records = store
            .fetch_records(&binding.container, &binding.table)
            .map_err(|source| SyncError::Fetch {
                container: binding.container.clone(),
                table: binding.table.clone(),
                source,
            })?;
        tracing::debug!(
            source = %binding.name,
            records = records.len(),
            dirty = records.iter().filter(|r| r.is_dirty()).count(),
            "loaded record snapshot"
        );
        Ok(Source::new(binding, strategy, records))
    }

    pub fn name(&self) -> &SourceName {
        &self.binding.name
    }

    pub fn binding(&self) -> &SourceBinding {
        &self.binding
    }

    pub fn strategy(&self) -> &dyn DocumentStrategy {
        self.strategy.as_ref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Narrow the snapshot, e.g. to the dirty subset before a detail sync.
    pub fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub fn summary_document(&self) -> &DocumentId {
        &self.binding.summary_document
    }

    /// Namespace detail documents are written under, if any.
    pub fn detail_namespace(&self) -> Option<&str> {
        self.binding.detail_namespace.as_deref()
    }

    pub fn has_linked_documents(&self) -> bool {
        self.strategy.has_linked_documents()
    }

    /// `false` when the name fell through to the generic layout.
    pub fn is_known(&self) -> bool {
        self.binding.known
    }
}
