//! Shared entrypoint used by the CLI: open a source, then dispatch
//! mode × resource to the matching synchronizer operation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use wikisync_core::SourceRegistry;
use wikisync_renderer::{LinkCache, TemplateEngine, TemplateStrategy};

use crate::error::SyncError;
use crate::links::StoreLinks;
use crate::source::Source;
use crate::store::RecordStore;
use crate::synchronizer::{SyncResult, Synchronizer};

/// Create regenerates everything; update follows the dirty flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Create,
    Update,
}

/// Which documents an operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// The summary document.
    #[default]
    Table,
    /// The per-record detail documents.
    Pages,
    Both,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Table => "table",
            Resource::Pages => "pages",
            Resource::Both => "both",
        })
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Resource::Table),
            "pages" => Ok(Resource::Pages),
            "both" => Ok(Resource::Both),
            other => Err(format!(
                "unknown resource '{other}' (expected table, pages or both)"
            )),
        }
    }
}

/// Resolve `name`, bind its template strategy and fetch its records.
///
/// Linked-record columns are looked up lazily through `records` while
/// rendering, at most once per id for the lifetime of the source.
pub fn open_source(
    registry: &SourceRegistry,
    engine: Arc<TemplateEngine>,
    records: Arc<dyn RecordStore>,
    name: &str,
) -> Result<Source, SyncError> {
    let binding = registry.resolve(name);
    if !binding.known {
        tracing::debug!(source = name, "no dedicated layout; using the generic one");
    }
    let links = StoreLinks::new(records.clone(), binding.container.clone(), binding.table.clone());
    let strategy = TemplateStrategy::for_binding(engine, &binding)
        .with_links(Arc::new(LinkCache::new(links)));
    Source::load(binding, Box::new(strategy), records.as_ref())
}

/// Run one operation on an opened source.
pub fn run(
    session: &Synchronizer<'_>,
    source: &mut Source,
    mode: Mode,
    resource: Resource,
) -> Result<SyncResult, SyncError> {
    match (mode, resource) {
        (Mode::Update, Resource::Table) => session.sync_summary_document(source),
        (Mode::Update, Resource::Pages) => session.sync_detail_documents(source),
        (Mode::Update, Resource::Both) => session.sync_all_documents(source),
        (Mode::Create, Resource::Table) => session.publish_summary_document(source),
        (Mode::Create, Resource::Pages) => session.publish_detail_documents(source),
        (Mode::Create, Resource::Both) => session.publish_all_documents(source),
    }
}
