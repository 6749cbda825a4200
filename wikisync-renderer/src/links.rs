//! Linked-record columns.
//!
//! The record store hands out linked records as bare ids (`rec…`). Layouts
//! that show them look each id up through a [`LinkResolver`] and render a
//! column of the linked record instead: a category name, a paper title, a
//! contributor. Without a resolver the raw id is shown.

use std::collections::HashMap;
use std::sync::Mutex;

use wikisync_core::{Record, RecordId};

use crate::error::RenderError;

/// Error type returned by resolvers.
pub type LinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Looks up the record a linked-record id points to.
pub trait LinkResolver {
    /// `Ok(None)` when lookups are unavailable; callers fall back to the id.
    fn linked_record(&self, id: &RecordId) -> Result<Option<Record>, LinkError>;
}

/// Resolver that never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unresolved;

impl LinkResolver for Unresolved {
    fn linked_record(&self, _id: &RecordId) -> Result<Option<Record>, LinkError> {
        Ok(None)
    }
}

/// Memoizes another resolver so every id is looked up at most once.
pub struct LinkCache<R> {
    inner: R,
    seen: Mutex<HashMap<RecordId, Option<Record>>>,
}

impl<R: LinkResolver> LinkCache<R> {
    pub fn new(inner: R) -> Self {
        LinkCache {
            inner,
            seen: Mutex::new(HashMap::new()),
        }
    }
}

impl<R: LinkResolver> LinkResolver for LinkCache<R> {
    fn linked_record(&self, id: &RecordId) -> Result<Option<Record>, LinkError> {
        if let Some(hit) = self.seen.lock().ok().and_then(|seen| seen.get(id).cloned()) {
            return Ok(hit);
        }
        let found = self.inner.linked_record(id)?;
        if let Ok(mut seen) = self.seen.lock() {
            seen.insert(id.clone(), found.clone());
        }
        Ok(found)
    }
}

// ---------------------------------------------------------------------------
// Linked items
// ---------------------------------------------------------------------------

/// One entry of a linked-record column.
#[derive(Debug, Clone)]
pub struct Linked {
    pub id: RecordId,
    pub record: Option<Record>,
}

impl Linked {
    /// `column` of the linked record, or the raw id when it was not resolved.
    pub fn text(&self, column: &str) -> String {
        match &self.record {
            Some(record) => record.text(column).trim_end().to_string(),
            None => self.id.0.clone(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.record.is_some()
    }
}

/// Every record linked from `field` of `record`, in column order.
pub fn linked(
    links: &dyn LinkResolver,
    record: &Record,
    field: &str,
) -> Result<Vec<Linked>, RenderError> {
    record
        .list(field)
        .into_iter()
        .filter(|id| !id.is_empty())
        .map(|id| {
            let id = RecordId(id);
            let found = links
                .linked_record(&id)
                .map_err(|source| RenderError::Link {
                    id: id.clone(),
                    source,
                })?;
            Ok(Linked { id, record: found })
        })
        .collect()
}

/// `column` of every record linked from `field`, skipping empty values.
pub fn names(
    links: &dyn LinkResolver,
    record: &Record,
    field: &str,
    column: &str,
) -> Result<Vec<String>, RenderError> {
    Ok(linked(links, record, field)?
        .iter()
        .map(|l| l.text(column))
        .filter(|s| !s.is_empty())
        .collect())
}

/// [`names`] joined with `", "`.
pub fn joined_names(
    links: &dyn LinkResolver,
    record: &Record,
    field: &str,
    column: &str,
) -> Result<String, RenderError> {
    Ok(names(links, record, field, column)?.join(", "))
}
