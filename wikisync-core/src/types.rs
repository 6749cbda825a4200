//! Domain types shared by every wikisync crate.
//!
//! Identifiers are newtypes over `String`; record fields are kept as raw
//! `serde_json::Value`s because the remote schema is owned by the data source.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a data source (the remote table name, also the dispatch key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceName(pub String);

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque identifier of a record, unique within its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque handle to the remote container (base) holding a source's table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ContainerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContainerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a generated document in the document store (e.g. `tables:tools`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Dirty tracking
// ---------------------------------------------------------------------------

/// Field-name → value mapping of a single record.
pub type Fields = BTreeMap<String, Value>;

/// Change state of a record as fetched from the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DirtyState {
    #[default]
    Clean,
    Dirty,
}

/// The designated field whose truthy presence marks a record as dirty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirtyMarker(pub String);

impl Default for DirtyMarker {
    fn default() -> Self {
        Self("Modified".to_string())
    }
}

impl DirtyMarker {
    pub fn field(&self) -> &str {
        &self.0
    }

    /// Remove the marker from `fields` and report the state it encoded.
    pub fn extract(&self, fields: &mut Fields) -> DirtyState {
        match fields.remove(&self.0) {
            Some(v) if is_truthy(&v) => DirtyState::Dirty,
            _ => DirtyState::Clean,
        }
    }

    /// Value written back to the remote store to acknowledge a record.
    pub fn cleared_value(&self) -> Value {
        Value::Bool(false)
    }
}

/// Truthiness of a remote field value: `false`, `null`, `0`, `""`, `[]` and
/// `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One remote record, snapshotted at the start of a sync cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dirty: DirtyState,
}

impl Record {
    /// Build a record from raw remote fields, consuming the dirty marker.
    pub fn from_remote(id: impl Into<RecordId>, mut fields: Fields, marker: &DirtyMarker) -> Self {
        let dirty = marker.extract(&mut fields);
        Record {
            id: id.into(),
            fields,
            created_time: None,
            dirty,
        }
    }

    pub fn with_created_time(mut self, at: DateTime<Utc>) -> Self {
        self.created_time = Some(at);
        self
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty == DirtyState::Dirty
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// `true` when `field` is present with a truthy value (checkbox columns).
    pub fn has(&self, field: &str) -> bool {
        self.fields.get(field).map(is_truthy).unwrap_or(false)
    }

    /// Display text of `field`; arrays are joined with `", "`, missing is empty.
    pub fn text(&self, field: &str) -> String {
        self.fields.get(field).map(value_text).unwrap_or_default()
    }

    /// First element of an array field (or the scalar itself).
    pub fn first_text(&self, field: &str) -> String {
        match self.fields.get(field) {
            Some(Value::Array(items)) => items.first().map(value_text).unwrap_or_default(),
            Some(v) => value_text(v),
            None => String::new(),
        }
    }

    /// Elements of an array field as text; scalars yield a single element.
    pub fn list(&self, field: &str) -> Vec<String> {
        match self.fields.get(field) {
            Some(Value::Array(items)) => items.iter().map(value_text).collect(),
            Some(Value::Null) | None => vec![],
            Some(v) => vec![value_text(v)],
        }
    }
}

/// Plain-text rendering of a JSON value as it appears in generated markup.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Strategy dispatch tags
// ---------------------------------------------------------------------------

/// Closed set of document layouts; `Generic` is the fallback for unknown sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    Generic,
    Tools,
    Companies,
    Papers,
    Experiments,
    ThirdSector,
}

impl StrategyKind {
    /// All variants in a stable order.
    pub fn all() -> &'static [StrategyKind] {
        &[
            StrategyKind::Generic,
            StrategyKind::Tools,
            StrategyKind::Companies,
            StrategyKind::Papers,
            StrategyKind::Experiments,
            StrategyKind::ThirdSector,
        ]
    }

    /// Whether per-record detail documents are linked from the summary document.
    pub fn has_linked_documents(&self) -> bool {
        match self {
            StrategyKind::Generic
            | StrategyKind::Tools
            | StrategyKind::Companies
            | StrategyKind::Papers => true,
            StrategyKind::Experiments | StrategyKind::ThirdSector => false,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Generic => write!(f, "generic"),
            StrategyKind::Tools => write!(f, "tools"),
            StrategyKind::Companies => write!(f, "companies"),
            StrategyKind::Papers => write!(f, "papers"),
            StrategyKind::Experiments => write!(f, "experiments"),
            StrategyKind::ThirdSector => write!(f, "third-sector"),
        }
    }
}

// ---------------------------------------------------------------------------
// Source binding
// ---------------------------------------------------------------------------

/// Registry-resolved addressing and layout of one data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceBinding {
    pub name: SourceName,
    pub kind: StrategyKind,
    pub container: ContainerId,
    /// Table name inside the container.
    pub table: String,
    pub summary_document: DocumentId,
    /// Prefix of detail document ids; `None` when the layout has no detail pages.
    pub detail_namespace: Option<String>,
    /// `false` when the name fell through to the generic layout.
    pub known: bool,
}

impl SourceBinding {
    pub fn has_linked_documents(&self) -> bool {
        self.kind.has_linked_documents()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
