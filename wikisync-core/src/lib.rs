//! wikisync core library: domain types, configuration, source registry, errors.
//!
//! - [`types`]: newtypes, [`Record`] with its dirty indicator, [`StrategyKind`]
//! - [`config`]: YAML config load / save, environment selection
//! - [`registry`]: [`SourceRegistry`]: source name → [`SourceBinding`]
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::{AckOrdering, Config, Environment, RecordStoreConfig};
pub use error::ConfigError;
pub use registry::{KnownSource, SourceRegistry, KNOWN_SOURCES};
pub use types::{
    ContainerId, DirtyMarker, DirtyState, DocumentId, Fields, Record, RecordId, SourceBinding,
    SourceName, StrategyKind,
};
