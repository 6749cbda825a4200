//! Error types for wikisync-renderer.

use std::path::PathBuf;

use thiserror::Error;

use wikisync_core::{RecordId, StrategyKind};

use crate::links::LinkError;

/// All errors that can arise from document rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// Detail rendering requested from a layout that has no detail pages.
    #[error("the {kind} layout has no detail documents")]
    NoDetailLayout { kind: StrategyKind },

    /// Looking up a linked record failed.
    #[error("failed to look up linked record {id}: {source}")]
    Link {
        id: RecordId,
        #[source]
        source: LinkError,
    },
}
