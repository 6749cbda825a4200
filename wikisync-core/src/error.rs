//! Error types for wikisync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration loading and environment selection.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, unreadable file, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.wikisync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The requested deployment environment is not configured.
    #[error("unknown environment '{name}'; choose from: {}", display_known(.known))]
    UnknownEnvironment { name: String, known: Vec<String> },

    /// A secret named by the config is not set.
    #[error("secret variable '{var}' is not set")]
    MissingSecret { var: String },

    /// Refused to overwrite an existing config file.
    #[error("config already exists at {path}; pass --force to overwrite")]
    AlreadyExists { path: PathBuf },
}

fn display_known(known: &[String]) -> String {
    if known.is_empty() {
        "(none configured)".to_string()
    } else {
        known.join(", ")
    }
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
