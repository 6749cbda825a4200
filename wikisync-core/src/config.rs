//! YAML configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.wikisync/
//!   config.yaml   (mode 0600)
//! ```
//!
//! Secrets never live in the file: environments name the variables that hold
//! them, and callers resolve those through an injected lookup so tests never
//! touch the process environment.
//!
//! # API pattern
//!
//! Filesystem functions come in two forms, as elsewhere in the workspace:
//! - `fn_at(path: &Path, …)`: explicit location; used in tests with `TempDir`
//! - `fn(…)`: derives the location from `dirs::home_dir()`, delegates to `_at`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{ContainerId, DirtyMarker, DocumentId};

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// When the acknowledgment of a dirty record is sent relative to the write of
/// the document that covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AckOrdering {
    /// Acknowledge each dirty record as soon as it is discovered.
    #[default]
    BeforeWrite,
    /// Acknowledge a record only after its covering document was written.
    AfterWrite,
}

/// One deployment target of the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub wiki_url: String,
    pub username: String,
    /// Name of the variable holding the wiki password.
    pub password_env: String,
    /// Minimum pause between two document writes.
    #[serde(default)]
    pub write_interval_secs: u64,
}

impl Environment {
    pub fn write_interval(&self) -> Duration {
        Duration::from_secs(self.write_interval_secs)
    }

    pub fn password(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        resolve_secret(&self.password_env, lookup)
    }
}

/// Remote record-store endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordStoreConfig {
    pub api_url: String,
    /// Name of the variable holding the API key.
    pub api_key_env: String,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        RecordStoreConfig {
            api_url: "https://api.airtable.com/v0".to_string(),
            api_key_env: "AIRTABLE_API_KEY".to_string(),
        }
    }
}

impl RecordStoreConfig {
    pub fn api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        resolve_secret(&self.api_key_env, lookup)
    }
}

/// Root of `config.yaml`. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environments: BTreeMap<String, Environment>,
    pub record_store: RecordStoreConfig,
    /// Container used for sources without a built-in or configured one.
    pub default_container: ContainerId,
    /// Summary document for sources without a bespoke layout.
    pub default_summary_document: DocumentId,
    /// Detail namespace for sources without a bespoke layout.
    pub default_detail_namespace: String,
    /// Per-source container overrides.
    pub containers: BTreeMap<String, ContainerId>,
    pub dirty_field: DirtyMarker,
    pub acknowledge: AckOrdering,
    /// Directory of `*.tera` files overriding the built-in layouts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            environments: BTreeMap::new(),
            record_store: RecordStoreConfig::default(),
            default_container: ContainerId::from("appBzOSifwBqSuVfH"),
            default_summary_document: DocumentId::from("tables:test"),
            default_detail_namespace: "test:".to_string(),
            containers: BTreeMap::new(),
            dirty_field: DirtyMarker::default(),
            acknowledge: AckOrdering::default(),
            template_dir: None,
        }
    }
}

impl Config {
    /// Defaults plus the two stock environments, written by `wikisync init`.
    pub fn starter() -> Self {
        let mut config = Config::default();
        config.environments.insert(
            "official".to_string(),
            Environment {
                wiki_url: "http://innovationsinfundraising.org/".to_string(),
                username: "admin".to_string(),
                password_env: "DOKUWIKI_PASS".to_string(),
                write_interval_secs: 5,
            },
        );
        config.environments.insert(
            "test".to_string(),
            Environment {
                wiki_url: "http://localhost/dokuwiki".to_string(),
                username: "admin".to_string(),
                password_env: "DOKUWIKI_PASS_TEST".to_string(),
                write_interval_secs: 0,
            },
        );
        config
    }

    /// Select a deployment environment by name.
    pub fn environment(&self, name: &str) -> Result<&Environment, ConfigError> {
        self.environments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnvironment {
                name: name.to_string(),
                known: self.environments.keys().cloned().collect(),
            })
    }
}

fn resolve_secret(
    var: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    match lookup(var) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingSecret {
            var: var.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.wikisync/config.yaml`: pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".wikisync").join("config.yaml")
}

/// `default_path_at` convenience wrapper.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    Ok(default_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load the config at `path`. A missing file yields [`Config::default`].
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// `load_at` convenience wrapper for the default location.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&default_path()?)
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically write `config` to `path`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// Refuses to replace an existing file unless `force` is set.
pub fn save_at(path: &Path, config: &Config, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp_path = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
