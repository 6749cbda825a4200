pub mod init;
pub mod sources;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// `--config` if given, else `~/.wikisync/config.yaml`.
pub(crate) fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => wikisync_core::config::default_path().context("could not locate config file"),
    }
}
