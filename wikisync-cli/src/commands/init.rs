//! `wikisync init`: write a starter config.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use wikisync_core::{config, Config};

/// Arguments for `wikisync init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the config (default: ~/.wikisync/config.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Replace an existing config file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let path = super::config_path(self.config.as_deref())?;
        config::save_at(&path, &Config::starter(), self.force)
            .with_context(|| format!("failed to write config to {}", path.display()))?;

        println!("{} wrote {}", "✓".green(), path.display());
        println!("  Set the variables named by `password_env` and `record_store.api_key_env`");
        println!("  before running `wikisync sync`.");
        Ok(())
    }
}
