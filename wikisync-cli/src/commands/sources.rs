//! `wikisync sources`: list sources with a dedicated layout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use wikisync_core::{config, SourceRegistry};

/// Arguments for `wikisync sources`.
#[derive(Args, Debug)]
pub struct SourcesArgs {
    /// Config file (default: ~/.wikisync/config.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "source")]
    name: String,
    #[tabled(rename = "layout")]
    layout: String,
    #[tabled(rename = "container")]
    container: String,
    #[tabled(rename = "table page")]
    summary: String,
    #[tabled(rename = "detail pages")]
    details: String,
}

impl SourcesArgs {
    pub fn run(self) -> Result<()> {
        let path = super::config_path(self.config.as_deref())?;
        let cfg = config::load_at(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        let registry = SourceRegistry::new(&cfg);

        let rows: Vec<SourceRow> = registry
            .known_sources()
            .iter()
            .map(|known| {
                let binding = registry.resolve(known.name);
                SourceRow {
                    name: binding.name.to_string(),
                    layout: binding.kind.to_string(),
                    container: binding.container.to_string(),
                    summary: binding.summary_document.to_string(),
                    details: binding
                        .detail_namespace
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                }
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!(
            "Any other table name uses the generic layout, writing to '{}' and '{}'.",
            cfg.default_summary_document, cfg.default_detail_namespace
        );
        Ok(())
    }
}
