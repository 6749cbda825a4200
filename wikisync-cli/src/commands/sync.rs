//! `wikisync sync` / `wikisync publish`: regenerate wiki pages of a source.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use wikisync_core::{config, SourceRegistry};
use wikisync_renderer::TemplateEngine;
use wikisync_sync::{
    open_source, pipeline, Mode, Operation, Resource, SyncOptions, SyncResult, Synchronizer,
    WriteResult,
};

use crate::clients::{AirtableClient, DokuWikiClient};

/// Arguments shared by `wikisync sync` and `wikisync publish`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Deployment environment from the config (e.g. `official`, `test`).
    pub environment: String,

    /// Name of the remote table.
    pub source: String,

    /// Documents to regenerate: table, pages or both.
    #[arg(long, default_value_t = Resource::Table)]
    pub resource: Resource,

    /// Show what would be written without acknowledging or writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Config file (default: ~/.wikisync/config.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SyncArgs {
    pub fn run(self, mode: Mode) -> Result<()> {
        let path = super::config_path(self.config.as_deref())?;
        let cfg = config::load_at(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        let env = cfg
            .environment(&self.environment)
            .with_context(|| format!("check the environments in {}", path.display()))?;

        let lookup = |var: &str| std::env::var(var).ok();
        let api_key = cfg
            .record_store
            .api_key(lookup)
            .context("record store credentials missing")?;
        let password = env.password(lookup).context("wiki credentials missing")?;

        let records = Arc::new(AirtableClient::new(
            &cfg.record_store,
            api_key,
            cfg.dirty_field.clone(),
        ));
        let documents = DokuWikiClient::new(env, &password);

        let engine = TemplateEngine::new(cfg.template_dir.as_deref())
            .context("failed to load templates")?;
        let registry = SourceRegistry::new(&cfg);
        let options = SyncOptions {
            acknowledge: cfg.acknowledge,
            dry_run: self.dry_run,
        };
        let session = Synchronizer::new(
            records.as_ref(),
            &documents,
            cfg.dirty_field.clone(),
            options,
        );

        let mut source = open_source(&registry, Arc::new(engine), records.clone(), &self.source)
            .with_context(|| format!("failed to load '{}'", self.source))?;
        let result = pipeline::run(&session, &mut source, mode, self.resource)
            .with_context(|| format!("{} failed for '{}'", self.resource, self.source))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&[&result])
                    .context("failed to serialize sync result")?
            );
        } else {
            print_result(&result);
        }
        Ok(())
    }
}

fn print_result(result: &SyncResult) {
    let prefix = if result.dry_run { "[dry-run] " } else { "" };
    let counted = match result.operation {
        Operation::SyncSummary | Operation::SyncAll => "dirty records",
        Operation::SyncDetails => "pages regenerated",
        Operation::PublishSummary | Operation::PublishDetails | Operation::PublishAll => "records",
    };
    let verb = if result.dry_run { "would write" } else { "written" };

    println!(
        "{prefix}{} '{}' ({}) — {} {counted}, {} documents {verb}",
        "✓".green(),
        result.source,
        result.operation,
        result.records_processed,
        result.documents.len(),
    );
    for r in &result.documents {
        match r {
            WriteResult::Written { document } => println!("  ✎  {document}"),
            WriteResult::WouldWrite { document } => println!("  ~  {document}"),
        }
    }
    for advisory in &result.advisories {
        println!("{}", format!("  ! {advisory}").yellow());
    }
}
