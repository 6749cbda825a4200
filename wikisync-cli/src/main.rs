//! wikisync: publish remote tables to a DokuWiki.
//!
//! # Usage
//!
//! ```text
//! wikisync sync    <environment> <source> [--resource table|pages|both] [--dry-run] [--json] [--config PATH]
//! wikisync publish <environment> <source> [--resource table|pages|both] [--dry-run] [--json] [--config PATH]
//! wikisync sources [--config PATH]
//! wikisync init    [--config PATH] [--force]
//! ```
//!
//! `-v` raises log output to `info`; `RUST_LOG` takes precedence.

mod clients;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, sources::SourcesArgs, sync::SyncArgs};
use wikisync_sync::Mode;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "wikisync",
    version,
    about = "Keep wiki pages in step with remote tables",
    long_about = None,
)]
struct Cli {
    /// Log progress (acknowledgments, writes) to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Regenerate the documents of records flagged as modified.
    Sync(SyncArgs),

    /// Regenerate every document of a source, ignoring modification flags.
    Publish(SyncArgs),

    /// List the sources that have a dedicated layout.
    Sources(SourcesArgs),

    /// Write a starter config file.
    Init(InitArgs),
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(Mode::Update),
        Commands::Publish(args) => args.run(Mode::Create),
        Commands::Sources(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}
