//! propstore command-line tool
//!
//! Inspects descriptor schemas and value snapshots.
//!
//! Usage:
//!   propstore schema props.json
//!   propstore normalize props.json
//!   propstore dump values.psv
//!   propstore check --schema props.json values.psv [--immediate] [--no-validation]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use propstore_engine::StoreConfig;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "propstore")]
#[command(about = "Inspect propstore schemas and value snapshots")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the descriptors of a schema file
    Schema { file: PathBuf },

    /// Print a schema file in canonical form
    Normalize { file: PathBuf },

    /// Print every entry of a value snapshot
    Dump { snapshot: PathBuf },

    /// Replay a value snapshot against a schema
    Check {
        /// Schema the snapshot is validated against
        #[arg(short, long)]
        schema: PathBuf,

        snapshot: PathBuf,

        /// Mirror writes immediately instead of staging them
        #[arg(long)]
        immediate: bool,

        /// Skip descriptor validation
        #[arg(long)]
        no_validation: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let output = match args.command {
        Command::Schema { file } => propstore_cli::describe_schema(&file)?,
        Command::Normalize { file } => propstore_cli::normalize_schema(&file)?,
        Command::Dump { snapshot } => propstore_cli::dump_snapshot(&snapshot)?,
        Command::Check {
            schema,
            snapshot,
            immediate,
            no_validation,
        } => {
            let config = StoreConfig {
                immediate_commit: immediate,
                validation: !no_validation,
            };
            let report = propstore_cli::check_snapshot(&schema, &snapshot, config)?;
            format!("{report}\n")
        }
    };
    print!("{output}");
    Ok(())
}
