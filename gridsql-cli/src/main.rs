//! gridsql: run the cache bootstrap examples against an embedded grid.
//!
//! # Usage
//!
//! ```text
//! gridsql run <locator|registry|0|1> [--config <path>] [--json] [--offline]
//! gridsql model <locator|registry|0|1> [--config <path>]
//! gridsql compare [--config <path>] [--json]
//! ```
//!
//! Result entries go to stdout, logs to stderr (`RUST_LOG`, `--log-format json`).

mod commands;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{compare::CompareArgs, model::ModelArgs, run::RunArgs};
use logging::LogFormat;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "gridsql",
    version,
    about = "Run SQL over data-grid regions through locator or registry discovery",
    long_about = None,
)]
struct Cli {
    /// Log output format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one example and print its result entries.
    Run(RunArgs),

    /// Print the model descriptor an example connects with.
    Model(ModelArgs),

    /// Run both examples and check that they print the same entries.
    Compare(CompareArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_format);
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Model(args) => args.run(),
        Commands::Compare(args) => args.run(),
    }
}
