//! `gridsql run`: one example, one line per result row.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use gridsql_harness::{EmbeddedGrid, Scenario};

use super::load_config;

/// Arguments for `gridsql run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Example to run: locator (0) or registry (1).
    pub scenario: Scenario,

    /// Harness config file (default: ~/.gridsql/harness.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit the full report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Do not start the embedded grid; the locator is unreachable.
    #[arg(long)]
    pub offline: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let grid = if self.offline {
            EmbeddedGrid::offline()
        } else {
            EmbeddedGrid::start(&config)
        };

        tracing::info!(scenario = %self.scenario, offline = self.offline, "example starting");
        let report = grid
            .harness(config)
            .run(self.scenario)
            .with_context(|| format!("example '{}' failed", self.scenario))?;
        tracing::info!(
            scenario = %self.scenario,
            rows = report.lines.len(),
            "example finished",
        );

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
            return Ok(());
        }
        for line in &report.lines {
            println!("{line}");
        }
        eprintln!(
            "{} {} example: {} row(s)",
            "■".green().bold(),
            self.scenario,
            report.lines.len()
        );
        Ok(())
    }
}
