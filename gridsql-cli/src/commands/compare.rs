//! `gridsql compare`: both examples must print identical entries.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use gridsql_harness::{EmbeddedGrid, ScenarioReport};

use super::load_config;

/// Arguments for `gridsql compare`.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Harness config file (default: ~/.gridsql/harness.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ComparisonJson<'a> {
    identical: bool,
    reports: &'a [ScenarioReport],
}

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "example")]
    example: String,
    #[tabled(rename = "rows")]
    rows: usize,
    #[tabled(rename = "states")]
    states: usize,
}

impl CompareArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let grid = EmbeddedGrid::start(&config);
        let reports = grid
            .harness(config)
            .run_all()
            .context("an example failed")?;
        let identical = reports.windows(2).all(|pair| pair[0].lines == pair[1].lines);
        tracing::info!(examples = reports.len(), identical, "comparison finished");

        if self.json {
            let payload = ComparisonJson {
                identical,
                reports: &reports,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize comparison")?
            );
        } else {
            print_table(&reports, identical);
        }

        if !identical {
            bail!("examples printed different result entries");
        }
        Ok(())
    }
}

fn print_table(reports: &[ScenarioReport], identical: bool) {
    let rows: Vec<ComparisonRow> = reports
        .iter()
        .map(|report| ComparisonRow {
            example: report.scenario.to_string(),
            rows: report.lines.len(),
            states: report.states.len(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if identical {
        println!("{} outputs are identical", "■".green().bold());
    } else {
        println!("{} outputs differ", "■".red().bold());
    }
}
