//! `gridsql model`: print the descriptor an example connects with.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gridsql_harness::{model_for, Scenario};

use super::load_config;

/// Arguments for `gridsql model`.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Example whose model to print: locator (0) or registry (1).
    pub scenario: Scenario,

    /// Harness config file (default: ~/.gridsql/harness.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ModelArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let model = model_for(&config, self.scenario);
        println!(
            "{}",
            model.to_json_pretty().context("failed to encode model")?
        );
        Ok(())
    }
}
