pub mod compare;
pub mod model;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};

use gridsql_harness::{config, HarnessConfig};

/// `--config` when given, else `~/.gridsql/harness.yaml`, else the defaults.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<HarnessConfig> {
    let config = config::resolve(explicit).with_context(|| match explicit {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "failed to load ~/.gridsql/harness.yaml".to_string(),
    })?;
    tracing::debug!(
        explicit = explicit.is_some(),
        locator = %config.locator_config().address(),
        "config loaded",
    );
    Ok(config)
}
