//! Error types for gridsql-harness.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the harness configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("cannot read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the file path and serde_yaml's line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`, so `~/.gridsql/` cannot be located.
    #[error("cannot determine home directory; set $HOME or pass --config")]
    HomeNotFound,

    /// The configuration parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A scenario name that is neither `locator`, `registry`, `0` nor `1`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown example '{0}': expected locator, registry, 0 or 1")]
pub struct UnknownScenario(pub String);
