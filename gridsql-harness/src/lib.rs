//! # gridsql-harness
//!
//! Runs the cache bootstrap examples end to end.
//!
//! Build a [`Harness`] from a [`HarnessConfig`] and its collaborators (or let
//! [`EmbeddedGrid`] provide them) and call [`Harness::run`] with a [`Scenario`].

pub mod config;
pub mod embedded;
pub mod error;
pub mod format;
pub mod scenario;
pub mod scope;

pub use config::HarnessConfig;
pub use embedded::EmbeddedGrid;
pub use error::{ConfigError, UnknownScenario};
pub use format::format_row;
pub use scenario::{model_for, Harness, Scenario, ScenarioReport, ScenarioState};
pub use scope::{RegistryBinding, ScenarioScope};
