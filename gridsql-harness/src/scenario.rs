//! The two bootstrap scenarios and the [`Harness`] that drives them.
//!
//! ```text
//! Uninitialized -> CacheEstablished -> ConnectionOpen -> Executing -> Draining -> TornDown
//! ```
//!
//! * **locator**: the relational connection reaches the grid through a locator
//!   address carried in the model descriptor.
//! * **registry**: a cache client is created up front, bound in a naming context,
//!   and the model descriptor names that binding instead.
//!
//! Both run the same query and must print the same lines for the same grid state.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use gridsql_core::{
    CacheClientFactory, DiscoveryConfig, Environment, GridError, ModelDescriptor,
    NamingResolver, Properties, QueryExecutor, RelationalDriver, MODEL_PROPERTY,
};
use gridsql_engine::GRID_SCHEMA_FACTORY;

use crate::config::HarnessConfig;
use crate::error::UnknownScenario;
use crate::format::format_row;
use crate::scope::{RegistryBinding, ScenarioScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Locator,
    Registry,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::Locator, Scenario::Registry];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Locator => "locator",
            Scenario::Registry => "registry",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "locator" | "0" => Ok(Scenario::Locator),
            "registry" | "1" => Ok(Scenario::Registry),
            _ => Err(UnknownScenario(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    Uninitialized,
    CacheEstablished,
    ConnectionOpen,
    Executing,
    Draining,
    TornDown,
}

/// Outcome of one successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    /// One formatted entry per result row, in row order.
    pub lines: Vec<String>,
    /// Every state visited, starting with `Uninitialized`.
    pub states: Vec<ScenarioState>,
}

struct StateTrail {
    scenario: Scenario,
    states: Vec<ScenarioState>,
}

impl StateTrail {
    fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            states: vec![ScenarioState::Uninitialized],
        }
    }

    fn enter(&mut self, state: ScenarioState) {
        tracing::debug!(scenario = %self.scenario, state = ?state, "state transition");
        self.states.push(state);
    }
}

/// Model descriptor `scenario` connects with.
pub fn model_for(config: &HarnessConfig, scenario: Scenario) -> ModelDescriptor {
    let discovery = match scenario {
        Scenario::Locator => DiscoveryConfig::Locator(config.locator_config()),
        Scenario::Registry => DiscoveryConfig::Registry(config.registry_config()),
    };
    ModelDescriptor::single(
        config.schema.clone(),
        GRID_SCHEMA_FACTORY,
        discovery,
        config.region_names(),
    )
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Composes cache factory, naming resolver and relational driver into the scenarios.
pub struct Harness {
    config: HarnessConfig,
    cache_factory: Arc<dyn CacheClientFactory>,
    naming: Arc<NamingResolver>,
    driver: Arc<dyn RelationalDriver>,
}

impl Harness {
    pub fn new(
        config: HarnessConfig,
        cache_factory: Arc<dyn CacheClientFactory>,
        naming: Arc<NamingResolver>,
        driver: Arc<dyn RelationalDriver>,
    ) -> Self {
        Self {
            config,
            cache_factory,
            naming,
            driver,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn model_for(&self, scenario: Scenario) -> ModelDescriptor {
        model_for(&self.config, scenario)
    }

    /// Run `scenario` to completion and release everything it acquired.
    ///
    /// A failure during the run is reported even when teardown fails as well; the
    /// teardown failure is attached to it.
    pub fn run(&self, scenario: Scenario) -> Result<ScenarioReport, GridError> {
        tracing::info!(scenario = %scenario, "running example");
        let mut scope = ScenarioScope::new(Arc::clone(&self.cache_factory));
        let mut trail = StateTrail::new(scenario);

        let outcome = self.drive(scenario, &mut scope, &mut trail);
        let teardown = scope.release();

        match outcome {
            Ok(lines) => {
                teardown?;
                trail.enter(ScenarioState::TornDown);
                tracing::info!(scenario = %scenario, rows = lines.len(), "example finished");
                Ok(ScenarioReport {
                    scenario,
                    lines,
                    states: trail.states,
                })
            }
            Err(err) => {
                let err = err.with_teardown(teardown);
                tracing::warn!(scenario = %scenario, error = %err, "example failed");
                Err(err)
            }
        }
    }

    /// Run every scenario in order, stopping at the first failure.
    pub fn run_all(&self) -> Result<Vec<ScenarioReport>, GridError> {
        Scenario::ALL.iter().map(|&s| self.run(s)).collect()
    }

    fn drive(
        &self,
        scenario: Scenario,
        scope: &mut ScenarioScope,
        trail: &mut StateTrail,
    ) -> Result<Vec<String>, GridError> {
        if scenario == Scenario::Registry {
            self.publish_cache(scope)?;
            trail.enter(ScenarioState::CacheEstablished);
        }

        let model = self.model_for(scenario);
        let mut properties = Properties::new();
        properties.insert(MODEL_PROPERTY.to_string(), model.to_inline()?);
        let connection = self.driver.connect(&properties)?;
        if scenario == Scenario::Locator {
            trail.enter(ScenarioState::CacheEstablished);
        }
        trail.enter(ScenarioState::ConnectionOpen);
        let connection = scope.hold_connection(connection);

        let result = QueryExecutor::execute(connection, &self.config.query())?;
        trail.enter(ScenarioState::Executing);
        let result = scope.hold_result(result);

        trail.enter(ScenarioState::Draining);
        let mut lines = Vec::new();
        while let Some(row) = result.next_row()? {
            let line = format_row(&row);
            tracing::info!(scenario = %scenario, entry = %line, "result entry");
            lines.push(line);
        }
        Ok(lines)
    }

    /// Create a cache client and bind it under the configured key.
    fn publish_cache(&self, scope: &mut ScenarioScope) -> Result<(), GridError> {
        let handle = self
            .cache_factory
            .create_client(&self.config.locator_config())?;
        let registry = self.config.registry_config();
        let context = self
            .naming
            .resolve(&registry.context_factory, &Environment::new())?;
        context.bind(&registry.cache_key, handle)?;
        tracing::info!(
            key = %registry.cache_key,
            factory = %registry.context_factory,
            "cache client bound",
        );
        scope.hold_binding(RegistryBinding::new(context, registry.cache_key));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
