use std::sync::Arc;

use assert_fs::prelude::*;
use predicates::prelude::*;

use gridsql_core::{
    CacheClientFactory, CacheHandle, Environment, GridError, LocatorConfig,
    IN_MEMORY_CONTEXT_FACTORY,
};
use gridsql_engine::GridDriver;
use gridsql_harness::config;
use gridsql_harness::{EmbeddedGrid, Harness, HarnessConfig, Scenario, ScenarioState};
use gridsql_memgrid::MemClientFactory;

const EXPECTED: [&str; 3] = [
    "author=Daisy Mae West; retailCost=34.99; quantityInStock=10",
    "author=Clarence Meeks; retailCost=11.99; quantityInStock=4",
    "author=Jim Heavisides; retailCost=59.99; quantityInStock=36",
];

fn started() -> (EmbeddedGrid, Harness) {
    let config = HarnessConfig::default();
    let grid = EmbeddedGrid::start(&config);
    let harness = grid.harness(config);
    (grid, harness)
}

#[test]
fn both_scenarios_print_the_same_lines() {
    let (_grid, harness) = started();
    let locator = harness.run(Scenario::Locator).expect("locator");
    let registry = harness.run(Scenario::Registry).expect("registry");
    assert_eq!(locator.lines, EXPECTED);
    assert_eq!(locator.lines.join("\n"), registry.lines.join("\n"));
}

#[test]
fn state_trail_covers_every_state_once() {
    let (_grid, harness) = started();
    for scenario in Scenario::ALL {
        let report = harness.run(scenario).expect("run");
        assert_eq!(
            report.states,
            vec![
                ScenarioState::Uninitialized,
                ScenarioState::CacheEstablished,
                ScenarioState::ConnectionOpen,
                ScenarioState::Executing,
                ScenarioState::Draining,
                ScenarioState::TornDown,
            ],
            "{scenario}"
        );
    }
}

#[test]
fn teardown_closes_the_cache_and_removes_the_binding() {
    let (grid, harness) = started();
    harness.run(Scenario::Registry).expect("first run");
    assert!(grid.factory().current().is_none());
    let context = grid
        .naming()
        .resolve(IN_MEMORY_CONTEXT_FACTORY, &Environment::new())
        .unwrap();
    assert!(context.keys().is_empty());

    // Repeatable against the same registry.
    let again = harness.run(Scenario::Registry).expect("second run");
    assert_eq!(again.lines, EXPECTED);
}

#[test]
fn unreachable_locator_is_a_connection_failure() {
    let grid = EmbeddedGrid::offline();
    let harness = grid.harness(HarnessConfig::default());
    for scenario in Scenario::ALL {
        let err = harness.run(scenario).unwrap_err();
        assert!(
            matches!(err, GridError::ConnectionFailure { .. }),
            "{scenario}: {err}"
        );
    }
}

#[test]
fn already_bound_key_is_registry_unavailable_and_cache_is_released() {
    let (grid, harness) = started();
    let other = grid
        .factory()
        .create_client(&HarnessConfig::default().locator_config())
        .unwrap();
    grid.naming()
        .resolve(IN_MEMORY_CONTEXT_FACTORY, &Environment::new())
        .unwrap()
        .bind("testClientCacheObject", other.clone())
        .unwrap();

    let err = harness.run(Scenario::Registry).unwrap_err();
    assert!(matches!(err, GridError::RegistryUnavailable { .. }), "got: {err}");
    assert!(other.is_closed());
}

#[test]
fn bad_query_is_a_query_failure() {
    let config = HarnessConfig {
        query: Some("SELECT author FROM TEST.Missing".into()),
        ..HarnessConfig::default()
    };
    let grid = EmbeddedGrid::start(&config);
    let err = grid.harness(config).run(Scenario::Locator).unwrap_err();
    assert!(matches!(err, GridError::QueryFailure { .. }), "got: {err}");
    assert!(grid.factory().current().is_none());
}

/// Delegates to a real factory but fails every shutdown.
struct FailingShutdown(Arc<MemClientFactory>);

impl CacheClientFactory for FailingShutdown {
    fn create_client(&self, locator: &LocatorConfig) -> Result<CacheHandle, GridError> {
        self.0.create_client(locator)
    }

    fn close_client_cache(&self) -> Result<(), GridError> {
        self.0.close_client_cache()?;
        Err(GridError::connection("socket reset during shutdown"))
    }
}

#[test]
fn primary_failure_wins_over_teardown_failure() {
    let config = HarnessConfig {
        query: Some("SELECT nope FROM TEST.BookMaster".into()),
        ..HarnessConfig::default()
    };
    let grid = EmbeddedGrid::start(&config);
    let factory: Arc<dyn CacheClientFactory> =
        Arc::new(FailingShutdown(Arc::clone(grid.factory())));
    let driver = GridDriver::new(Arc::clone(&factory), Arc::clone(grid.naming()));
    let harness = Harness::new(config, factory, Arc::clone(grid.naming()), Arc::new(driver));

    let err = harness.run(Scenario::Locator).unwrap_err();
    assert!(matches!(err, GridError::WithTeardown { .. }), "got: {err}");
    assert!(matches!(err.primary(), GridError::QueryFailure { .. }));
    let message = err.to_string();
    assert!(message.starts_with("query failure"), "got: {message}");
    assert!(message.contains("socket reset during shutdown"));
}

#[test]
fn teardown_failure_alone_fails_the_run() {
    let config = HarnessConfig::default();
    let grid = EmbeddedGrid::start(&config);
    let factory: Arc<dyn CacheClientFactory> =
        Arc::new(FailingShutdown(Arc::clone(grid.factory())));
    let driver = GridDriver::new(Arc::clone(&factory), Arc::clone(grid.naming()));
    let harness = Harness::new(config, factory, Arc::clone(grid.naming()), Arc::new(driver));

    let err = harness.run(Scenario::Locator).unwrap_err();
    match err {
        GridError::Teardown(failure) => {
            assert_eq!(failure.causes.len(), 1);
            assert_eq!(failure.causes[0].resource, "cache client");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn config_file_moves_the_locator() {
    let home = assert_fs::TempDir::new().unwrap();
    let file = home.child(".gridsql/harness.yaml");
    file.write_str("locator:\n  port: 10335\n").unwrap();
    file.assert(predicate::str::contains("10335"));

    let config = config::load_at(home.path()).expect("config");
    assert_eq!(config.locator.port, 10335);

    let grid = EmbeddedGrid::start(&config);
    let report = grid.harness(config).run(Scenario::Locator).expect("run");
    assert_eq!(report.lines, EXPECTED);
    assert!(grid.directory().locate("localhost", 10334).is_none());
}

#[test]
fn renamed_schema_still_runs_the_default_query() {
    let home = assert_fs::TempDir::new().unwrap();
    home.child(".gridsql/harness.yaml")
        .write_str("schema: SHOP\n")
        .unwrap();

    let config = config::load_at(home.path()).expect("config");
    let grid = EmbeddedGrid::start(&config);
    let harness = grid.harness(config);
    for scenario in Scenario::ALL {
        let report = harness.run(scenario).expect("run");
        assert_eq!(report.lines, EXPECTED, "{scenario}");
    }
}
