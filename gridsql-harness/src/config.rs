//! Harness configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.gridsql/
//!   harness.yaml   (optional; built-in defaults apply when absent)
//! ```
//!
//! Every field is optional in the file; missing ones take the defaults below.
//!
//! # API pattern
//!
//! - `load_at(home: &Path)`: explicit home, used in tests with `TempDir`
//! - `load()`: derives home from `dirs::home_dir()`, delegates to `load_at`
//! - `load_from(path)`: an explicit file, as given by `--config`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use gridsql_core::{LocatorConfig, RegionName, RegistryConfig, IN_MEMORY_CONTEXT_FACTORY};

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 10334;
pub const DEFAULT_PACKAGE_PATTERN: &str = "gridsql.domain.*";
pub const DEFAULT_SCHEMA: &str = "TEST";
pub const DEFAULT_CACHE_KEY: &str = "testClientCacheObject";
pub const DEFAULT_REGIONS: [&str; 4] = ["BookMaster", "BookCustomer", "BookInventory", "BookOrder"];

/// Join of books with their stock in `schema`, skipping free items.
pub fn default_query(schema: &str) -> String {
    format!(
        r#"SELECT "b"."author", "b"."retailCost", "i"."quantityInStock"
FROM "{schema}"."BookMaster" AS "b"  INNER JOIN "{schema}"."BookInventory" AS "i"  ON "b"."itemNumber" = "i"."itemNumber"
 WHERE  "b"."retailCost" > 0"#
    )
}

const CONFIG_DIR: &str = ".gridsql";
const CONFIG_FILE: &str = "harness.yaml";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorSection {
    pub host: String,
    pub port: u16,
    pub package_pattern: String,
    pub single_hop: bool,
}

impl Default for LocatorSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            package_pattern: DEFAULT_PACKAGE_PATTERN.to_string(),
            single_hop: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySection {
    pub context_factory: String,
    pub cache_key: String,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            context_factory: IN_MEMORY_CONTEXT_FACTORY.to_string(),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
        }
    }
}

/// Everything the scenarios need besides their collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub locator: LocatorSection,
    pub registry: RegistrySection,
    pub schema: String,
    pub regions: Vec<String>,
    /// Query to run; the bookshop join over `schema` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            locator: LocatorSection::default(),
            registry: RegistrySection::default(),
            schema: DEFAULT_SCHEMA.to_string(),
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            query: None,
        }
    }
}

impl HarnessConfig {
    pub fn query(&self) -> String {
        self.query
            .clone()
            .unwrap_or_else(|| default_query(&self.schema))
    }

    pub fn locator_config(&self) -> LocatorConfig {
        LocatorConfig::new(
            self.locator.host.clone(),
            self.locator.port,
            self.locator.package_pattern.clone(),
        )
        .with_single_hop(self.locator.single_hop)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::new(
            self.registry.context_factory.clone(),
            self.registry.cache_key.clone(),
        )
    }

    pub fn region_names(&self) -> Vec<RegionName> {
        self.regions.iter().map(|r| RegionName::from(r.as_str())).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locator.host.trim().is_empty() {
            return Err(ConfigError::Invalid("locator.host must not be empty".into()));
        }
        if self.locator.port == 0 {
            return Err(ConfigError::Invalid("locator.port must be in 1..=65535".into()));
        }
        if self.schema.trim().is_empty() {
            return Err(ConfigError::Invalid("schema must not be empty".into()));
        }
        if self.regions.is_empty() || self.regions.iter().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "regions must list at least one non-empty region".into(),
            ));
        }
        if self.registry.cache_key.trim().is_empty() {
            return Err(ConfigError::Invalid("registry.cache_key must not be empty".into()));
        }
        if self.query.as_deref().is_some_and(|q| q.trim().is_empty()) {
            return Err(ConfigError::Invalid("query must not be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// `<home>/.gridsql/harness.yaml`, pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load `<home>/.gridsql/harness.yaml`, or the defaults when it does not exist.
pub fn load_at(home: &Path) -> Result<HarnessConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(HarnessConfig::default());
    }
    load_from(&path)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<HarnessConfig, ConfigError> {
    load_at(&home()?)
}

/// Load and validate an explicit config file.
pub fn load_from(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: HarnessConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// `--config` when given, otherwise the file under the home directory.
pub fn resolve(explicit: Option<&Path>) -> Result<HarnessConfig, ConfigError> {
    match explicit {
        Some(path) => load_from(path),
        None => load(),
    }
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write_config(home: &Path, yaml: &str) {
        let path = config_path_at(home);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, yaml).unwrap();
    }

    #[test]
    fn missing_file_yields_defaults() {
        let home = TempDir::new().expect("home");
        let config = load_at(home.path()).expect("load");
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.locator_config().address(), "localhost[10334]");
        assert_eq!(config.registry.cache_key, "testClientCacheObject");
        assert_eq!(config.regions.len(), 4);
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let home = TempDir::new().expect("home");
        write_config(home.path(), "locator:\n  port: 10335\n  single_hop: false\nschema: SHOP\n");
        let config = load_at(home.path()).expect("load");
        assert_eq!(config.locator.port, 10335);
        assert_eq!(config.locator.host, "localhost");
        assert!(!config.locator_config().single_hop_enabled);
        assert_eq!(config.schema, "SHOP");
        assert!(config.query.is_none());
        assert!(config.query().contains(r#"FROM "SHOP"."BookMaster""#));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let home = TempDir::new().expect("home");
        write_config(home.path(), "locator: [unclosed");
        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("harness.yaml"));
    }

    #[rstest]
    #[case("locator:\n  host: \"\"\n", "locator.host")]
    #[case("locator:\n  port: 0\n", "locator.port")]
    #[case("regions: []\n", "regions")]
    #[case("registry:\n  cache_key: \" \"\n", "cache_key")]
    #[case("query: \"  \"\n", "query")]
    fn invalid_values_are_rejected(#[case] yaml: &str, #[case] field: &str) {
        let home = TempDir::new().expect("home");
        write_config(home.path(), yaml);
        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
        assert!(err.to_string().contains(field), "got: {err}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let home = TempDir::new().expect("home");
        write_config(home.path(), "locatr:\n  port: 1\n");
        assert!(matches!(load_at(home.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = TempDir::new().expect("dir");
        let err = resolve(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
