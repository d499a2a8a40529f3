//! Model descriptor consumed by the relational front-end to build its catalog.
//!
//! # Wire shape
//!
//! ```text
//! {
//!   "version": "1.0",
//!   "schemas": [{
//!     "type": "custom",
//!     "name": "TEST",
//!     "factory": "gridsql.adapter.GridSchemaFactory",
//!     "operand": {
//!       "locatorHost": "localhost", "locatorPort": "10334",
//!       "regions": "BookMaster,BookInventory",
//!       "pdxSerializablePackagePath": "gridsql.domain.*"
//!     }
//!   }]
//! }
//! ```
//!
//! A registry-mode operand carries `jndiInitialContextFactory`,
//! `jndiClientCacheObjectKey` and `regions` instead. The operand is decoded into a
//! [`DiscoveryConfig`], so a descriptor that mixes or omits both key sets never
//! reaches the front-end.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::types::{DiscoveryConfig, LocatorConfig, RegionName, RegistryConfig};

/// The only descriptor version understood by the front-end.
pub const MODEL_VERSION: &str = "1.0";

/// Prefix marking a model passed by value rather than by file path.
pub const INLINE_PREFIX: &str = "inline:";

// ---------------------------------------------------------------------------
// Descriptor types
// ---------------------------------------------------------------------------

/// Root of a model descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub version: String,
    pub schemas: Vec<SchemaDescriptor>,
}

/// Schema flavour. Only adapter-built (`custom`) schemas are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    #[default]
    Custom,
}

/// One schema entry: which adapter factory builds it and with what operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    pub name: String,
    /// Identifier of the adapter factory that turns the operand into tables.
    pub factory: String,
    pub operand: GridOperand,
}

/// Decoded schema operand: how to reach the cache and which regions to expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOperand", into = "RawOperand")]
pub struct GridOperand {
    pub discovery: DiscoveryConfig,
    pub regions: Vec<RegionName>,
}

/// Flat key set as it appears on the wire.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOperand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locator_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locator_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jndi_initial_context_factory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jndi_client_cache_object_key: Option<String>,
    #[serde(default)]
    regions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pdx_serializable_package_path: Option<String>,
}

impl TryFrom<RawOperand> for GridOperand {
    type Error = GridError;

    fn try_from(raw: RawOperand) -> Result<Self, Self::Error> {
        let has_locator = raw.locator_host.is_some()
            || raw.locator_port.is_some()
            || raw.pdx_serializable_package_path.is_some();
        let has_registry =
            raw.jndi_initial_context_factory.is_some() || raw.jndi_client_cache_object_key.is_some();

        let discovery = match (has_locator, has_registry) {
            (true, true) => {
                return Err(GridError::invalid_model(
                    "operand mixes locator keys and registry keys",
                ))
            }
            (false, false) => {
                return Err(GridError::invalid_model(
                    "operand must define either locatorHost/locatorPort or \
                     jndiInitialContextFactory/jndiClientCacheObjectKey",
                ))
            }
            (true, false) => {
                let host = raw
                    .locator_host
                    .ok_or_else(|| GridError::invalid_model("operand is missing locatorHost"))?;
                let port = raw
                    .locator_port
                    .ok_or_else(|| GridError::invalid_model("operand is missing locatorPort"))?;
                let port: u16 = port.trim().parse().map_err(|_| {
                    GridError::invalid_model(format!("locatorPort '{port}' is not a valid port"))
                })?;
                DiscoveryConfig::Locator(LocatorConfig::new(
                    host,
                    port,
                    raw.pdx_serializable_package_path.unwrap_or_default(),
                ))
            }
            (false, true) => {
                let factory = raw.jndi_initial_context_factory.ok_or_else(|| {
                    GridError::invalid_model("operand is missing jndiInitialContextFactory")
                })?;
                let key = raw.jndi_client_cache_object_key.ok_or_else(|| {
                    GridError::invalid_model("operand is missing jndiClientCacheObjectKey")
                })?;
                DiscoveryConfig::Registry(RegistryConfig::new(factory, key))
            }
        };
        discovery.validate()?;

        let regions = parse_regions(&raw.regions);
        if regions.is_empty() {
            return Err(GridError::invalid_model(
                "operand must expose at least one region",
            ));
        }
        Ok(GridOperand { discovery, regions })
    }
}

impl From<GridOperand> for RawOperand {
    fn from(operand: GridOperand) -> Self {
        let regions = operand
            .regions
            .iter()
            .map(|r| r.0.as_str())
            .collect::<Vec<_>>()
            .join(",");
        match operand.discovery {
            DiscoveryConfig::Locator(cfg) => RawOperand {
                locator_host: Some(cfg.host),
                locator_port: Some(cfg.port.to_string()),
                regions,
                pdx_serializable_package_path: Some(cfg.serialization_package_pattern),
                ..RawOperand::default()
            },
            DiscoveryConfig::Registry(cfg) => RawOperand {
                jndi_initial_context_factory: Some(cfg.context_factory),
                jndi_client_cache_object_key: Some(cfg.cache_key),
                regions,
                ..RawOperand::default()
            },
        }
    }
}

fn parse_regions(regions: &str) -> Vec<RegionName> {
    regions
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(RegionName::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Construction, encoding, decoding
// ---------------------------------------------------------------------------

impl ModelDescriptor {
    /// A descriptor with one custom schema.
    pub fn single(
        schema_name: impl Into<String>,
        factory: impl Into<String>,
        discovery: DiscoveryConfig,
        regions: Vec<RegionName>,
    ) -> Self {
        Self {
            version: MODEL_VERSION.to_string(),
            schemas: vec![SchemaDescriptor {
                kind: SchemaKind::Custom,
                name: schema_name.into(),
                factory: factory.into(),
                operand: GridOperand { discovery, regions },
            }],
        }
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.version != MODEL_VERSION {
            return Err(GridError::invalid_model(format!(
                "unsupported model version '{}', expected '{MODEL_VERSION}'",
                self.version
            )));
        }
        if self.schemas.is_empty() {
            return Err(GridError::invalid_model("model defines no schemas"));
        }
        let mut seen = BTreeSet::new();
        for schema in &self.schemas {
            if !seen.insert(schema.name.as_str()) {
                return Err(GridError::invalid_model(format!(
                    "duplicate schema name '{}'",
                    schema.name
                )));
            }
            schema.operand.discovery.validate()?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, GridError> {
        serde_json::to_string(self)
            .map_err(|e| GridError::invalid_model(format!("failed to encode model: {e}")))
    }

    pub fn to_json_pretty(&self) -> Result<String, GridError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GridError::invalid_model(format!("failed to encode model: {e}")))
    }

    /// `inline:<json>`, suitable for the `model` connection property.
    pub fn to_inline(&self) -> Result<String, GridError> {
        Ok(format!("{INLINE_PREFIX}{}", self.to_json()?))
    }

    pub fn from_json(json: &str) -> Result<Self, GridError> {
        let model: ModelDescriptor = serde_json::from_str(json)
            .map_err(|e| GridError::invalid_model(format!("failed to parse model: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, GridError> {
        let model: ModelDescriptor = serde_yaml::from_str(yaml)
            .map_err(|e| GridError::invalid_model(format!("failed to parse model: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    /// Decode a `model` property value: `inline:<json>` or a path to a
    /// `.json` / `.yaml` / `.yml` file.
    ///
    /// Inline text that is not strict JSON is read as a YAML flow mapping, which
    /// covers unquoted keys and single-quoted strings. The JSON error is reported
    /// when neither reading succeeds.
    pub fn from_source(source: &str) -> Result<Self, GridError> {
        if let Some(inline) = source.strip_prefix(INLINE_PREFIX) {
            return Self::from_json(inline).or_else(|json_err| {
                Self::from_yaml(inline).map_err(|yaml_err| {
                    tracing::debug!(error = %yaml_err, "inline model is not YAML either");
                    json_err
                })
            });
        }
        Self::from_path(Path::new(source))
    }

    pub fn from_path(path: &Path) -> Result<Self, GridError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GridError::invalid_model(format!("cannot read model file {}: {e}", path.display()))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            _ => Self::from_json(&contents),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
