//! Domain types shared by every gridsql crate.
//!
//! Discovery is a sum type: a bootstrap attempt carries either a locator address or a
//! registry lookup, never both.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GridError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a cache region exposed as a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionName(pub String);

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RegionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RegionName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Values and records
// ---------------------------------------------------------------------------

/// A single cell value read from a cache region or produced by a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// SQL comparison. `None` when either side is null or the types are incomparable.
    pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Double(b)) => (*a as f64).partial_cmp(b),
            (Value::Double(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            // Whole doubles keep one fractional digit: 20.0, not 20.
            Value::Double(d) if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e16 => {
                write!(f, "{d:.1}")
            }
            Value::Double(d) => write!(f, "{d}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

/// One entry stored in a cache region: a domain type name plus ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field setter. Replaces an existing field of the same name.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

fn default_single_hop() -> bool {
    true
}

/// Direct discovery through a locator address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
    pub host: String,
    pub port: u16,
    /// Package pattern the cache layer uses to find serializable domain types
    /// (e.g. `gridsql.domain.*`).
    pub serialization_package_pattern: String,
    /// Route requests straight to the data-owning member. Passed through untouched.
    #[serde(default = "default_single_hop")]
    pub single_hop_enabled: bool,
}

impl LocatorConfig {
    /// Single-hop routing is enabled by default.
    pub fn new(host: impl Into<String>, port: u16, package_pattern: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            serialization_package_pattern: package_pattern.into(),
            single_hop_enabled: true,
        }
    }

    pub fn with_single_hop(mut self, enabled: bool) -> Self {
        self.single_hop_enabled = enabled;
        self
    }

    /// `host[port]`, the way locator addresses are written in grid logs.
    pub fn address(&self) -> String {
        format!("{}[{}]", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.host.trim().is_empty() {
            return Err(GridError::invalid_model("locator host must not be empty"));
        }
        if self.port == 0 {
            return Err(GridError::invalid_model(
                "locator port must be in 1..=65535, got 0",
            ));
        }
        Ok(())
    }
}

/// Discovery by looking up a previously bound cache handle in a naming registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Name of the naming-context provider (see [`crate::naming::NamingResolver`]).
    pub context_factory: String,
    /// Key the cache handle was bound under.
    pub cache_key: String,
}

impl RegistryConfig {
    pub fn new(context_factory: impl Into<String>, cache_key: impl Into<String>) -> Self {
        Self {
            context_factory: context_factory.into(),
            cache_key: cache_key.into(),
        }
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.context_factory.trim().is_empty() {
            return Err(GridError::invalid_model("context factory name must not be empty"));
        }
        if self.cache_key.trim().is_empty() {
            return Err(GridError::invalid_model("cache object key must not be empty"));
        }
        Ok(())
    }
}

/// How a relational connection obtains its cache client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DiscoveryConfig {
    Locator(LocatorConfig),
    Registry(RegistryConfig),
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<(), GridError> {
        match self {
            DiscoveryConfig::Locator(cfg) => cfg.validate(),
            DiscoveryConfig::Registry(cfg) => cfg.validate(),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            DiscoveryConfig::Locator(_) => "locator",
            DiscoveryConfig::Registry(_) => "registry",
        }
    }
}

impl fmt::Display for DiscoveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryConfig::Locator(cfg) => write!(f, "locator {}", cfg.address()),
            DiscoveryConfig::Registry(cfg) => {
                write!(f, "registry {}#{}", cfg.context_factory, cfg.cache_key)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
