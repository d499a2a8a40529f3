//! Schemas and tables built from a model descriptor.
//!
//! Every schema of the model is turned into a [`GridSchema`] by [`GridSchemaFactory`]:
//! the cache handle is obtained through the schema's discovery mode, each listed region
//! must exist, and a region's columns are the union of its records' field names in
//! first-seen order.

use std::sync::Arc;

use gridsql_core::{
    CacheClientFactory, CacheHandle, DiscoveryConfig, Environment, GridError, ModelDescriptor,
    NamingResolver, SchemaDescriptor,
};

use crate::error::EngineError;
use crate::GRID_SCHEMA_FACTORY;

/// An identifier as written in a query.
///
/// Quoted names match exactly, unquoted ones ignore ASCII case.
#[derive(Debug, Clone, Copy)]
pub struct Name<'a> {
    pub value: &'a str,
    pub quoted: bool,
}

impl<'a> Name<'a> {
    pub fn new(value: &'a str, quoted: bool) -> Self {
        Self { value, quoted }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        if self.quoted {
            candidate == self.value
        } else {
            candidate.eq_ignore_ascii_case(self.value)
        }
    }
}

/// Picks the candidate `name` refers to.
///
/// Several case-insensitive matches are resolved by a single exact spelling; anything
/// else is ambiguous.
pub(crate) fn select_one<T>(
    name: &Name<'_>,
    candidates: Vec<(&str, T)>,
) -> Result<Option<T>, EngineError> {
    let mut matches: Vec<(&str, T)> = candidates
        .into_iter()
        .filter(|(candidate, _)| name.matches(candidate))
        .collect();
    if matches.len() <= 1 {
        return Ok(matches.pop().map(|(_, item)| item));
    }
    let exact: Vec<usize> = matches
        .iter()
        .enumerate()
        .filter(|(_, (candidate, _))| *candidate == name.value)
        .map(|(i, _)| i)
        .collect();
    match exact.as_slice() {
        [only] => Ok(Some(matches.swap_remove(*only).1)),
        _ => Err(EngineError::Ambiguous(name.value.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tables and schemas
// ---------------------------------------------------------------------------

/// A cache region exposed as a table.
#[derive(Debug)]
pub struct Table {
    pub schema: String,
    /// Table name, identical to the region name.
    pub name: String,
    pub columns: Vec<String>,
    pub cache: CacheHandle,
}

impl Table {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

#[derive(Debug)]
pub struct GridSchema {
    pub name: String,
    pub tables: Vec<Arc<Table>>,
}

/// Builds [`GridSchema`]s for descriptors naming [`GRID_SCHEMA_FACTORY`].
pub struct GridSchemaFactory<'a> {
    cache_factory: &'a dyn CacheClientFactory,
    naming: &'a NamingResolver,
}

impl<'a> GridSchemaFactory<'a> {
    pub fn new(cache_factory: &'a dyn CacheClientFactory, naming: &'a NamingResolver) -> Self {
        Self {
            cache_factory,
            naming,
        }
    }

    pub fn create(&self, descriptor: &SchemaDescriptor) -> Result<GridSchema, GridError> {
        if descriptor.factory != GRID_SCHEMA_FACTORY {
            return Err(GridError::invalid_model(format!(
                "schema '{}' uses unknown factory '{}', expected '{GRID_SCHEMA_FACTORY}'",
                descriptor.name, descriptor.factory
            )));
        }

        let operand = &descriptor.operand;
        let cache = self.cache_for(&operand.discovery)?;
        let available = cache.region_names()?;

        let mut tables = Vec::with_capacity(operand.regions.len());
        for region in &operand.regions {
            if !available.contains(&region.0) {
                return Err(GridError::invalid_model(format!(
                    "schema '{}' names region '{region}' which the grid does not have",
                    descriptor.name
                )));
            }
            let columns = infer_columns(&cache, &region.0)?;
            tracing::debug!(
                schema = %descriptor.name,
                table = %region,
                columns = columns.len(),
                "table registered",
            );
            tables.push(Arc::new(Table {
                schema: descriptor.name.clone(),
                name: region.0.clone(),
                columns,
                cache: cache.clone(),
            }));
        }

        tracing::info!(
            schema = %descriptor.name,
            discovery = %operand.discovery,
            client = cache.id(),
            tables = tables.len(),
            "schema created",
        );
        Ok(GridSchema {
            name: descriptor.name.clone(),
            tables,
        })
    }

    fn cache_for(&self, discovery: &DiscoveryConfig) -> Result<CacheHandle, GridError> {
        match discovery {
            DiscoveryConfig::Locator(locator) => self.cache_factory.create_client(locator),
            DiscoveryConfig::Registry(registry) => self
                .naming
                .resolve(&registry.context_factory, &Environment::new())?
                .lookup(&registry.cache_key),
        }
    }
}

fn infer_columns(cache: &CacheHandle, region: &str) -> Result<Vec<String>, GridError> {
    let mut columns: Vec<String> = Vec::new();
    for record in cache.read_region(region)? {
        for field in record.field_names() {
            if !columns.iter().any(|c| c == field) {
                columns.push(field.to_string());
            }
        }
    }
    Ok(columns)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Every table a connection can query.
#[derive(Debug)]
pub struct Catalog {
    schemas: Vec<GridSchema>,
}

impl Catalog {
    pub fn from_model(
        model: &ModelDescriptor,
        cache_factory: &dyn CacheClientFactory,
        naming: &NamingResolver,
    ) -> Result<Self, GridError> {
        let factory = GridSchemaFactory::new(cache_factory, naming);
        let schemas = model
            .schemas
            .iter()
            .map(|descriptor| factory.create(descriptor))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { schemas })
    }

    pub fn schemas(&self) -> &[GridSchema] {
        &self.schemas
    }

    /// Resolve `table`, optionally qualified by `schema`.
    pub fn table(&self, schema: Option<Name<'_>>, table: Name<'_>) -> Result<Arc<Table>, EngineError> {
        let candidates = self
            .schemas
            .iter()
            .filter(|s| schema.map_or(true, |wanted| wanted.matches(&s.name)))
            .flat_map(|s| s.tables.iter())
            .map(|t| (t.name.as_str(), t))
            .collect();
        select_one(&table, candidates)?
            .cloned()
            .ok_or_else(|| {
                let shown = match schema {
                    Some(s) => format!("{}.{}", s.value, table.value),
                    None => table.value.to_string(),
                };
                EngineError::TableNotFound(shown)
            })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
