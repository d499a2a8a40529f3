//! [`RelationalDriver`] over cache regions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use gridsql_core::{
    CacheClientFactory, Closeable, Connection, GridError, ModelDescriptor, NamingResolver,
    Properties, RelationalDriver, ResultSet, Statement, MODEL_PROPERTY,
};

use crate::catalog::Catalog;
use crate::cursor::GridResultSet;
use crate::error::EngineError;
use crate::plan;

/// Opens connections described by the `model` property.
///
/// Locator schemas obtain their client from the cache factory, registry schemas
/// look theirs up through the naming resolver.
pub struct GridDriver {
    cache_factory: Arc<dyn CacheClientFactory>,
    naming: Arc<NamingResolver>,
    next_id: AtomicU64,
}

impl GridDriver {
    pub fn new(cache_factory: Arc<dyn CacheClientFactory>, naming: Arc<NamingResolver>) -> Self {
        Self {
            cache_factory,
            naming,
            next_id: AtomicU64::new(1),
        }
    }
}

impl RelationalDriver for GridDriver {
    fn connect(&self, properties: &Properties) -> Result<Box<dyn Connection>, GridError> {
        let source = properties.get(MODEL_PROPERTY).ok_or_else(|| {
            GridError::invalid_model(format!("connection property '{MODEL_PROPERTY}' is missing"))
        })?;
        let model = ModelDescriptor::from_source(source)?;
        let catalog = Catalog::from_model(&model, self.cache_factory.as_ref(), &self.naming)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        tracing::info!(connection = id, schemas = catalog.schemas().len(), "connection opened");
        Ok(Box::new(GridConnection {
            id,
            catalog: Arc::new(catalog),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

pub struct GridConnection {
    id: u64,
    catalog: Arc<Catalog>,
    closed: Arc<AtomicBool>,
}

impl Closeable for GridConnection {
    fn close(&mut self) -> Result<(), GridError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!(connection = self.id, "connection closed");
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("connection #{}", self.id)
    }
}

impl Connection for GridConnection {
    fn create_statement(&self) -> Result<Box<dyn Statement>, GridError> {
        if self.is_closed() {
            return Err(EngineError::Closed("connection").into());
        }
        Ok(Box::new(GridStatement {
            catalog: Arc::clone(&self.catalog),
            connection_closed: Arc::clone(&self.closed),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct GridStatement {
    catalog: Arc<Catalog>,
    connection_closed: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl Closeable for GridStatement {
    fn close(&mut self) -> Result<(), GridError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "statement".to_string()
    }
}

impl Statement for GridStatement {
    fn execute_query(&mut self, sql: &str) -> Result<Box<dyn ResultSet>, GridError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Closed("statement").into());
        }
        if self.connection_closed.load(Ordering::SeqCst) {
            return Err(EngineError::Closed("connection").into());
        }
        let plan = plan::plan_query(sql, &self.catalog)?;
        Ok(Box::new(GridResultSet::new(
            Arc::new(plan),
            Arc::clone(&self.closed),
            Arc::clone(&self.connection_closed),
        )))
    }
}
