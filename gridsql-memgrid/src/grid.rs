//! A grid member holding keyed regions in memory.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use gridsql_core::{GridError, Record};

type RegionMap = BTreeMap<String, BTreeMap<String, Record>>;

/// One data-grid member. Regions iterate in key order.
#[derive(Debug)]
pub struct Grid {
    name: String,
    regions: RwLock<RegionMap>,
    online: AtomicBool,
}

impl Grid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: RwLock::new(BTreeMap::new()),
            online: AtomicBool::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create an empty region. Existing regions are left untouched.
    pub fn create_region(&self, region: &str) {
        self.regions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(region.to_string())
            .or_default();
    }

    /// Store `record` under `key`, creating the region if needed.
    pub fn put(&self, region: &str, key: impl Into<String>, record: Record) {
        self.regions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(region.to_string())
            .or_default()
            .insert(key.into(), record);
    }

    pub fn remove(&self, region: &str, key: &str) -> Option<Record> {
        self.regions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(region)
            .and_then(|entries| entries.remove(key))
    }

    pub fn region_names(&self) -> Result<Vec<String>, GridError> {
        self.ensure_online()?;
        Ok(self
            .regions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    /// Snapshot of a region in key order.
    pub fn read_region(&self, region: &str) -> Result<Vec<Record>, GridError> {
        self.ensure_online()?;
        let regions = self.regions.read().unwrap_or_else(PoisonError::into_inner);
        let entries = regions.get(region).ok_or_else(|| {
            GridError::connection(format!("region '{region}' does not exist on member '{}'", self.name))
        })?;
        Ok(entries.values().cloned().collect())
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Take the member offline; clients see `ConnectionFailure` until [`Grid::start`].
    pub fn stop(&self) {
        tracing::info!(member = %self.name, "grid member stopped");
        self.online.store(false, Ordering::SeqCst);
    }

    pub fn start(&self) {
        tracing::info!(member = %self.name, "grid member started");
        self.online.store(true, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), GridError> {
        if self.is_online() {
            Ok(())
        } else {
            Err(GridError::connection(format!(
                "grid member '{}' is unreachable",
                self.name
            )))
        }
    }
}
