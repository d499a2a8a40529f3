//! Cache clients connected through the [`LocatorDirectory`].
//!
//! [`MemClientFactory`] keeps at most one live client, like a process-wide client
//! cache: asking again for the same locator returns the live instance, asking for a
//! different locator while one is live is refused.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use gridsql_core::{CacheClient, CacheClientFactory, CacheHandle, GridError, LocatorConfig, Record};

use crate::grid::Grid;
use crate::locator::LocatorDirectory;

/// A client connected to one grid member.
#[derive(Debug)]
pub struct MemCacheClient {
    id: String,
    locator: LocatorConfig,
    grid: Arc<Grid>,
    connected_at: DateTime<Utc>,
    closed: AtomicBool,
}

impl MemCacheClient {
    fn ensure_open(&self) -> Result<(), GridError> {
        if self.is_closed() {
            Err(GridError::connection(format!("cache client '{}' is closed", self.id)))
        } else {
            Ok(())
        }
    }
}

impl CacheClient for MemCacheClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn locator(&self) -> &LocatorConfig {
        &self.locator
    }

    fn region_names(&self) -> Result<Vec<String>, GridError> {
        self.ensure_open()?;
        self.grid.region_names()
    }

    fn read_region(&self, region: &str) -> Result<Vec<Record>, GridError> {
        self.ensure_open()?;
        self.grid.read_region(region)
    }

    fn close(&self) -> Result<(), GridError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!(
                client = %self.id,
                member = self.grid.name(),
                connected_at = %self.connected_at,
                "cache client closed",
            );
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// [`CacheClientFactory`] over an in-process [`LocatorDirectory`].
#[derive(Debug)]
pub struct MemClientFactory {
    directory: Arc<LocatorDirectory>,
    current: Mutex<Option<CacheHandle>>,
    next_id: AtomicU64,
}

impl MemClientFactory {
    pub fn new(directory: Arc<LocatorDirectory>) -> Self {
        Self {
            directory,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// The live client, if one is established and not closed.
    pub fn current(&self) -> Option<CacheHandle> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|handle| !handle.is_closed())
            .cloned()
    }
}

impl CacheClientFactory for MemClientFactory {
    fn create_client(&self, locator: &LocatorConfig) -> Result<CacheHandle, GridError> {
        locator.validate()?;
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = current.as_ref().filter(|handle| !handle.is_closed()) {
            let live = existing.client().locator();
            if live.host == locator.host && live.port == locator.port {
                if live.single_hop_enabled != locator.single_hop_enabled
                    || live.serialization_package_pattern != locator.serialization_package_pattern
                {
                    tracing::warn!(
                        client = existing.id(),
                        live_single_hop = live.single_hop_enabled,
                        requested_single_hop = locator.single_hop_enabled,
                        live_package_pattern = %live.serialization_package_pattern,
                        requested_package_pattern = %locator.serialization_package_pattern,
                        "live cache client was created with different settings",
                    );
                    return Err(GridError::connection(format!(
                        "the cache client connected to {} uses different settings \
                         (single-hop {}, package pattern '{}'); close it first",
                        live.address(),
                        live.single_hop_enabled,
                        live.serialization_package_pattern
                    )));
                }
                tracing::debug!(client = existing.id(), "re-using live cache client");
                return Ok(existing.clone());
            }
            return Err(GridError::connection(format!(
                "a cache client is already connected to {}; close it before connecting to {}",
                live.address(),
                locator.address()
            )));
        }

        let grid = self
            .directory
            .locate(&locator.host, locator.port)
            .filter(|grid| grid.is_online())
            .ok_or_else(|| {
                GridError::connection(format!("no locator reachable at {}", locator.address()))
            })?;

        let id = format!("client-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        tracing::info!(
            client = %id,
            locator = %locator.address(),
            member = grid.name(),
            single_hop = locator.single_hop_enabled,
            package_pattern = %locator.serialization_package_pattern,
            "cache client connected",
        );
        let handle = CacheHandle::new(Arc::new(MemCacheClient {
            id,
            locator: locator.clone(),
            grid,
            connected_at: Utc::now(),
            closed: AtomicBool::new(false),
        }));
        *current = Some(handle.clone());
        Ok(handle)
    }

    fn close_client_cache(&self) -> Result<(), GridError> {
        match self.current.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(handle) => handle.close(),
            None => {
                tracing::debug!("no cache client to close");
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
