//! Locator directory: which grid member answers at which `host:port`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::grid::Grid;

/// In-process stand-in for the network of locators.
#[derive(Debug, Default)]
pub struct LocatorDirectory {
    members: RwLock<HashMap<(String, u16), Arc<Grid>>>,
}

impl LocatorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start answering at `host:port` with `grid`. Replaces any previous member.
    pub fn register(&self, host: &str, port: u16, grid: Arc<Grid>) {
        tracing::info!(host, port, member = grid.name(), "locator registered");
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((host.to_string(), port), grid);
    }

    pub fn deregister(&self, host: &str, port: u16) -> Option<Arc<Grid>> {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(host.to_string(), port))
    }

    /// The member answering at `host:port`, if any.
    pub fn locate(&self, host: &str, port: u16) -> Option<Arc<Grid>> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(host.to_string(), port))
            .cloned()
    }
}
