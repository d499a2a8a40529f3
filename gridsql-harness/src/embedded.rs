//! Embedded bookshop grid wired to a ready-to-run [`Harness`].

use std::sync::Arc;

use gridsql_core::NamingResolver;
use gridsql_engine::GridDriver;
use gridsql_memgrid::{bookshop, Grid, LocatorDirectory, MemClientFactory};

use crate::config::HarnessConfig;
use crate::scenario::Harness;

/// Name of the embedded grid member.
pub const MEMBER_NAME: &str = "server1";

/// An in-process grid answering at the configured locator, plus the collaborators
/// the scenarios need.
pub struct EmbeddedGrid {
    directory: Arc<LocatorDirectory>,
    grid: Arc<Grid>,
    factory: Arc<MemClientFactory>,
    naming: Arc<NamingResolver>,
}

impl EmbeddedGrid {
    /// Seed the bookshop regions and register the member at the configured locator.
    pub fn start(config: &HarnessConfig) -> Self {
        let embedded = Self::offline();
        embedded
            .directory
            .register(&config.locator.host, config.locator.port, Arc::clone(&embedded.grid));
        embedded
    }

    /// Same collaborators, but nothing answers at any locator.
    pub fn offline() -> Self {
        let directory = Arc::new(LocatorDirectory::new());
        Self {
            grid: Arc::new(bookshop(MEMBER_NAME)),
            factory: Arc::new(MemClientFactory::new(Arc::clone(&directory))),
            naming: Arc::new(NamingResolver::with_in_memory()),
            directory,
        }
    }

    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    pub fn directory(&self) -> &Arc<LocatorDirectory> {
        &self.directory
    }

    pub fn factory(&self) -> &Arc<MemClientFactory> {
        &self.factory
    }

    pub fn naming(&self) -> &Arc<NamingResolver> {
        &self.naming
    }

    /// A harness whose collaborators all point at this grid.
    pub fn harness(&self, config: HarnessConfig) -> Harness {
        let driver = GridDriver::new(self.factory.clone(), Arc::clone(&self.naming));
        Harness::new(
            config,
            self.factory.clone(),
            Arc::clone(&self.naming),
            Arc::new(driver),
        )
    }
}
