//! # gridsql-memgrid
//!
//! In-memory data grid used to run and test the bootstrap scenarios without a real
//! cluster.
//!
//! ```text
//! LocatorDirectory ("host", port) -> Grid (regions of keyed Records)
//!        ^
//! MemClientFactory::create_client(&LocatorConfig) -> CacheHandle(MemCacheClient)
//! ```

pub mod client;
pub mod fixtures;
pub mod grid;
pub mod locator;

pub use client::{MemCacheClient, MemClientFactory};
pub use fixtures::{bookshop, seed_bookshop, BOOKSHOP_REGIONS};
pub use grid::Grid;
pub use locator::LocatorDirectory;
