//! Cache client interface and the identity-preserving [`CacheHandle`].

use std::fmt;
use std::sync::Arc;

use crate::error::GridError;
use crate::types::{LocatorConfig, Record};

/// A live client of a distributed-cache grid.
///
/// Implementations must make [`CacheClient::close`] idempotent.
pub trait CacheClient: Send + Sync + fmt::Debug {
    /// Stable identifier of this client instance (for logs).
    fn id(&self) -> &str;

    /// Locator configuration the client was created with.
    fn locator(&self) -> &LocatorConfig;

    /// Names of every region visible to this client.
    fn region_names(&self) -> Result<Vec<String>, GridError>;

    /// Snapshot of a region's entries in key order.
    fn read_region(&self, region: &str) -> Result<Vec<Record>, GridError>;

    fn close(&self) -> Result<(), GridError>;

    fn is_closed(&self) -> bool;
}

/// Cloneable handle to one live cache client. Clones refer to the same instance.
#[derive(Debug, Clone)]
pub struct CacheHandle(Arc<dyn CacheClient>);

impl CacheHandle {
    pub fn new(client: Arc<dyn CacheClient>) -> Self {
        Self(client)
    }

    /// `true` when both handles refer to the same client instance.
    pub fn same_instance(&self, other: &CacheHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn client(&self) -> &dyn CacheClient {
        self.0.as_ref()
    }

    pub fn id(&self) -> &str {
        self.0.id()
    }

    pub fn region_names(&self) -> Result<Vec<String>, GridError> {
        self.0.region_names()
    }

    pub fn read_region(&self, region: &str) -> Result<Vec<Record>, GridError> {
        self.0.read_region(region)
    }

    pub fn close(&self) -> Result<(), GridError> {
        self.0.close()
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Creates (or re-uses) cache clients from a locator address.
pub trait CacheClientFactory: Send + Sync {
    /// Connect to the grid behind `locator`.
    ///
    /// Fails with `ConnectionFailure` when no locator answers. Never retries.
    fn create_client(&self, locator: &LocatorConfig) -> Result<CacheHandle, GridError>;

    /// Close the current client, if any. A no-op when none was established.
    fn close_client_cache(&self) -> Result<(), GridError>;
}

/// The cache shutdown side channel issued before a resource set is released.
pub trait CacheShutdown {
    fn shutdown(&self) -> Result<(), GridError>;
}

impl CacheShutdown for CacheHandle {
    fn shutdown(&self) -> Result<(), GridError> {
        self.close()
    }
}

impl<F: CacheClientFactory + ?Sized> CacheShutdown for F {
    fn shutdown(&self) -> Result<(), GridError> {
        self.close_client_cache()
    }
}
