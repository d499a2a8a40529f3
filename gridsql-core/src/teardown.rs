//! Ordered release of acquired resources.
//!
//! [`release`] issues the cache shutdown first, then closes every resource of a
//! [`ResourceSet`] in the order it was supplied. A failing close never stops the
//! remaining ones; every failure is reported in a single [`TeardownFailure`].
//!
//! The set is closed in insertion order, not reversed. Callers push resources in a
//! safe closing order (cursor, statement, connection).

use crate::cache::CacheShutdown;
use crate::error::{CloseFailure, GridError, TeardownFailure};

/// Something that holds an external resource and must be closed exactly once.
pub trait Closeable {
    fn close(&mut self) -> Result<(), GridError>;

    /// Short label used when reporting a close failure.
    fn describe(&self) -> String {
        "resource".to_string()
    }
}

impl<T: Closeable + ?Sized> Closeable for Box<T> {
    fn close(&mut self) -> Result<(), GridError> {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Ordered resources awaiting release.
#[derive(Default)]
pub struct ResourceSet {
    resources: Vec<Box<dyn Closeable>>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource; it is closed after everything pushed before it.
    pub fn push(&mut self, resource: impl Closeable + 'static) {
        self.resources.push(Box::new(resource));
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.describe()).collect()
    }
}

impl std::fmt::Debug for ResourceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSet")
            .field("resources", &self.descriptions())
            .finish()
    }
}

/// Shut the cache down, then close `resources` in order.
///
/// Attempts every release and reports every failure, in order. The shutdown
/// failure, if any, comes first.
pub fn release<S: CacheShutdown + ?Sized>(
    cache: &S,
    resources: ResourceSet,
) -> Result<(), TeardownFailure> {
    let mut causes = Vec::new();

    if let Err(source) = cache.shutdown() {
        tracing::warn!(error = %source, "cache shutdown failed during teardown");
        causes.push(CloseFailure {
            resource: "cache client".to_string(),
            source,
        });
    }

    let total = resources.len();
    for mut resource in resources.resources {
        let resource_name = resource.describe();
        match resource.close() {
            Ok(()) => tracing::debug!(resource = %resource_name, "closed"),
            Err(source) => {
                tracing::warn!(resource = %resource_name, error = %source, "close failed");
                causes.push(CloseFailure {
                    resource: resource_name,
                    source,
                });
            }
        }
    }

    if causes.is_empty() {
        tracing::debug!(resources = total, "teardown complete");
        Ok(())
    } else {
        Err(TeardownFailure { causes })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
