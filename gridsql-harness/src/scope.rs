//! Scope guard holding everything a scenario acquires.
//!
//! Resources are released by [`ScenarioScope::release`] on the normal and error
//! paths. `Drop` releases whatever is still held if the scope is unwound without
//! an explicit release.

use std::sync::Arc;

use gridsql_core::{
    release, CacheClientFactory, Closeable, Connection, GridError, NamingContext, QueryResult,
    ResourceSet, TeardownFailure,
};

/// A cache handle published in a naming context. Closing it removes the binding.
pub struct RegistryBinding {
    context: Option<Arc<dyn NamingContext>>,
    key: String,
}

impl RegistryBinding {
    pub fn new(context: Arc<dyn NamingContext>, key: impl Into<String>) -> Self {
        Self {
            context: Some(context),
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Closeable for RegistryBinding {
    fn close(&mut self) -> Result<(), GridError> {
        if let Some(context) = self.context.take() {
            context.unbind(&self.key)?;
            tracing::debug!(key = %self.key, "registry binding removed");
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("registry binding '{}'", self.key)
    }
}

/// Owns a scenario's connection, query result and registry binding.
pub struct ScenarioScope {
    cache: Arc<dyn CacheClientFactory>,
    result: Option<QueryResult>,
    connection: Option<Box<dyn Connection>>,
    binding: Option<RegistryBinding>,
    released: bool,
}

impl ScenarioScope {
    /// `cache` receives the shutdown call that precedes every release.
    pub fn new(cache: Arc<dyn CacheClientFactory>) -> Self {
        Self {
            cache,
            result: None,
            connection: None,
            binding: None,
            released: false,
        }
    }

    pub fn hold_binding(&mut self, binding: RegistryBinding) {
        self.binding = Some(binding);
    }

    /// Keep `connection` and borrow it back for executing a query.
    pub fn hold_connection(&mut self, connection: Box<dyn Connection>) -> &dyn Connection {
        &**self.connection.insert(connection)
    }

    /// Keep `result` and borrow it back for draining.
    pub fn hold_result(&mut self, result: QueryResult) -> &mut QueryResult {
        self.result.insert(result)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Shut the cache down, then close cursor, statement, connection and binding.
    ///
    /// Only the first call does any work.
    pub fn release(&mut self) -> Result<(), TeardownFailure> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let mut resources = ResourceSet::new();
        if let Some(result) = self.result.take() {
            let (cursor, statement) = result.into_parts();
            resources.push(cursor);
            resources.push(statement);
        }
        if let Some(connection) = self.connection.take() {
            resources.push(connection);
        }
        if let Some(binding) = self.binding.take() {
            resources.push(binding);
        }
        tracing::debug!(resources = ?resources, "releasing scenario resources");
        release(self.cache.as_ref(), resources)
    }
}

impl Drop for ScenarioScope {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        tracing::warn!("scenario scope dropped without explicit release");
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "release on drop failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use gridsql_core::{
        CacheHandle, Environment, LocatorConfig, NamingResolver, Statement,
        IN_MEMORY_CONTEXT_FACTORY,
    };

    #[derive(Default)]
    struct CountingFactory {
        shutdowns: AtomicUsize,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl CacheClientFactory for CountingFactory {
        fn create_client(&self, locator: &LocatorConfig) -> Result<CacheHandle, GridError> {
            Err(GridError::connection(format!("no locator at {}", locator.address())))
        }

        fn close_client_cache(&self) -> Result<(), GridError> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            self.journal.lock().unwrap().push("cache".into());
            Ok(())
        }
    }

    struct JournalConnection {
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl Closeable for JournalConnection {
        fn close(&mut self) -> Result<(), GridError> {
            self.journal.lock().unwrap().push("connection".into());
            Ok(())
        }
    }

    impl Connection for JournalConnection {
        fn create_statement(&self) -> Result<Box<dyn Statement>, GridError> {
            Err(GridError::query_msg("not used"))
        }

        fn is_closed(&self) -> bool {
            false
        }
    }

    fn in_memory_context() -> Arc<dyn NamingContext> {
        NamingResolver::with_in_memory()
            .resolve(IN_MEMORY_CONTEXT_FACTORY, &Environment::new())
            .unwrap()
    }

    #[test]
    fn release_runs_once_cache_first() {
        let factory = Arc::new(CountingFactory::default());
        let journal = Arc::clone(&factory.journal);
        let mut scope = ScenarioScope::new(factory.clone());
        scope.hold_connection(Box::new(JournalConnection {
            journal: Arc::clone(&journal),
        }));

        scope.release().expect("release");
        scope.release().expect("second release is a no-op");
        assert!(scope.is_released());
        assert_eq!(factory.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(*journal.lock().unwrap(), vec!["cache", "connection"]);
    }

    #[test]
    fn drop_releases_what_is_still_held() {
        let factory = Arc::new(CountingFactory::default());
        let journal = Arc::clone(&factory.journal);
        {
            let mut scope = ScenarioScope::new(factory.clone());
            scope.hold_connection(Box::new(JournalConnection {
                journal: Arc::clone(&journal),
            }));
        }
        assert_eq!(*journal.lock().unwrap(), vec!["cache", "connection"]);
    }

    #[test]
    fn binding_is_removed_on_release() {
        let context = in_memory_context();
        let mut scope = ScenarioScope::new(Arc::new(CountingFactory::default()));

        let directory = Arc::new(gridsql_memgrid::LocatorDirectory::new());
        directory.register("h", 1, Arc::new(gridsql_memgrid::Grid::new("m")));
        let handle = gridsql_memgrid::MemClientFactory::new(directory)
            .create_client(&LocatorConfig::new("h", 1, "p"))
            .unwrap();
        context.bind("testClientCacheObject", handle).unwrap();
        scope.hold_binding(RegistryBinding::new(Arc::clone(&context), "testClientCacheObject"));

        scope.release().expect("release");
        assert!(context.keys().is_empty());
    }
}
