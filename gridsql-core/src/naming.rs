//! Naming registry: publish a [`CacheHandle`] under a key, look it up elsewhere.
//!
//! # Provider model
//!
//! A [`NamingResolver`] holds named [`ContextFactory`] providers. A context is obtained
//! with [`NamingResolver::get_context`] (factory name read from the
//! [`INITIAL_CONTEXT_FACTORY`] environment key) or [`NamingResolver::resolve`]
//! (factory name passed explicitly). Contexts created by the built-in
//! [`InMemoryContextFactory`] share one binding table, so a handle bound by one
//! component is visible to every other context of that provider.
//!
//! The resolver is passed to its users explicitly; there is no process-global registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::cache::CacheHandle;
use crate::error::GridError;

/// Environment key naming the context factory to use.
pub const INITIAL_CONTEXT_FACTORY: &str = "naming.factory.initial";

/// Name of the built-in in-memory provider.
pub const IN_MEMORY_CONTEXT_FACTORY: &str = "gridsql.naming.in-memory";

/// Context creation environment.
pub type Environment = BTreeMap<String, String>;

/// A directory of cache handles keyed by name.
pub trait NamingContext: Send + Sync {
    /// Publish `handle` under `key`. Fails if the key is already bound.
    fn bind(&self, key: &str, handle: CacheHandle) -> Result<(), GridError>;

    /// Publish `handle` under `key`, replacing any previous binding.
    fn rebind(&self, key: &str, handle: CacheHandle) -> Result<(), GridError>;

    /// Retrieve the handle bound under `key`.
    fn lookup(&self, key: &str) -> Result<CacheHandle, GridError>;

    /// Remove the binding for `key`, returning it if present.
    fn unbind(&self, key: &str) -> Result<Option<CacheHandle>, GridError>;

    /// Bound keys in sorted order.
    fn keys(&self) -> Vec<String>;

    /// The environment this context was created with.
    fn environment(&self) -> &Environment;
}

/// A named provider of naming contexts.
pub trait ContextFactory: Send + Sync {
    fn name(&self) -> &str;

    fn create_context(&self, env: &Environment) -> Result<Arc<dyn NamingContext>, GridError>;
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Registry of context-factory providers.
#[derive(Default)]
pub struct NamingResolver {
    providers: RwLock<BTreeMap<String, Arc<dyn ContextFactory>>>,
}

impl NamingResolver {
    /// A resolver with no providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver with the [`InMemoryContextFactory`] registered.
    pub fn with_in_memory() -> Self {
        let resolver = Self::new();
        resolver.register(Arc::new(InMemoryContextFactory::new()));
        resolver
    }

    /// Register (or replace) a provider under its own name.
    pub fn register(&self, factory: Arc<dyn ContextFactory>) {
        let name = factory.name().to_string();
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, factory);
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Create a context from an environment carrying [`INITIAL_CONTEXT_FACTORY`].
    pub fn get_context(&self, env: &Environment) -> Result<Arc<dyn NamingContext>, GridError> {
        let name = env.get(INITIAL_CONTEXT_FACTORY).ok_or_else(|| {
            GridError::registry(format!(
                "environment does not name a context factory ({INITIAL_CONTEXT_FACTORY})"
            ))
        })?;
        let factory = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| {
                GridError::registry(format!("no naming provider registered as '{name}'"))
            })?;
        let context = factory.create_context(env)?;
        tracing::debug!(factory = %name, "naming context created");
        Ok(context)
    }

    /// Create a context from `factory_name`, with `overrides` layered on top.
    pub fn resolve(
        &self,
        factory_name: &str,
        overrides: &Environment,
    ) -> Result<Arc<dyn NamingContext>, GridError> {
        let mut env = overrides.clone();
        env.insert(INITIAL_CONTEXT_FACTORY.to_string(), factory_name.to_string());
        self.get_context(&env)
    }
}

// ---------------------------------------------------------------------------
// In-memory provider
// ---------------------------------------------------------------------------

type BindingTable = Arc<RwLock<HashMap<String, CacheHandle>>>;

/// Provider whose contexts share one in-process binding table.
#[derive(Default)]
pub struct InMemoryContextFactory {
    bindings: BindingTable,
}

impl InMemoryContextFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContextFactory for InMemoryContextFactory {
    fn name(&self) -> &str {
        IN_MEMORY_CONTEXT_FACTORY
    }

    fn create_context(&self, env: &Environment) -> Result<Arc<dyn NamingContext>, GridError> {
        Ok(Arc::new(InMemoryContext {
            bindings: Arc::clone(&self.bindings),
            env: env.clone(),
        }))
    }
}

/// A view onto an [`InMemoryContextFactory`]'s binding table.
pub struct InMemoryContext {
    bindings: BindingTable,
    env: Environment,
}

impl NamingContext for InMemoryContext {
    fn bind(&self, key: &str, handle: CacheHandle) -> Result<(), GridError> {
        let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
        if bindings.contains_key(key) {
            return Err(GridError::registry(format!("name '{key}' is already bound")));
        }
        tracing::debug!(key, client = handle.id(), "binding cache handle");
        bindings.insert(key.to_string(), handle);
        Ok(())
    }

    fn rebind(&self, key: &str, handle: CacheHandle) -> Result<(), GridError> {
        tracing::debug!(key, client = handle.id(), "rebinding cache handle");
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), handle);
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<CacheHandle, GridError> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| GridError::registry(format!("name '{key}' is not bound")))
    }

    fn unbind(&self, key: &str) -> Result<Option<CacheHandle>, GridError> {
        Ok(self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key))
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn environment(&self) -> &Environment {
        &self.env
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
