//! gridsql core library: discovery types, model descriptor, cache and naming
//! interfaces, the query executor, and ordered teardown.
//!
//! Public API surface:
//! - [`types`]: discovery configs, values, records
//! - [`model`]: [`ModelDescriptor`] and its wire format
//! - [`error`]: [`GridError`] taxonomy
//! - [`cache`]: [`CacheHandle`], [`CacheClientFactory`]
//! - [`naming`]: [`NamingResolver`] and naming contexts
//! - [`relational`]: front-end interface, [`QueryExecutor`], [`QueryResult`]
//! - [`teardown`]: [`ResourceSet`] and [`release`]

pub mod cache;
pub mod error;
pub mod model;
pub mod naming;
pub mod relational;
pub mod teardown;
pub mod types;

pub use cache::{CacheClient, CacheClientFactory, CacheHandle, CacheShutdown};
pub use error::{BoxError, CloseFailure, GridError, TeardownFailure};
pub use model::{GridOperand, ModelDescriptor, SchemaDescriptor, SchemaKind};
pub use naming::{
    ContextFactory, Environment, InMemoryContextFactory, NamingContext, NamingResolver,
    IN_MEMORY_CONTEXT_FACTORY, INITIAL_CONTEXT_FACTORY,
};
pub use relational::{
    Connection, Properties, QueryExecutor, QueryResult, RelationalDriver, ResultMetadata,
    ResultSet, Row, Statement, MODEL_PROPERTY,
};
pub use teardown::{release, Closeable, ResourceSet};
pub use types::{DiscoveryConfig, LocatorConfig, Record, RegionName, RegistryConfig, Value};
