//! # gridsql-engine
//!
//! A small relational front-end that exposes cache regions as tables.
//!
//! [`GridDriver`] reads the `model` connection property, builds a [`Catalog`] with
//! one table per listed region and answers a subset of SQL (`SELECT` with inner
//! joins and `WHERE`) through lazily evaluated cursors.

pub mod catalog;
pub mod cursor;
pub mod driver;
pub mod error;
pub mod plan;

pub use catalog::{Catalog, GridSchema, GridSchemaFactory, Table};
pub use cursor::GridResultSet;
pub use driver::{GridConnection, GridDriver, GridStatement};
pub use error::EngineError;

/// Factory identifier a schema descriptor must name to be served by this engine.
pub const GRID_SCHEMA_FACTORY: &str = "gridsql.adapter.GridSchemaFactory";
