//! Error types for gridsql-engine.

use thiserror::Error;

use gridsql_core::GridError;

/// Errors raised while planning or executing a query.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The SQL text could not be parsed.
    #[error("SQL parse error: {0}")]
    Parse(#[from] sqlparser::parser::ParserError),

    /// Valid SQL outside the supported subset.
    #[error("unsupported SQL: {0}")]
    Unsupported(String),

    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// An unqualified name matched more than one table or column.
    #[error("'{0}' is ambiguous")]
    Ambiguous(String),

    /// The statement, cursor or connection was used after being closed.
    #[error("{0} is closed")]
    Closed(&'static str),

    #[error("cursor is not positioned on a row")]
    NoCurrentRow,

    /// Reading a region from the cache failed mid-query.
    #[error("reading region '{region}' failed: {source}")]
    Cache {
        region: String,
        #[source]
        source: GridError,
    },
}

impl EngineError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        EngineError::Unsupported(what.into())
    }
}

impl From<EngineError> for GridError {
    fn from(err: EngineError) -> Self {
        GridError::query(err)
    }
}
