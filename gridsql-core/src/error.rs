//! Error types for gridsql-core.

use thiserror::Error;

/// Boxed cause carried by failures that wrap a lower-level error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that can arise while bootstrapping, querying, or tearing down.
#[derive(Debug, Error)]
pub enum GridError {
    /// A cache client or relational connection could not be established.
    #[error("connection failure: {message}")]
    ConnectionFailure {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A naming context could not be created, or a key could not be bound or resolved.
    #[error("registry unavailable: {message}")]
    RegistryUnavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Execution-time failure reported by the relational engine.
    #[error("query failure: {source}")]
    QueryFailure {
        #[source]
        source: BoxError,
    },

    /// A model descriptor or discovery configuration was rejected.
    #[error("invalid model: {message}")]
    InvalidModel { message: String },

    /// One or more resources failed to close.
    #[error(transparent)]
    Teardown(#[from] TeardownFailure),

    /// A scenario failed and its teardown failed too. The primary cause wins.
    #[error("{primary} (teardown also failed: {teardown})")]
    WithTeardown {
        #[source]
        primary: Box<GridError>,
        teardown: TeardownFailure,
    },
}

impl GridError {
    pub fn connection(message: impl Into<String>) -> Self {
        GridError::ConnectionFailure {
            message: message.into(),
            source: None,
        }
    }

    pub fn registry(message: impl Into<String>) -> Self {
        GridError::RegistryUnavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_model(message: impl Into<String>) -> Self {
        GridError::InvalidModel {
            message: message.into(),
        }
    }

    /// A `QueryFailure` wrapping an arbitrary cause.
    pub fn query(source: impl Into<BoxError>) -> Self {
        GridError::QueryFailure {
            source: source.into(),
        }
    }

    /// A `QueryFailure` whose cause is a plain message.
    pub fn query_msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        GridError::QueryFailure {
            source: message.into(),
        }
    }

    /// Re-labels any error as a `QueryFailure`, keeping the original as its cause.
    pub fn into_query_failure(self) -> Self {
        match self {
            GridError::QueryFailure { .. } => self,
            other => GridError::QueryFailure {
                source: Box::new(other),
            },
        }
    }

    /// Combines the outcome of a scenario with the outcome of its teardown.
    ///
    /// The primary failure is kept as the reported cause; a teardown failure is
    /// attached rather than dropped.
    pub fn with_teardown(self, teardown: Result<(), TeardownFailure>) -> Self {
        match teardown {
            Ok(()) => self,
            Err(teardown) => GridError::WithTeardown {
                primary: Box::new(self),
                teardown,
            },
        }
    }

    /// The failure that decided the outcome, looking through `WithTeardown`.
    pub fn primary(&self) -> &GridError {
        match self {
            GridError::WithTeardown { primary, .. } => primary.primary(),
            other => other,
        }
    }
}

/// One resource that failed to close during teardown.
#[derive(Debug, Error)]
#[error("{resource}: {source}")]
pub struct CloseFailure {
    pub resource: String,
    #[source]
    pub source: GridError,
}

/// Aggregate of every close failure observed during a teardown, in release order.
#[derive(Debug, Error)]
#[error("teardown failed for {} resource(s): {}", .causes.len(), render_causes(.causes))]
pub struct TeardownFailure {
    pub causes: Vec<CloseFailure>,
}

fn render_causes(causes: &[CloseFailure]) -> String {
    causes
        .iter()
        .enumerate()
        .map(|(i, cause)| format!("[{}] {cause}", i + 1))
        .collect::<Vec<_>>()
        .join("; ")
}
