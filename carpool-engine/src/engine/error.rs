//! Errors returned by engine operations.

use crate::domain::InvalidSeatCount;
use crate::route::ResolveError;
use crate::store::StoreError;

/// Outcome of a rejected operation.
///
/// No state has changed when an operation returns any of these.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Input is malformed or the caller may not do this
    #[error("{0}")]
    Validation(String),

    /// The current state forbids the operation
    #[error("{0}")]
    Conflict(String),

    /// The routing provider could not produce a route
    #[error("route unavailable: {0}")]
    RouteUnavailable(#[from] ResolveError),

    /// A trip or user does not exist
    #[error("{0}")]
    NotFound(String),

    /// The store failed
    #[error("store error: {0}")]
    Store(StoreError),
}

impl EngineError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        EngineError::Conflict(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        EngineError::NotFound(msg.into())
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            // The trip was deleted while the operation was in flight.
            StoreError::MissingTrip(id) => EngineError::NotFound(format!("trip {id} not found")),
            other => EngineError::Store(other),
        }
    }
}

impl From<InvalidSeatCount> for EngineError {
    fn from(e: InvalidSeatCount) -> Self {
        EngineError::Validation(e.to_string())
    }
}
