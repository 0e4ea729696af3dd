//! Request-level error types.
//!
//! Protocol refusals (404, 405, 409, ...) are ordinary responses. A
//! [`RestError`] means the request could not be served at all.

use thiserror::Error;

use crate::storage::StorageError;

/// Fatal request error.
#[derive(Debug, Error)]
pub enum RestError {
    /// No backend is registered for the selector.
    #[error("did not recognize backend selector: {0}")]
    UnknownBackend(String),

    /// The URI belongs to a network scheme this layer does not serve.
    #[error("not a local scheme: {0}")]
    RemoteScheme(String),

    /// A backend raised a fault.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RestError {
    /// Create an UnknownBackend error.
    pub fn unknown_backend(selector: impl Into<String>) -> Self {
        Self::UnknownBackend(selector.into())
    }

    /// Create a RemoteScheme error.
    pub fn remote_scheme(uri: impl Into<String>) -> Self {
        Self::RemoteScheme(uri.into())
    }
}

/// Request result type.
pub type RestResult<T> = Result<T, RestError>;
