//! Storage error types.

use http::StatusCode;
use std::io;
use thiserror::Error;

/// Backend fault.
///
/// Expected conditions (a missing file on delete, a non-empty container)
/// are reported by backends as reply statuses. A `StorageError` that
/// escapes a backend call is fatal to the request that triggered it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend is read-only.
    #[error("backend is read-only")]
    ReadOnly,

    /// Expected a container.
    #[error("not a container: {0}")]
    NotAContainer(String),

    /// Expected a resource.
    #[error("is a container: {0}")]
    IsAContainer(String),

    /// Path escapes root (security violation).
    #[error("path escapes root: {0}")]
    PathEscapesRoot(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl StorageError {
    /// Create a NotAContainer error.
    pub fn not_a_container(path: impl Into<String>) -> Self {
        Self::NotAContainer(path.into())
    }

    /// Create an IsAContainer error.
    pub fn is_a_container(path: impl Into<String>) -> Self {
        Self::IsAContainer(path.into())
    }

    /// Create a PathEscapesRoot error.
    pub fn path_escapes_root(path: impl Into<String>) -> Self {
        Self::PathEscapesRoot(path.into())
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Nearest response status for this fault.
    ///
    /// Backends use this to turn an expected fault into a status reply.
    pub fn status(&self) -> StatusCode {
        match self {
            StorageError::NotAContainer(_) | StorageError::IsAContainer(_) => {
                StatusCode::CONFLICT
            }
            StorageError::ReadOnly | StorageError::PathEscapesRoot(_) => StatusCode::FORBIDDEN,
            StorageError::Io(e) => match e.kind() {
                io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
                io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
                io::ErrorKind::AlreadyExists
                | io::ErrorKind::DirectoryNotEmpty
                | io::ErrorKind::IsADirectory
                | io::ErrorKind::NotADirectory => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            StorageError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Storage result type.
pub type StorageResult<T> = Result<T, StorageError>;
