//! Storage abstraction.
//!
//! Key components:
//!
//! - [`StorageBackend`] - Capability contract every backend implements
//! - [`BackendRegistry`] - Maps a selector to the backend that serves it
//! - [`MemoryBackend`] - In-memory store (browser-local style, testing)
//! - [`LocalBackend`] - Local filesystem access (with path security)
//!
//! ## Design Decisions
//!
//! - **Path-based, string paths**: a trailing `/` carries meaning (container),
//!   so paths travel as `&str` rather than `Path`, which would drop it.
//! - **Status replies**: expected conditions come back as statuses in a
//!   [`StorageReply`]; `Err` is reserved for faults that abort the request.
//! - **No protocol logic**: sidecars, naming and headers are the dispatcher's
//!   job and hold the same way for every backend.

pub mod backends;
mod error;
mod ops;
mod registry;
mod types;

pub use backends::{LocalBackend, MemoryBackend};
pub use error::{StorageError, StorageResult};
pub use ops::StorageBackend;
pub use registry::{BackendInfo, BackendRegistry};
pub use types::{Listing, ObjectDescriptor, ObjectKind, StorageReply};
