//! # ldpfs-kernel
//!
//! Linked-Data-Platform semantics over pluggable storage.
//!
//! Requests shaped like HTTP (GET, HEAD, OPTIONS, POST, PUT, PATCH, DELETE)
//! are addressed by URI and served from whichever backend the URI selects:
//! - `file:` URIs go to the local filesystem backend
//! - any other scheme picks a backend by its authority (`app://mem/...`)
//!
//! The dispatcher keeps the same container/resource rules for every
//! backend: a trailing `/` marks a container, containers list their members
//! as Turtle, every object may carry `.acl` and `.meta` sidecars that are
//! deleted with it, POSTed names never collide, and response headers are
//! synthesized from the object's kind and extension.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod links;
pub mod listing;
pub mod media;
pub mod naming;
pub mod patch;
pub mod request;
pub mod storage;
pub mod uri;

pub use config::{BackendConfig, BackendKind, ConfigError, ConfigResult, LdpConfig};
pub use dispatch::{Clock, Dispatcher};
pub use error::{RestError, RestResult};
pub use patch::{ContentPatcher, PatchError, PatchOutcome, PatchRequest, PatchResult};
pub use request::{Request, Response, Verb};
pub use storage::{
    BackendInfo, BackendRegistry, Listing, LocalBackend, MemoryBackend, ObjectDescriptor,
    ObjectKind, StorageBackend, StorageError, StorageReply, StorageResult,
};
pub use uri::{PathStyle, Target, UriError};
