//! Core storage types.
//!
//! Backends speak in these types; the dispatcher turns them into responses.

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of object in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum ObjectKind {
    /// Leaf node holding content.
    Resource,
    /// Node grouping members, like a directory.
    Container,
}

impl ObjectKind {
    /// Kind implied by the shape of a path: a trailing `/` means Container.
    pub fn from_path_shape(path: &str) -> Self {
        if path.ends_with('/') {
            ObjectKind::Container
        } else {
            ObjectKind::Resource
        }
    }

    /// Returns true if this is a container.
    pub fn is_container(&self) -> bool {
        matches!(self, ObjectKind::Container)
    }

    /// Returns true if this is a resource.
    pub fn is_resource(&self) -> bool {
        matches!(self, ObjectKind::Resource)
    }
}

/// Result of probing a path.
///
/// `kind` is meaningful even when `exists` is false: a missing path still
/// has the kind its shape implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    pub kind: ObjectKind,
    pub exists: bool,
}

impl ObjectDescriptor {
    /// Descriptor for an object that exists.
    pub fn existing(kind: ObjectKind) -> Self {
        Self { kind, exists: true }
    }

    /// Descriptor for a missing path, typed by its shape.
    pub fn missing(path: &str) -> Self {
        Self {
            kind: ObjectKind::from_path_shape(path),
            exists: false,
        }
    }
}

/// What a backend hands back from an operation.
#[derive(Debug, Clone)]
pub struct StorageReply {
    /// Outcome status.
    pub status: StatusCode,
    /// Content, for reads.
    pub body: Option<Vec<u8>>,
    /// Headers the backend wants on the response.
    pub headers: HeaderMap,
}

impl StorageReply {
    /// Create a reply with the given status and nothing else.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// 200 OK.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// 201 Created.
    pub fn created() -> Self {
        Self::new(StatusCode::CREATED)
    }

    /// 404 Not Found.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// 409 Conflict.
    pub fn conflict() -> Self {
        Self::new(StatusCode::CONFLICT)
    }

    /// Attach content.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns true for 200 and 201, the statuses that let a sequence continue.
    pub fn is_ok_or_created(&self) -> bool {
        self.status == StatusCode::OK || self.status == StatusCode::CREATED
    }
}

/// Container member listing.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Outcome status.
    pub status: StatusCode,
    /// Member names (not full paths).
    pub members: Vec<String>,
    /// Headers the backend wants on the response.
    pub headers: HeaderMap,
}

impl Listing {
    /// Successful listing.
    pub fn ok(members: Vec<String>) -> Self {
        Self {
            status: StatusCode::OK,
            members,
            headers: HeaderMap::new(),
        }
    }

    /// Failed listing carrying only a status.
    pub fn failed(status: StatusCode) -> Self {
        Self {
            status,
            members: Vec::new(),
            headers: HeaderMap::new(),
        }
    }
}
