//! Backend capability contract.
//!
//! Every storage backend implements [`StorageBackend`]. The trait carries no
//! protocol logic: no sidecars, no naming, no headers. Those live in the
//! dispatcher and apply uniformly to whichever backend is plugged in.

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};

use super::types::{Listing, ObjectDescriptor, StorageReply};
use super::StorageResult;

/// Storage backend operations.
///
/// Paths are normalized, `/`-separated and absolute within the backend's
/// namespace. A trailing `/` marks a container path. Backends are stateless
/// from the caller's point of view: every call takes the full path.
///
/// Expected conditions are reported through the reply status. Returning
/// `Err` aborts the request.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Display name, advertised in `x-powered-by`.
    fn name(&self) -> &str;

    // ========================================================================
    // Reading
    // ========================================================================

    /// Report the kind of object at `path` and whether it exists.
    ///
    /// For a missing path, the kind is the one implied by its shape.
    async fn probe(&self, path: &str) -> StorageResult<ObjectDescriptor>;

    /// Read a resource's content.
    async fn read_resource(&self, path: &str) -> StorageResult<StorageReply>;

    /// List the member names of a container.
    async fn list_container(&self, path: &str) -> StorageResult<Listing>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write a resource, creating or replacing it.
    ///
    /// 201 when created, 200 when replaced.
    async fn write_resource(&self, path: &str, content: &[u8]) -> StorageResult<StorageReply>;

    /// Create a container.
    async fn create_container(&self, path: &str) -> StorageResult<StorageReply>;

    /// Create any missing ancestors of `path`.
    ///
    /// 201 if something was created, 200 if all ancestors already existed.
    async fn ensure_parent_containers(&self, path: &str) -> StorageResult<StorageReply>;

    /// Delete a resource.
    async fn delete_resource(&self, path: &str) -> StorageResult<StorageReply>;

    /// Delete an empty container.
    async fn delete_container(&self, path: &str) -> StorageResult<StorageReply>;

    // ========================================================================
    // Optional hooks (default implementations)
    // ========================================================================

    /// Headers this backend wants on every response for `path`.
    ///
    /// They take precedence over synthesized defaults.
    fn custom_headers(&self, _path: &str) -> Option<HeaderMap> {
        None
    }

    /// Backend-specific container serialization.
    ///
    /// Return `None` to use the default Turtle listing.
    async fn serialize_container(
        &self,
        _path: &str,
        _members: &[String],
    ) -> StorageResult<Option<(StatusCode, String)>> {
        Ok(None)
    }

    /// Check if a path exists.
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.probe(path).await?.exists)
    }
}
