//! In-memory storage backend.
//!
//! Used for the browser-local style store and for testing. All data is
//! ephemeral.

use async_trait::async_trait;
use http::header::LAST_MODIFIED;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::SystemTime;

use super::http_date;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::ops::StorageBackend;
use crate::storage::types::{Listing, ObjectDescriptor, ObjectKind, StorageReply};

/// Entry in the memory store.
#[derive(Debug, Clone)]
enum Entry {
    Resource { data: Vec<u8>, modified: SystemTime },
    Container,
}

impl Entry {
    fn kind(&self) -> ObjectKind {
        match self {
            Entry::Resource { .. } => ObjectKind::Resource,
            Entry::Container => ObjectKind::Container,
        }
    }
}

/// In-memory storage backend.
///
/// Keys are normalized paths without a trailing `/`; the root is `/` and
/// always exists. Thread-safe via internal `RwLock`.
#[derive(Debug)]
pub struct MemoryBackend {
    name: String,
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::named("ldpfs-memory")
    }

    /// Create a new empty store with a custom display name.
    pub fn named(name: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("/".to_string(), Entry::Container);
        Self {
            name: name.into(),
            entries: RwLock::new(entries),
        }
    }

    /// Normalize a path: leading `/`, no trailing `/`, `.` and `..` resolved.
    fn normalize(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                s => parts.push(s),
            }
        }
        format!("/{}", parts.join("/"))
    }

    /// Parent of a normalized path. The root has none.
    fn parent(normalized: &str) -> Option<&str> {
        if normalized == "/" {
            return None;
        }
        match normalized.rsplit_once('/') {
            Some(("", _)) => Some("/"),
            Some((parent, _)) => Some(parent),
            None => None,
        }
    }

    /// Ancestors of a normalized path, outermost first, root excluded.
    fn ancestors(normalized: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Self::parent(normalized);
        while let Some(p) = current {
            if p != "/" {
                chain.push(p.to_string());
            }
            current = Self::parent(p);
        }
        chain.reverse();
        chain
    }

    /// Create missing ancestors while holding the write lock.
    ///
    /// Returns `Ok(true)` if anything was created, `Err(path)` if a resource
    /// sits where a container is needed.
    fn create_ancestors(
        entries: &mut BTreeMap<String, Entry>,
        normalized: &str,
    ) -> Result<bool, String> {
        let mut created = false;
        for ancestor in Self::ancestors(normalized) {
            match entries.get(&ancestor) {
                Some(Entry::Container) => {}
                Some(Entry::Resource { .. }) => return Err(ancestor),
                None => {
                    entries.insert(ancestor, Entry::Container);
                    created = true;
                }
            }
        }
        Ok(created)
    }

    fn has_children(entries: &BTreeMap<String, Entry>, normalized: &str) -> bool {
        entries
            .keys()
            .any(|k| k != normalized && Self::parent(k) == Some(normalized))
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, path: &str) -> StorageResult<ObjectDescriptor> {
        let normalized = Self::normalize(path);
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::other("lock poisoned"))?;

        Ok(match entries.get(&normalized) {
            Some(entry) => ObjectDescriptor::existing(entry.kind()),
            None => ObjectDescriptor::missing(path),
        })
    }

    async fn read_resource(&self, path: &str) -> StorageResult<StorageReply> {
        let normalized = Self::normalize(path);
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::other("lock poisoned"))?;

        match entries.get(&normalized) {
            Some(Entry::Resource { data, modified }) => Ok(StorageReply::ok()
                .with_body(data.clone())
                .with_header(LAST_MODIFIED, http_date(*modified))),
            Some(Entry::Container) => Err(StorageError::is_a_container(normalized)),
            None => Ok(StorageReply::not_found()),
        }
    }

    async fn list_container(&self, path: &str) -> StorageResult<Listing> {
        let normalized = Self::normalize(path);
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::other("lock poisoned"))?;

        match entries.get(&normalized) {
            Some(Entry::Container) => {}
            Some(Entry::Resource { .. }) => {
                return Err(StorageError::not_a_container(normalized));
            }
            None => return Ok(Listing::failed(http::StatusCode::NOT_FOUND)),
        }

        // BTreeMap order keeps listings stable
        let members = entries
            .keys()
            .filter(|k| k.as_str() != normalized && Self::parent(k) == Some(normalized.as_str()))
            .filter_map(|k| k.rsplit_once('/').map(|(_, name)| name.to_string()))
            .collect();

        Ok(Listing::ok(members))
    }

    async fn write_resource(&self, path: &str, content: &[u8]) -> StorageResult<StorageReply> {
        let normalized = Self::normalize(path);
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::other("lock poisoned"))?;

        if Self::create_ancestors(&mut entries, &normalized).is_err() {
            return Ok(StorageReply::conflict());
        }

        let status = match entries.get(&normalized) {
            Some(Entry::Container) => return Ok(StorageReply::conflict()),
            Some(Entry::Resource { .. }) => StorageReply::ok(),
            None => StorageReply::created(),
        };

        entries.insert(
            normalized,
            Entry::Resource {
                data: content.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(status)
    }

    async fn create_container(&self, path: &str) -> StorageResult<StorageReply> {
        let normalized = Self::normalize(path);
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::other("lock poisoned"))?;

        if Self::create_ancestors(&mut entries, &normalized).is_err() {
            return Ok(StorageReply::conflict());
        }

        match entries.get(&normalized) {
            Some(Entry::Container) => Ok(StorageReply::ok()),
            Some(Entry::Resource { .. }) => Ok(StorageReply::conflict()),
            None => {
                entries.insert(normalized, Entry::Container);
                Ok(StorageReply::created())
            }
        }
    }

    async fn ensure_parent_containers(&self, path: &str) -> StorageResult<StorageReply> {
        let normalized = Self::normalize(path);
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::other("lock poisoned"))?;

        match Self::create_ancestors(&mut entries, &normalized) {
            Ok(true) => Ok(StorageReply::created()),
            Ok(false) => Ok(StorageReply::ok()),
            Err(_) => Ok(StorageReply::conflict()),
        }
    }

    async fn delete_resource(&self, path: &str) -> StorageResult<StorageReply> {
        let normalized = Self::normalize(path);
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::other("lock poisoned"))?;

        match entries.get(&normalized) {
            Some(Entry::Resource { .. }) => {
                entries.remove(&normalized);
                Ok(StorageReply::ok())
            }
            Some(Entry::Container) => Ok(StorageReply::conflict()),
            None => Ok(StorageReply::not_found()),
        }
    }

    async fn delete_container(&self, path: &str) -> StorageResult<StorageReply> {
        let normalized = Self::normalize(path);
        if normalized == "/" {
            return Ok(StorageReply::new(http::StatusCode::FORBIDDEN));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::other("lock poisoned"))?;

        match entries.get(&normalized) {
            Some(Entry::Container) => {}
            Some(Entry::Resource { .. }) => return Ok(StorageReply::conflict()),
            None => return Ok(StorageReply::not_found()),
        }

        if Self::has_children(&entries, &normalized) {
            return Ok(StorageReply::conflict());
        }

        entries.remove(&normalized);
        Ok(StorageReply::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[tokio::test]
    async fn test_write_and_read() {
        let store = MemoryBackend::new();
        let reply = store.write_resource("/test.ttl", b"<> a <#Thing>.").await.unwrap();
        assert_eq!(reply.status, StatusCode::CREATED);

        let reply = store.read_resource("/test.ttl").await.unwrap();
        assert!(reply.headers.contains_key(LAST_MODIFIED));
        assert_eq!(reply.body.unwrap(), b"<> a <#Thing>.");
    }

    #[tokio::test]
    async fn test_overwrite_is_ok_not_created() {
        let store = MemoryBackend::new();
        store.write_resource("/a.txt", b"one").await.unwrap();
        let reply = store.write_resource("/a.txt", b"two").await.unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(store.read_resource("/a.txt").await.unwrap().body.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_probe_existing_and_missing() {
        let store = MemoryBackend::new();
        store.create_container("/dir/").await.unwrap();

        // an existing container is reported as such without the trailing slash
        let d = store.probe("/dir").await.unwrap();
        assert!(d.exists);
        assert!(d.kind.is_container());

        let d = store.probe("/ghost/").await.unwrap();
        assert!(!d.exists);
        assert!(d.kind.is_container());

        let d = store.probe("/ghost.ttl").await.unwrap();
        assert!(!d.exists);
        assert!(d.kind.is_resource());
    }

    #[tokio::test]
    async fn test_list_container() {
        let store = MemoryBackend::new();
        store.create_container("/c/sub/").await.unwrap();
        store.write_resource("/c/a.ttl", b"").await.unwrap();
        store.write_resource("/c/sub/deep.ttl", b"").await.unwrap();

        let listing = store.list_container("/c/").await.unwrap();
        assert_eq!(listing.members, vec!["a.ttl".to_string(), "sub".to_string()]);

        let root = store.list_container("/").await.unwrap();
        assert_eq!(root.members, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_list_missing_container() {
        let store = MemoryBackend::new();
        let listing = store.list_container("/nope/").await.unwrap();
        assert_eq!(listing.status, StatusCode::NOT_FOUND);
        assert!(listing.members.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_parent_containers() {
        let store = MemoryBackend::new();
        let reply = store.ensure_parent_containers("/a/b/c.ttl").await.unwrap();
        assert_eq!(reply.status, StatusCode::CREATED);
        assert!(store.probe("/a/b/").await.unwrap().exists);
        assert!(!store.probe("/a/b/c.ttl").await.unwrap().exists);

        let reply = store.ensure_parent_containers("/a/b/c.ttl").await.unwrap();
        assert_eq!(reply.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_resource_blocks_parent_creation() {
        let store = MemoryBackend::new();
        store.write_resource("/file", b"x").await.unwrap();
        let reply = store.ensure_parent_containers("/file/child.ttl").await.unwrap();
        assert_eq!(reply.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_delete_container_requires_empty() {
        let store = MemoryBackend::new();
        store.write_resource("/c/a.ttl", b"").await.unwrap();

        let reply = store.delete_container("/c/").await.unwrap();
        assert_eq!(reply.status, StatusCode::CONFLICT);

        store.delete_resource("/c/a.ttl").await.unwrap();
        let reply = store.delete_container("/c/").await.unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert!(!store.probe("/c/").await.unwrap().exists);
    }

    #[tokio::test]
    async fn test_delete_missing_and_root() {
        let store = MemoryBackend::new();
        assert_eq!(
            store.delete_resource("/nothing").await.unwrap().status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store.delete_container("/").await.unwrap().status,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_path_normalization() {
        let store = MemoryBackend::new();
        store.write_resource("/a/b/c.ttl", b"").await.unwrap();

        assert!(store.exists("a/b/c.ttl").await.unwrap());
        assert!(store.exists("/a/./b/c.ttl").await.unwrap());
        assert!(store.exists("/a/b/../b/c.ttl").await.unwrap());
        assert!(store.exists("//a//b/c.ttl").await.unwrap());
    }
}
