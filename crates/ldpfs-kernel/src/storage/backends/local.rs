//! Local filesystem backend.
//!
//! Serves `file:` URIs. Paths are resolved under a root directory, with
//! path security to prevent escaping it.

use async_trait::async_trait;
use http::StatusCode;
use http::header::LAST_MODIFIED;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::http_date;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::ops::StorageBackend;
use crate::storage::types::{Listing, ObjectDescriptor, ObjectKind, StorageReply};

/// Local filesystem backend.
///
/// All operations are relative to `root`. With the default root `/`, the
/// path of `file:///home/amy/notes.ttl` is the real file. With root
/// `/srv/pod`, the same URI maps to `/srv/pod/home/amy/notes.ttl`.
///
/// Path security is enforced: attempts to escape via `..` are blocked.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    read_only: bool,
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new("/")
    }
}

impl LocalBackend {
    /// Create a new local backend rooted at the given path.
    ///
    /// The root is canonicalized at construction time to handle symlinks
    /// (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            read_only: false,
        }
    }

    /// Set whether this backend is read-only.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a backend path to an absolute path within the root.
    ///
    /// Returns an error if the path escapes the root (via `..`).
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = path.trim_start_matches('/').trim_end_matches('/');

        // Handle empty path (root)
        if relative.is_empty() {
            return Ok(self.root.clone());
        }

        // Lexical check first: `..` may not climb above the root
        let mut depth: usize = 0;
        for component in Path::new(relative).components() {
            match component {
                Component::ParentDir => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| StorageError::path_escapes_root(path))?;
                }
                Component::Normal(_) => depth += 1,
                _ => {}
            }
        }

        let full = self.root.join(relative);

        // Canonicalize to resolve symlinks. For non-existent paths, canonicalize
        // the nearest existing ancestor and re-append the rest.
        let mut existing = full.as_path();
        let mut tail = Vec::new();
        while !existing.exists() {
            match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    tail.push(name.to_os_string());
                    existing = parent;
                }
                _ => break,
            }
        }
        let mut canonical = existing.canonicalize().unwrap_or_else(|_| existing.to_path_buf());
        for name in tail.iter().rev() {
            canonical.push(name);
        }

        // Verify we haven't escaped the root
        if !canonical.starts_with(&self.root) {
            return Err(StorageError::path_escapes_root(format!(
                "{} is not under {}",
                canonical.display(),
                self.root.display()
            )));
        }

        Ok(canonical)
    }

    /// A 403 reply if write operations are not allowed.
    fn refuse_if_read_only(&self) -> Option<StorageReply> {
        self.read_only
            .then(|| StorageReply::new(StorageError::ReadOnly.status()))
    }

    /// Turn expected I/O failures into status replies; anything else is a fault.
    fn expected(err: io::Error) -> StorageResult<StorageReply> {
        match err.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::AlreadyExists
            | io::ErrorKind::DirectoryNotEmpty
            | io::ErrorKind::IsADirectory
            | io::ErrorKind::NotADirectory => {
                Ok(StorageReply::new(StorageError::Io(err).status()))
            }
            _ => Err(StorageError::Io(err)),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        "ldpfs-file"
    }

    async fn probe(&self, path: &str) -> StorageResult<ObjectDescriptor> {
        let full_path = self.resolve(path)?;
        match fs::metadata(&full_path).await {
            Ok(meta) if meta.is_dir() => Ok(ObjectDescriptor::existing(ObjectKind::Container)),
            Ok(_) => Ok(ObjectDescriptor::existing(ObjectKind::Resource)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ObjectDescriptor::missing(path)),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    async fn read_resource(&self, path: &str) -> StorageResult<StorageReply> {
        let full_path = self.resolve(path)?;
        let data = match fs::read(&full_path).await {
            Ok(data) => data,
            Err(e) => return Self::expected(e),
        };

        let mut reply = StorageReply::ok().with_body(data);
        if let Ok(modified) = fs::metadata(&full_path).await.and_then(|m| m.modified()) {
            reply = reply.with_header(LAST_MODIFIED, http_date(modified));
        }
        Ok(reply)
    }

    async fn list_container(&self, path: &str) -> StorageResult<Listing> {
        let full_path = self.resolve(path)?;
        let mut dir = match fs::read_dir(&full_path).await {
            Ok(dir) => dir,
            Err(e) => return Ok(Listing::failed(Self::expected(e)?.status)),
        };

        let mut members = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(StorageError::from)? {
            members.push(entry.file_name().to_string_lossy().into_owned());
        }

        members.sort();
        Ok(Listing::ok(members))
    }

    async fn write_resource(&self, path: &str, content: &[u8]) -> StorageResult<StorageReply> {
        if let Some(refused) = self.refuse_if_read_only() {
            return Ok(refused);
        }
        let full_path = self.resolve(path)?;

        let existed = match fs::metadata(&full_path).await {
            Ok(meta) if meta.is_dir() => return Ok(StorageReply::conflict()),
            Ok(_) => true,
            Err(_) => false,
        };

        // Ensure parent directory exists
        if let Some(parent) = full_path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                return Self::expected(e);
            }
        }

        if let Err(e) = fs::write(&full_path, content).await {
            return Self::expected(e);
        }

        Ok(if existed {
            StorageReply::ok()
        } else {
            StorageReply::created()
        })
    }

    async fn create_container(&self, path: &str) -> StorageResult<StorageReply> {
        if let Some(refused) = self.refuse_if_read_only() {
            return Ok(refused);
        }
        let full_path = self.resolve(path)?;

        match fs::metadata(&full_path).await {
            Ok(meta) if meta.is_dir() => return Ok(StorageReply::ok()),
            Ok(_) => return Ok(StorageReply::conflict()),
            Err(_) => {}
        }

        match fs::create_dir_all(&full_path).await {
            Ok(()) => Ok(StorageReply::created()),
            Err(e) => Self::expected(e),
        }
    }

    async fn ensure_parent_containers(&self, path: &str) -> StorageResult<StorageReply> {
        if let Some(refused) = self.refuse_if_read_only() {
            return Ok(refused);
        }
        let full_path = self.resolve(path)?;
        let Some(parent) = full_path.parent() else {
            return Ok(StorageReply::ok());
        };

        match fs::metadata(parent).await {
            Ok(meta) if meta.is_dir() => return Ok(StorageReply::ok()),
            Ok(_) => return Ok(StorageReply::conflict()),
            Err(_) => {}
        }

        match fs::create_dir_all(parent).await {
            Ok(()) => Ok(StorageReply::created()),
            Err(e) => Self::expected(e),
        }
    }

    async fn delete_resource(&self, path: &str) -> StorageResult<StorageReply> {
        if let Some(refused) = self.refuse_if_read_only() {
            return Ok(refused);
        }
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(StorageReply::ok()),
            Err(e) => Self::expected(e),
        }
    }

    async fn delete_container(&self, path: &str) -> StorageResult<StorageReply> {
        if let Some(refused) = self.refuse_if_read_only() {
            return Ok(refused);
        }
        let full_path = self.resolve(path)?;
        if full_path == self.root {
            return Ok(StorageReply::new(StatusCode::FORBIDDEN));
        }
        match fs::remove_dir(&full_path).await {
            Ok(()) => Ok(StorageReply::ok()),
            Err(e) => Self::expected(e),
        }
    }
}
