//! Link resources (sidecars).
//!
//! Every resource or container may own an access-control document (`.acl`)
//! and a description (`.meta`), plus the acl of that description
//! (`.meta.acl`). For a resource `r.ttl` they are `r.ttl.acl`, `r.ttl.meta`
//! and `r.ttl.meta.acl`; for a container `c/` they are the literal children
//! `c/.acl`, `c/.meta` and `c/.meta.acl`. Sidecars own no sidecars.

use futures::future::try_join_all;
use http::StatusCode;

use crate::media::extension;
use crate::storage::{StorageBackend, StorageReply, StorageResult};

/// Extensions that mark a name as a link resource.
pub const LINK_EXTENSIONS: [&str; 2] = [".acl", ".meta"];

/// Suffixes appended to an owner's path to name its sidecars.
pub const SIDECAR_SUFFIXES: [&str; 3] = [".acl", ".meta", ".meta.acl"];

/// Returns true if `path` names a link resource.
pub fn is_link(path: &str) -> bool {
    let ext = extension(path);
    LINK_EXTENSIONS.contains(&ext)
}

/// Paths of every sidecar `path` could own.
pub fn sidecars(path: &str) -> Vec<String> {
    SIDECAR_SUFFIXES
        .iter()
        .map(|suffix| format!("{path}{suffix}"))
        .collect()
}

/// Delete `paths` concurrently and wait for every deletion to finish.
///
/// Returns the first refusal in `paths` order, if any. A sidecar that is
/// already gone (404) is not a refusal.
async fn delete_all(
    backend: &dyn StorageBackend,
    paths: &[String],
) -> StorageResult<Option<StorageReply>> {
    let replies = try_join_all(paths.iter().map(|p| backend.delete_resource(p))).await?;
    let mut refused = None;
    for (path, reply) in paths.iter().zip(replies) {
        if reply.status != StatusCode::OK && reply.status != StatusCode::NOT_FOUND {
            tracing::warn!(path = %path, status = %reply.status, "sidecar deletion refused");
            refused.get_or_insert(reply);
        }
    }
    Ok(refused)
}

/// Delete whichever sidecars of `path` exist.
///
/// Probes run concurrently, as do the deletions; both are awaited in full
/// before returning. Replies 200 when every existing sidecar is gone,
/// otherwise the first refusal.
pub async fn delete_sidecars(backend: &dyn StorageBackend, path: &str) -> StorageResult<StorageReply> {
    let candidates = sidecars(path);
    let probes = try_join_all(candidates.iter().map(|p| backend.probe(p))).await?;

    let existing: Vec<String> = candidates
        .into_iter()
        .zip(probes)
        .filter(|(_, descriptor)| descriptor.exists)
        .map(|(p, _)| p)
        .collect();

    if let Some(refused) = delete_all(backend, &existing).await? {
        return Ok(refused);
    }
    if !existing.is_empty() {
        tracing::debug!(path = %path, sidecars = ?existing, "cascaded sidecar deletion");
    }
    Ok(StorageReply::ok())
}

/// Delete a resource together with its sidecars.
///
/// The resource is kept when a sidecar deletion is refused, and the reply
/// carries that refusal.
pub async fn delete_resource(backend: &dyn StorageBackend, path: &str) -> StorageResult<StorageReply> {
    let sidecars = delete_sidecars(backend, path).await?;
    if sidecars.status != StatusCode::OK {
        return Ok(sidecars);
    }
    backend.delete_resource(path).await
}

/// Delete an empty container together with its sidecars.
///
/// A container is empty when every member is a link resource; otherwise
/// the reply is 409 and nothing is touched. Link-named members are deleted
/// before the container. That covers the container's own `.acl`, `.meta`
/// and `.meta.acl` as well as sidecars orphaned by earlier deletions, which
/// would otherwise keep the container from being removed. If any of those
/// deletions is refused, the container stays and the refusal is returned.
pub async fn delete_container(backend: &dyn StorageBackend, path: &str) -> StorageResult<StorageReply> {
    let listing = backend.list_container(path).await?;
    if listing.status != StatusCode::OK {
        return Ok(StorageReply::new(listing.status));
    }

    let (links, members): (Vec<String>, Vec<String>) = listing
        .members
        .into_iter()
        .map(|m| m.trim_end_matches('/').to_string())
        .partition(|m| is_link(m));

    if !members.is_empty() {
        tracing::warn!(path = %path, members = members.len(), "refusing to delete non-empty container");
        return Ok(StorageReply::conflict());
    }

    let container = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    };
    let link_paths: Vec<String> = links.iter().map(|name| format!("{container}{name}")).collect();
    if let Some(refused) = delete_all(backend, &link_paths).await? {
        return Ok(refused);
    }

    backend.delete_container(&container).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    #[test]
    fn test_is_link() {
        assert!(is_link("/a/b.ttl.acl"));
        assert!(is_link("/a/b.ttl.meta"));
        assert!(is_link("/a/b.meta.acl"));
        assert!(is_link("/c/.acl"));
        assert!(is_link("/c/.meta"));
        assert!(is_link("foo.acl"));
        assert!(!is_link("/a/b.ttl"));
        assert!(!is_link("/a/acl"));
        assert!(!is_link("/c/"));
    }

    #[test]
    fn test_sidecar_names() {
        assert_eq!(
            sidecars("/a/r.ttl"),
            vec!["/a/r.ttl.acl", "/a/r.ttl.meta", "/a/r.ttl.meta.acl"]
        );
        assert_eq!(sidecars("/c/"), vec!["/c/.acl", "/c/.meta", "/c/.meta.acl"]);
    }

    #[tokio::test]
    async fn test_delete_resource_cascades() {
        let store = MemoryBackend::new();
        for p in ["/r.ttl", "/r.ttl.acl", "/r.ttl.meta", "/other.ttl"] {
            store.write_resource(p, b"").await.unwrap();
        }

        let reply = delete_resource(&store, "/r.ttl").await.unwrap();
        assert_eq!(reply.status, StatusCode::OK);

        for p in ["/r.ttl", "/r.ttl.acl", "/r.ttl.meta"] {
            assert!(!store.exists(p).await.unwrap(), "{p} should be gone");
        }
        assert!(store.exists("/other.ttl").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_sidecars_is_repeatable() {
        let store = MemoryBackend::new();
        store.write_resource("/r.ttl.meta", b"").await.unwrap();

        let reply = delete_sidecars(&store, "/r.ttl").await.unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert!(!store.exists("/r.ttl.meta").await.unwrap());

        let reply = delete_sidecars(&store, "/r.ttl").await.unwrap();
        assert_eq!(reply.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_container_refuses_members() {
        let store = MemoryBackend::new();
        store.write_resource("/c/doc.ttl", b"").await.unwrap();
        store.write_resource("/c/.acl", b"").await.unwrap();

        let reply = delete_container(&store, "/c/").await.unwrap();
        assert_eq!(reply.status, StatusCode::CONFLICT);
        assert!(store.exists("/c/doc.ttl").await.unwrap());
        assert!(store.exists("/c/.acl").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_container_with_only_links() {
        let store = MemoryBackend::new();
        store.write_resource("/c/.acl", b"").await.unwrap();
        store.write_resource("/c/.meta", b"").await.unwrap();
        store.write_resource("/c/orphan.ttl.acl", b"").await.unwrap();

        let reply = delete_container(&store, "/c/").await.unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert!(!store.exists("/c/").await.unwrap());
        assert!(!store.exists("/c/.acl").await.unwrap());
    }
}
