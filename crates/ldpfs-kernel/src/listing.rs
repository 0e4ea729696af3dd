//! Container listings as Turtle.

use http::StatusCode;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fmt::Write;

use crate::links::is_link;
use crate::media::{content_type, essence, extension};
use crate::storage::{ObjectKind, StorageBackend, StorageResult};

/// Characters escaped in member references (everything a URI may not carry
/// literally; reserved delimiters are left alone).
const MEMBER_REF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

const PREFIXES: &str = "@prefix : <#>. @prefix ldp: <http://www.w3.org/ns/ldp#>.\n";
const MEDIA_TYPES: &str = "http://www.w3.org/ns/iana/media-types/";

/// Render the members of the container at `path`.
///
/// The backend's own serializer is used when it provides one. Otherwise
/// link resources are left out, each remaining member is probed for its
/// kind, and the listing asserts `ldp:contains` plus a type and media type
/// for every member.
pub async fn container_to_turtle(
    backend: &dyn StorageBackend,
    path: &str,
    members: &[String],
) -> StorageResult<(StatusCode, String)> {
    if let Some(custom) = backend.serialize_container(path, members).await? {
        return Ok(custom);
    }

    let container = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    };

    let mut contains = Vec::new();
    let mut assertions = String::new();

    for name in members.iter().filter(|m| !is_link(m)) {
        let probed = backend.probe(&format!("{container}{name}")).await?;

        let mut reference = utf8_percent_encode(name, MEMBER_REF).to_string();
        if probed.kind.is_container() && !reference.ends_with('/') {
            reference.push('/');
        }

        let media = content_type(extension(&reference), ObjectKind::Resource);
        let kind = if probed.kind.is_container() {
            "ldp:Container; a ldp:BasicContainer"
        } else {
            "ldp:Resource"
        };
        let _ = writeln!(assertions, "<{reference}> a {kind}.");
        let _ = writeln!(
            assertions,
            "<{reference}> a <{MEDIA_TYPES}{}#Resource>.",
            essence(&media)
        );

        contains.push(reference);
    }

    let mut turtle = String::from(PREFIXES);
    turtle.push_str("<> a ldp:BasicContainer, ldp:Container");
    if !contains.is_empty() {
        turtle.push_str("; ldp:contains\n");
        let refs: Vec<String> = contains.iter().map(|r| format!("  <{r}>")).collect();
        turtle.push_str(&refs.join(",\n"));
    }
    turtle.push_str(".\n");
    turtle.push_str(&assertions);

    Ok((StatusCode::OK, turtle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use async_trait::async_trait;

    #[tokio::test]
    async fn test_empty_container() {
        let store = MemoryBackend::new();
        let (status, turtle) = container_to_turtle(&store, "/", &[]).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            turtle,
            "@prefix : <#>. @prefix ldp: <http://www.w3.org/ns/ldp#>.\n\
             <> a ldp:BasicContainer, ldp:Container.\n"
        );
    }

    #[tokio::test]
    async fn test_members_and_types() {
        let store = MemoryBackend::new();
        store.write_resource("/c/a.ttl", b"").await.unwrap();
        store.write_resource("/c/a.ttl.acl", b"").await.unwrap();
        store.create_container("/c/sub/").await.unwrap();

        let members = vec!["a.ttl".to_string(), "a.ttl.acl".to_string(), "sub".to_string()];
        let (_, turtle) = container_to_turtle(&store, "/c", &members).await.unwrap();

        let expected = "@prefix : <#>. @prefix ldp: <http://www.w3.org/ns/ldp#>.\n\
            <> a ldp:BasicContainer, ldp:Container; ldp:contains\n  <a.ttl>,\n  <sub/>.\n\
            <a.ttl> a ldp:Resource.\n\
            <a.ttl> a <http://www.w3.org/ns/iana/media-types/text/turtle#Resource>.\n\
            <sub/> a ldp:Container; a ldp:BasicContainer.\n\
            <sub/> a <http://www.w3.org/ns/iana/media-types/text/turtle#Resource>.\n";
        assert_eq!(turtle, expected);
    }

    #[tokio::test]
    async fn test_names_are_escaped_and_typed() {
        let store = MemoryBackend::new();
        store.write_resource("/my notes.txt", b"").await.unwrap();

        let members = vec!["my notes.txt".to_string()];
        let (_, turtle) = container_to_turtle(&store, "/", &members).await.unwrap();
        assert!(turtle.contains("  <my%20notes.txt>.\n"));
        assert!(turtle.contains("<my%20notes.txt> a ldp:Resource.\n"));
        assert!(turtle.contains("media-types/text/plain#Resource"));
    }

    struct Custom(MemoryBackend);

    #[async_trait]
    impl StorageBackend for Custom {
        fn name(&self) -> &str {
            "custom"
        }
        async fn probe(&self, path: &str) -> StorageResult<crate::storage::ObjectDescriptor> {
            self.0.probe(path).await
        }
        async fn read_resource(&self, path: &str) -> StorageResult<crate::storage::StorageReply> {
            self.0.read_resource(path).await
        }
        async fn list_container(&self, path: &str) -> StorageResult<crate::storage::Listing> {
            self.0.list_container(path).await
        }
        async fn write_resource(
            &self,
            path: &str,
            content: &[u8],
        ) -> StorageResult<crate::storage::StorageReply> {
            self.0.write_resource(path, content).await
        }
        async fn create_container(&self, path: &str) -> StorageResult<crate::storage::StorageReply> {
            self.0.create_container(path).await
        }
        async fn ensure_parent_containers(
            &self,
            path: &str,
        ) -> StorageResult<crate::storage::StorageReply> {
            self.0.ensure_parent_containers(path).await
        }
        async fn delete_resource(&self, path: &str) -> StorageResult<crate::storage::StorageReply> {
            self.0.delete_resource(path).await
        }
        async fn delete_container(&self, path: &str) -> StorageResult<crate::storage::StorageReply> {
            self.0.delete_container(path).await
        }
        async fn serialize_container(
            &self,
            _path: &str,
            members: &[String],
        ) -> StorageResult<Option<(StatusCode, String)>> {
            Ok(Some((StatusCode::OK, members.join(" "))))
        }
    }

    #[tokio::test]
    async fn test_backend_serializer_wins() {
        let store = Custom(MemoryBackend::new());
        let members = vec!["x".to_string(), "y.acl".to_string()];
        let (_, body) = container_to_turtle(&store, "/", &members).await.unwrap();
        assert_eq!(body, "x y.acl");
    }
}
