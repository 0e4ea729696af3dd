//! Shared fixtures for dispatcher integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use http::{HeaderMap, StatusCode};
use ldpfs_kernel::{
    ContentPatcher, Dispatcher, Listing, MemoryBackend, ObjectDescriptor, PatchError,
    PatchOutcome, PatchRequest, PatchResult, Request, Response, StorageBackend, StorageReply,
    StorageResult,
};

/// One call seen by [`RecordingPatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchCall {
    pub path: String,
    pub content: String,
    pub content_type: String,
    pub patch: String,
}

/// Appends the patch body to the current content and records every call.
///
/// A body of `refuse <code>` answers with that status instead; a body of
/// `raise <message>` fails with a [`PatchError`].
#[derive(Debug, Clone, Default)]
pub struct RecordingPatcher {
    calls: Arc<Mutex<Vec<PatchCall>>>,
}

impl RecordingPatcher {
    pub fn calls(&self) -> Vec<PatchCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentPatcher for RecordingPatcher {
    async fn patch(
        &self,
        content: &str,
        content_type: &str,
        request: &PatchRequest<'_>,
    ) -> PatchResult<PatchOutcome> {
        let patch = String::from_utf8_lossy(request.body).into_owned();
        self.calls.lock().unwrap().push(PatchCall {
            path: request.path.to_string(),
            content: content.to_string(),
            content_type: content_type.to_string(),
            patch: patch.clone(),
        });

        if let Some(code) = patch.strip_prefix("refuse ") {
            let status = code
                .trim()
                .parse::<u16>()
                .ok()
                .and_then(|c| StatusCode::from_u16(c).ok())
                .unwrap_or(StatusCode::BAD_REQUEST);
            return Ok(PatchOutcome::failed(status, format!("refused: {code}")));
        }
        if let Some(message) = patch.strip_prefix("raise ") {
            return Err(PatchError::new(message));
        }
        Ok(PatchOutcome::patched(format!("{content}{patch}")))
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 4, 3, 2, 1).unwrap()
}

pub const FIXED_DATE: &str = "2024-05-04T03:02:01.000Z";

/// Fetch, panicking on a fatal error.
pub async fn fetch(dispatcher: &Dispatcher, request: Request) -> Response {
    dispatcher.fetch(request).await.expect("request failed")
}

/// Member references on the `ldp:contains` lines of a listing.
pub fn contained(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter(|line| line.starts_with("  <"))
        .map(|line| {
            line.trim()
                .trim_start_matches('<')
                .trim_end_matches(['.', ','])
                .trim_end_matches('>')
                .to_string()
        })
        .collect()
}

/// Memory store that fails chosen operations with a status reply.
#[derive(Debug, Clone)]
pub struct FaultyBackend {
    pub inner: Arc<MemoryBackend>,
    /// Status for every `read_resource`.
    pub read_status: Option<StatusCode>,
    /// Refuse deleting resources whose path ends with this suffix.
    pub refuse_delete_suffix: Option<&'static str>,
}

impl FaultyBackend {
    pub fn new(inner: Arc<MemoryBackend>) -> Self {
        Self {
            inner,
            read_status: None,
            refuse_delete_suffix: None,
        }
    }

    pub fn failing_reads(mut self, status: StatusCode) -> Self {
        self.read_status = Some(status);
        self
    }

    pub fn refusing_deletes_of(mut self, suffix: &'static str) -> Self {
        self.refuse_delete_suffix = Some(suffix);
        self
    }
}

#[async_trait]
impl StorageBackend for FaultyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn probe(&self, path: &str) -> StorageResult<ObjectDescriptor> {
        self.inner.probe(path).await
    }

    async fn read_resource(&self, path: &str) -> StorageResult<StorageReply> {
        match self.read_status {
            Some(status) => Ok(StorageReply::new(status)),
            None => self.inner.read_resource(path).await,
        }
    }

    async fn list_container(&self, path: &str) -> StorageResult<Listing> {
        self.inner.list_container(path).await
    }

    async fn write_resource(&self, path: &str, content: &[u8]) -> StorageResult<StorageReply> {
        self.inner.write_resource(path, content).await
    }

    async fn create_container(&self, path: &str) -> StorageResult<StorageReply> {
        self.inner.create_container(path).await
    }

    async fn ensure_parent_containers(&self, path: &str) -> StorageResult<StorageReply> {
        self.inner.ensure_parent_containers(path).await
    }

    async fn delete_resource(&self, path: &str) -> StorageResult<StorageReply> {
        match self.refuse_delete_suffix {
            Some(suffix) if path.ends_with(suffix) => Ok(StorageReply::new(StatusCode::FORBIDDEN)),
            _ => self.inner.delete_resource(path).await,
        }
    }

    async fn delete_container(&self, path: &str) -> StorageResult<StorageReply> {
        self.inner.delete_container(path).await
    }

    fn custom_headers(&self, path: &str) -> Option<HeaderMap> {
        self.inner.custom_headers(path)
    }
}
