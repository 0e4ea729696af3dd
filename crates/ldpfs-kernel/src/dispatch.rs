//! Request dispatcher.
//!
//! [`Dispatcher::fetch`] classifies the target, resolves its backend, probes
//! the object once and routes on (verb, kind, exists):
//!
//! | Verb | Refusals | Success |
//! |---|---|---|
//! | GET | 404 | container listing or resource content, 200 |
//! | HEAD, OPTIONS | 404 | 200, no body |
//! | DELETE | 404, 409 (non-empty container), refused sidecar status | sidecars then object deleted |
//! | POST | 404 (parent), 400 (slug), 405 (no intent, sidecar name) | 201 with `location` |
//! | PUT | 409 (container) | parents ensured, content written |
//! | PATCH | 405 (no patcher), 409 (container), read status, 500 (not Turtle), collaborator status | 200 |
//! | other | 405 | |
//!
//! Every response passes through [`headers::synthesize`].

use chrono::{DateTime, Utc};
use http::header::{DATE, LOCATION};
use http::{HeaderMap, HeaderValue, StatusCode};
use std::sync::Arc;

use crate::error::{RestError, RestResult};
use crate::headers::{self, HeaderContext};
use crate::links;
use crate::listing::container_to_turtle;
use crate::media::{content_type, extension};
use crate::naming::{available_name, candidate_path, is_valid_slug};
use crate::patch::{ContentPatcher, PatchRequest, PatchStep, orchestrate};
use crate::request::{Request, Response, Verb};
use crate::storage::{BackendRegistry, ObjectDescriptor, ObjectKind, StorageBackend};
use crate::uri::{Target, is_local};

const NOT_FOUND_BODY: &str = "404 Not Found";

/// Source of the `date` header.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Routes requests to backends with LDP semantics.
#[derive(Clone)]
pub struct Dispatcher {
    registry: BackendRegistry,
    patcher: Option<Arc<dyn ContentPatcher>>,
    clock: Clock,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("patch_enabled", &self.patcher.is_some())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher over `registry`, without PATCH support.
    pub fn new(registry: BackendRegistry) -> Self {
        Self {
            registry,
            patcher: None,
            clock: Arc::new(Utc::now),
        }
    }

    /// Enable PATCH through `patcher`.
    pub fn with_patcher(self, patcher: impl ContentPatcher + 'static) -> Self {
        self.with_patcher_arc(Arc::new(patcher))
    }

    /// Enable PATCH through a shared patcher.
    pub fn with_patcher_arc(mut self, patcher: Arc<dyn ContentPatcher>) -> Self {
        self.patcher = Some(patcher);
        self
    }

    /// Replace the clock used for `date`.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn patch_enabled(&self) -> bool {
        self.patcher.is_some()
    }

    /// Serve one request.
    ///
    /// Protocol refusals come back as `Ok` responses. `Err` means the
    /// request could not be served: a network scheme, an unknown backend
    /// selector, or a backend fault.
    #[tracing::instrument(skip(self, request), fields(method = %request.verb, uri = %request.uri))]
    pub async fn fetch(&self, request: Request) -> RestResult<Response> {
        if !is_local(&request.uri) {
            return Err(RestError::remote_scheme(&request.uri));
        }

        let mut target = match Target::parse(&request.uri) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable target");
                return Ok(self.bad_target(&request.uri, e.to_string()));
            }
        };

        let backend = self.registry.resolve(&target.selector)?;
        let shape = ObjectKind::from_path_shape(&target.path);
        let probed = backend.probe(&target.path).await?;
        if probed.kind.is_container() {
            target.canonicalize_container();
        }

        tracing::debug!(
            selector = %target.selector,
            path = %target.path,
            kind = %probed.kind,
            exists = probed.exists,
            "classified"
        );

        let exchange = Exchange {
            dispatcher: self,
            backend,
            request,
            target,
            shape,
            probed,
        };
        let response = exchange.route().await?;

        tracing::debug!(status = %response.status, "responded");
        Ok(response)
    }

    /// 400 for a target that does not classify; there is no backend to
    /// synthesize the full header set from.
    fn bad_target(&self, uri: &str, message: String) -> Response {
        let mut headers = HeaderMap::new();
        if let Ok(location) = HeaderValue::from_str(uri) {
            headers.insert(LOCATION, location);
        }
        let date = (self.clock)().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        if let Ok(date) = HeaderValue::from_str(&date) {
            headers.insert(DATE, date);
        }
        Response {
            status: StatusCode::BAD_REQUEST,
            headers,
            body: Some(message.into_bytes()),
        }
    }
}

/// One request in flight.
struct Exchange<'d> {
    dispatcher: &'d Dispatcher,
    backend: Arc<dyn StorageBackend>,
    request: Request,
    target: Target,
    /// Kind implied by the requested path, before canonicalization.
    shape: ObjectKind,
    probed: ObjectDescriptor,
}

impl Exchange<'_> {
    async fn route(&self) -> RestResult<Response> {
        match &self.request.verb {
            Verb::Get => self.get().await,
            Verb::Head | Verb::Options => Ok(self.existence()),
            Verb::Delete => self.delete().await,
            Verb::Post => self.post().await,
            Verb::Put => self.put().await,
            Verb::Patch => self.patch().await,
            Verb::Other(method) => {
                tracing::warn!(method = %method, "unsupported method");
                Ok(self.refuse(StatusCode::METHOD_NOT_ALLOWED))
            }
        }
    }

    fn path(&self) -> &str {
        &self.target.path
    }

    /// Either the request names a container or one is stored there.
    fn addresses_container(&self) -> bool {
        self.shape.is_container() || self.probed.kind.is_container()
    }

    // ========================================================================
    // Verbs
    // ========================================================================

    async fn get(&self) -> RestResult<Response> {
        if !self.probed.exists {
            return Ok(self.not_found());
        }

        if self.probed.kind.is_container() {
            let listing = self.backend.list_container(self.path()).await?;
            if listing.status != StatusCode::OK {
                return Ok(self.respond(listing.status, None, &listing.headers));
            }
            let (status, turtle) =
                container_to_turtle(self.backend.as_ref(), self.path(), &listing.members).await?;
            return Ok(self.respond(status, Some(turtle.into_bytes()), &listing.headers));
        }

        let reply = self.backend.read_resource(self.path()).await?;
        Ok(self.respond(reply.status, reply.body, &reply.headers))
    }

    fn existence(&self) -> Response {
        let status = if self.probed.exists {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        };
        self.respond(status, None, &HeaderMap::new())
    }

    async fn delete(&self) -> RestResult<Response> {
        if !self.probed.exists {
            return Ok(self.not_found());
        }

        let reply = match self.probed.kind {
            ObjectKind::Container => links::delete_container(self.backend.as_ref(), self.path()).await?,
            ObjectKind::Resource => links::delete_resource(self.backend.as_ref(), self.path()).await?,
        };

        if reply.is_ok_or_created() {
            tracing::info!(path = %self.path(), kind = %self.probed.kind, "deleted");
        } else {
            tracing::warn!(path = %self.path(), status = %reply.status, "delete refused");
        }
        Ok(self.respond(reply.status, None, &reply.headers))
    }

    async fn post(&self) -> RestResult<Response> {
        if !self.probed.exists {
            return Ok(self.not_found());
        }

        let slug = self.request.requested_slug();
        if let Some(slug) = &slug {
            if !is_valid_slug(slug) {
                tracing::warn!(slug = %slug, "slug contains a path separator");
                return Ok(self.refuse(StatusCode::BAD_REQUEST));
            }
        }

        let Some(kind) = self.request.intent() else {
            tracing::warn!(path = %self.path(), "POST without a Container or Resource link type");
            return Ok(self.refuse(StatusCode::METHOD_NOT_ALLOWED));
        };

        let name = available_name(
            self.backend.as_ref(),
            self.path(),
            slug.as_deref(),
            kind,
            self.target.style,
        )
        .await?;
        let path = candidate_path(self.path(), &name, kind, self.target.style);

        if links::is_link(&path) {
            tracing::warn!(path = %path, "refusing to create a link resource");
            return Ok(self.refuse(StatusCode::METHOD_NOT_ALLOWED));
        }

        let reply = match kind {
            ObjectKind::Container => self.backend.create_container(&path).await?,
            ObjectKind::Resource => self.backend.write_resource(&path, &self.request.body).await?,
        };
        if reply.is_ok_or_created() {
            tracing::info!(path = %path, kind = %kind, "created");
        }

        let mut operation = HeaderMap::new();
        if let Ok(location) = HeaderValue::from_str(&path) {
            operation.insert(LOCATION, location);
        }
        headers::apply_operation(&mut operation, &reply.headers);

        let mut url = self.target.url.clone();
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(&name);
        if kind.is_container() {
            url.push('/');
        }

        Ok(self.respond_about(&path, &url, kind, reply.status, None, &operation))
    }

    async fn put(&self) -> RestResult<Response> {
        if self.addresses_container() {
            tracing::warn!(path = %self.path(), "containers cannot be PUT");
            return Ok(self.refuse(StatusCode::CONFLICT));
        }

        let parents = self.backend.ensure_parent_containers(self.path()).await?;
        if !parents.is_ok_or_created() {
            return Ok(self.respond(parents.status, None, &parents.headers));
        }

        let written = self
            .backend
            .write_resource(self.path(), &self.request.body)
            .await?;
        if written.is_ok_or_created() {
            tracing::info!(path = %self.path(), bytes = self.request.body.len(), "written");
        }

        let mut operation = parents.headers;
        headers::apply_operation(&mut operation, &written.headers);
        Ok(self.respond(written.status, None, &operation))
    }

    async fn patch(&self) -> RestResult<Response> {
        let Some(patcher) = self.dispatcher.patcher.as_deref() else {
            tracing::warn!(path = %self.path(), "PATCH without a patcher configured");
            return Ok(self.refuse(StatusCode::METHOD_NOT_ALLOWED));
        };
        if self.addresses_container() {
            return Ok(self.refuse(StatusCode::CONFLICT));
        }

        let content = if self.probed.exists {
            let current = self.backend.read_resource(self.path()).await?;
            if current.status != StatusCode::OK {
                tracing::warn!(path = %self.path(), status = %current.status, "read before PATCH failed");
                return Ok(self.respond(current.status, None, &current.headers));
            }
            current
                .body
                .map(|b| String::from_utf8_lossy(&b).into_owned())
                .unwrap_or_default()
        } else {
            String::new()
        };

        let media = content_type(extension(self.path()), ObjectKind::Resource);
        let patch_request = PatchRequest {
            path: self.path(),
            body: &self.request.body,
            headers: &self.request.headers,
        };
        let patched = match orchestrate(patcher, &content, &media, &patch_request).await {
            PatchStep::Patched(patched) => patched,
            PatchStep::Refused { status, body } => {
                return Ok(self.respond(status, Some(body.into_bytes()), &HeaderMap::new()));
            }
        };

        let mut operation = HeaderMap::new();
        if !self.probed.exists {
            let parents = self.backend.ensure_parent_containers(self.path()).await?;
            if !parents.is_ok_or_created() {
                return Ok(self.respond(parents.status, None, &parents.headers));
            }
            operation = parents.headers;
        }

        let written = self
            .backend
            .write_resource(self.path(), patched.as_bytes())
            .await?;
        tracing::info!(path = %self.path(), status = %written.status, "patched");

        // the resource is being modified, not created
        let status = if written.status == StatusCode::CREATED {
            StatusCode::OK
        } else {
            written.status
        };
        Ok(self.respond(status, None, &operation))
    }

    // ========================================================================
    // Responses
    // ========================================================================

    fn not_found(&self) -> Response {
        self.respond(
            StatusCode::NOT_FOUND,
            Some(NOT_FOUND_BODY.as_bytes().to_vec()),
            &HeaderMap::new(),
        )
    }

    fn refuse(&self, status: StatusCode) -> Response {
        self.respond(status, None, &HeaderMap::new())
    }

    fn respond(&self, status: StatusCode, body: Option<Vec<u8>>, operation: &HeaderMap) -> Response {
        self.respond_about(
            &self.target.path,
            &self.target.url,
            self.probed.kind,
            status,
            body,
            operation,
        )
    }

    fn respond_about(
        &self,
        path: &str,
        url: &str,
        kind: ObjectKind,
        status: StatusCode,
        body: Option<Vec<u8>>,
        operation: &HeaderMap,
    ) -> Response {
        let ctx = HeaderContext {
            path,
            url,
            kind,
            backend_name: self.backend.name(),
            patch_enabled: self.dispatcher.patch_enabled(),
            now: (self.dispatcher.clock)(),
        };
        let custom = self.backend.custom_headers(path);
        let mut headers = headers::synthesize(&ctx, custom.as_ref());
        headers::apply_operation(&mut headers, operation);

        Response {
            status,
            headers,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(BackendRegistry::new().with_backend("mem", MemoryBackend::new()))
    }

    #[tokio::test]
    async fn test_remote_scheme_is_error() {
        let err = dispatcher()
            .fetch(Request::get("https://example.org/card"))
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::RemoteScheme(_)));
    }

    #[tokio::test]
    async fn test_unknown_selector_is_error() {
        let err = dispatcher()
            .fetch(Request::get("app://nowhere/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::UnknownBackend(s) if s == "nowhere"));
    }

    #[tokio::test]
    async fn test_malformed_target_is_400() {
        let res = dispatcher().fetch(Request::get("app:opaque")).await.unwrap();
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert!(res.header("date").is_some());
    }

    #[tokio::test]
    async fn test_unknown_method_is_405() {
        let res = dispatcher()
            .fetch(Request::new("BREW", "app://mem/"))
            .await
            .unwrap();
        assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(res.body.is_none());
    }

    #[tokio::test]
    async fn test_container_url_is_canonicalized() {
        let d = dispatcher();
        d.fetch(Request::put("app://mem/c/a.ttl", "")).await.unwrap();

        let res = d.fetch(Request::new("HEAD", "app://mem/c")).await.unwrap();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.header("location"), Some("app://mem/c/"));
        assert_eq!(res.header("content-type"), Some("text/turtle"));
    }
}
