//! Request and response values.

use http::header::LINK;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::fmt;
use strum::EnumString;

use crate::storage::ObjectKind;

/// `Slug` request header.
pub const SLUG: HeaderName = HeaderName::from_static("slug");

/// Request verb. Parsing is case-insensitive; unknown verbs are kept as
/// [`Verb::Other`] and answered with 405.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
    #[strum(default)]
    Other(String),
}

impl Verb {
    /// Parse a method string.
    pub fn parse(method: &str) -> Self {
        method
            .parse()
            .unwrap_or_else(|_| Verb::Other(method.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Other(method) => method,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against the hierarchy.
#[derive(Debug, Clone)]
pub struct Request {
    pub verb: Verb,
    /// Target identifier, e.g. `app://mem/pod/notes.ttl` or `file:///srv/pod/`.
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Requested short name for POST; the `Slug` header takes precedence.
    pub slug: Option<String>,
}

impl Request {
    /// Create a request with no headers and an empty body.
    pub fn new(method: &str, uri: impl Into<String>) -> Self {
        Self {
            verb: Verb::parse(method),
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            slug: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new("GET", uri)
    }

    pub fn put(uri: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new("PUT", uri).body(body)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new("DELETE", uri)
    }

    /// POST creating an object of `kind` in the container at `uri`.
    pub fn post(uri: impl Into<String>, kind: ObjectKind) -> Self {
        Self::new("POST", uri).link(kind)
    }

    /// Add a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the requested short name.
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Declare the LDP type of the object a POST creates.
    pub fn link(self, kind: ObjectKind) -> Self {
        let value = match kind {
            ObjectKind::Container => {
                HeaderValue::from_static(r#"<http://www.w3.org/ns/ldp#BasicContainer>; rel="type""#)
            }
            ObjectKind::Resource => {
                HeaderValue::from_static(r#"<http://www.w3.org/ns/ldp#Resource>; rel="type""#)
            }
        };
        self.header(LINK, value)
    }

    /// Requested short name: the `Slug` header, else the `slug` field.
    pub fn requested_slug(&self) -> Option<String> {
        self.headers
            .get(SLUG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| self.slug.clone())
    }

    /// Kind a POST intends to create, from its `Link` header.
    pub fn intent(&self) -> Option<ObjectKind> {
        let links: Vec<&str> = self
            .headers
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if links.iter().any(|l| l.contains("Container")) {
            Some(ObjectKind::Container)
        } else if links.iter().any(|l| l.contains("Resource")) {
            Some(ObjectKind::Resource)
        } else {
            None
        }
    }
}

/// Outcome of a request.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Response {
    /// Body as text, if there is one.
    pub fn text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
