//! Target identifier classification.
//!
//! Splits a URI into the scheme, the backend selector and a normalized
//! `/`-separated path. `file:` URIs go to the `file` selector and join
//! paths with platform semantics; every other scheme uses its authority as
//! the selector and joins with POSIX semantics.

use percent_encoding::percent_decode_str;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Selector that serves every `file:` URI.
pub const FILE_SELECTOR: &str = "file";

/// Classification failure.
#[derive(Debug, Error)]
pub enum UriError {
    /// The identifier is not a valid absolute URI.
    #[error("malformed identifier {uri}: {source}")]
    Malformed {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    /// A `file:` URI that does not map to a local path.
    #[error("not a usable file path: {0}")]
    NotAFilePath(String),

    /// A non-file URI without an authority to select a backend with.
    #[error("identifier has no backend selector: {0}")]
    MissingSelector(String),
}

/// Classification result type.
pub type UriResult<T> = Result<T, UriError>;

/// How child names are joined onto a container path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// Virtual hierarchical namespace.
    Posix,
    /// Real filesystem paths, which may use `\` on some platforms.
    Platform,
}

impl PathStyle {
    /// Join `name` onto `parent`. The result always uses `/`.
    pub fn join(&self, parent: &str, name: &str) -> String {
        let joined = match self {
            PathStyle::Posix => normalize_posix(&format!("{parent}/{name}")),
            PathStyle::Platform => Path::new(parent).join(name).to_string_lossy().into_owned(),
        };
        joined.replace('\\', "/")
    }
}

/// Collapse `//`, `.` and `..` segments, keeping leading and trailing `/`.
pub fn normalize_posix(path: &str) -> String {
    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }

    let mut out = parts.join("/");
    if absolute {
        out.insert(0, '/');
    }
    if trailing && !out.ends_with('/') {
        out.push('/');
    }
    if out.is_empty() {
        out.push('.');
    }
    out
}

/// Returns false for network URIs (`http:`/`https:`), which this layer does not serve.
pub fn is_local(uri: &str) -> bool {
    match Url::parse(uri) {
        Ok(url) => !matches!(url.scheme(), "http" | "https"),
        Err(_) => true,
    }
}

/// A classified request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// URI scheme without the colon (e.g., "file", "app").
    pub scheme: String,
    /// Backend selector.
    pub selector: String,
    /// Normalized `/`-separated path within the backend.
    pub path: String,
    /// Identifier as reported back in `location`.
    pub url: String,
    /// Join convention for this target.
    pub style: PathStyle,
}

impl Target {
    /// Classify a target identifier.
    pub fn parse(uri: &str) -> UriResult<Self> {
        let parsed = Url::parse(uri).map_err(|source| UriError::Malformed {
            uri: uri.to_string(),
            source,
        })?;
        let scheme = parsed.scheme().to_string();

        if scheme == "file" {
            let file_path = parsed
                .to_file_path()
                .map_err(|_| UriError::NotAFilePath(uri.to_string()))?;
            let mut path = file_path.to_string_lossy().replace('\\', "/");
            if parsed.path().ends_with('/') && !path.ends_with('/') {
                path.push('/');
            }
            return Ok(Self {
                scheme,
                selector: FILE_SELECTOR.to_string(),
                path,
                url: parsed.to_string(),
                style: PathStyle::Platform,
            });
        }

        let selector = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) if !host.is_empty() => host.to_string(),
            _ => return Err(UriError::MissingSelector(uri.to_string())),
        };

        let decoded = percent_decode_str(parsed.path()).decode_utf8_lossy();
        let path = if decoded.is_empty() {
            "/".to_string()
        } else {
            normalize_posix(&decoded)
        };

        Ok(Self {
            scheme,
            selector,
            path,
            url: percent_decode_str(uri).decode_utf8_lossy().into_owned(),
            style: PathStyle::Posix,
        })
    }

    /// Make path and url end with `/`, as every container path must.
    pub fn canonicalize_container(&mut self) {
        if !self.path.ends_with('/') {
            self.path.push('/');
        }
        if !self.url.ends_with('/') {
            self.url.push('/');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_virtual_scheme() {
        let t = Target::parse("app://mem/pod/notes/a.ttl").unwrap();
        assert_eq!(t.scheme, "app");
        assert_eq!(t.selector, "mem");
        assert_eq!(t.path, "/pod/notes/a.ttl");
        assert_eq!(t.style, PathStyle::Posix);
    }

    #[test]
    fn test_parse_selector_keeps_port() {
        let t = Target::parse("app://store:8443/x/").unwrap();
        assert_eq!(t.selector, "store:8443");
        assert_eq!(t.path, "/x/");
    }

    #[test]
    fn test_parse_decodes_path_and_url() {
        let t = Target::parse("app://mem/my%20notes/a%20b.ttl").unwrap();
        assert_eq!(t.path, "/my notes/a b.ttl");
        assert_eq!(t.url, "app://mem/my notes/a b.ttl");
    }

    #[test]
    fn test_parse_empty_path_is_root() {
        let t = Target::parse("app://mem").unwrap();
        assert_eq!(t.path, "/");
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_file_scheme() {
        let t = Target::parse("file:///home/amy/pod/").unwrap();
        assert_eq!(t.selector, FILE_SELECTOR);
        assert_eq!(t.path, "/home/amy/pod/");
        assert_eq!(t.url, "file:///home/amy/pod/");
        assert_eq!(t.style, PathStyle::Platform);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Target::parse("not a uri"),
            Err(UriError::Malformed { .. })
        ));
        assert!(matches!(
            Target::parse("app:opaque"),
            Err(UriError::MissingSelector(_))
        ));
    }

    #[test]
    fn test_canonicalize_container() {
        let mut t = Target::parse("app://mem/pod").unwrap();
        t.canonicalize_container();
        assert_eq!(t.path, "/pod/");
        assert_eq!(t.url, "app://mem/pod/");

        // idempotent
        t.canonicalize_container();
        assert_eq!(t.path, "/pod/");
    }

    #[test]
    fn test_join_styles() {
        assert_eq!(PathStyle::Posix.join("/a/b/", "c.ttl"), "/a/b/c.ttl");
        assert_eq!(PathStyle::Posix.join("/a/b", "c/"), "/a/b/c/");
        assert_eq!(PathStyle::Platform.join("/a/b/", "c.ttl"), "/a/b/c.ttl");
    }

    #[test]
    fn test_normalize_posix() {
        assert_eq!(normalize_posix("/a//b/./c/../d"), "/a/b/d");
        assert_eq!(normalize_posix("/../x"), "/x");
        assert_eq!(normalize_posix("a/../../b/"), "../b/");
        assert_eq!(normalize_posix("/"), "/");
        assert_eq!(normalize_posix(""), ".");
    }

    #[test]
    fn test_is_local() {
        assert!(!is_local("https://example.org/profile/card"));
        assert!(!is_local("http://localhost:3000/"));
        assert!(is_local("file:///tmp/x"));
        assert!(is_local("app://mem/x"));
    }
}
