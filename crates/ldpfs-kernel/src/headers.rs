//! Response header synthesis.
//!
//! Precedence, field by field:
//!
//! | Field | Source order |
//! |---|---|
//! | location, url, date, allow, wac-allow, x-powered-by, content-type, link | backend hook, then default |
//! | ms-author-via, accept-patch | always set when patching is enabled |
//! | anything | operation reply headers override all of the above |

use chrono::{DateTime, SecondsFormat, Utc};
use http::header::{ALLOW, CONTENT_TYPE, DATE, LINK, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue};
use percent_encoding::{CONTROLS, utf8_percent_encode};

use crate::media::{basename, content_type, extension};
use crate::storage::ObjectKind;

pub const URL: HeaderName = HeaderName::from_static("url");
pub const WAC_ALLOW: HeaderName = HeaderName::from_static("wac-allow");
pub const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");
pub const MS_AUTHOR_VIA: HeaderName = HeaderName::from_static("ms-author-via");
pub const ACCEPT_PATCH: HeaderName = HeaderName::from_static("accept-patch");

const ALLOW_WITH_PATCH: &str = "OPTIONS,HEAD,GET,POST,PUT,PATCH,DELETE";
const ALLOW_WITHOUT_PATCH: &str = "OPTIONS,HEAD,GET,POST,PUT,DELETE";
const WAC_ALLOW_VALUE: &str = r#"user="read write append control",public="read""#;
const LDP: &str = "http://www.w3.org/ns/ldp#";

/// Inputs to header synthesis for one response.
#[derive(Debug, Clone)]
pub struct HeaderContext<'a> {
    /// Path the response is about.
    pub path: &'a str,
    /// Identifier reported in `location` and `url`.
    pub url: &'a str,
    /// Kind of the object at `path`.
    pub kind: ObjectKind,
    /// Backend display name.
    pub backend_name: &'a str,
    /// Whether a patch collaborator is configured.
    pub patch_enabled: bool,
    /// Time stamped into `date`.
    pub now: DateTime<Utc>,
}

/// Build the response headers for `ctx`.
///
/// `custom` is the backend's own header set; its values block the
/// corresponding defaults.
pub fn synthesize(ctx: &HeaderContext<'_>, custom: Option<&HeaderMap>) -> HeaderMap {
    let mut headers = custom.cloned().unwrap_or_default();
    let ext = extension(ctx.path);

    // location and url always agree
    let location = headers
        .get(LOCATION)
        .cloned()
        .unwrap_or_else(|| header_value(ctx.url));
    headers.insert(LOCATION, location.clone());
    headers.insert(URL, location);

    set_default(
        &mut headers,
        DATE,
        &ctx.now.to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    set_default(
        &mut headers,
        ALLOW,
        if ctx.patch_enabled {
            ALLOW_WITH_PATCH
        } else {
            ALLOW_WITHOUT_PATCH
        },
    );
    set_default(&mut headers, WAC_ALLOW, WAC_ALLOW_VALUE);
    set_default(&mut headers, X_POWERED_BY, ctx.backend_name);
    set_default(&mut headers, CONTENT_TYPE, &content_type(ext, ctx.kind));

    if ctx.patch_enabled {
        headers.insert(MS_AUTHOR_VIA, HeaderValue::from_static("SPARQL"));
        headers.insert(ACCEPT_PATCH, HeaderValue::from_static("application/sparql-update"));
    }

    set_default(&mut headers, LINK, &link_relations(ctx.path, ext, ctx.kind));
    headers
}

/// Overlay headers returned by a backend operation.
///
/// Every field the operation sets replaces the synthesized one.
pub fn apply_operation(headers: &mut HeaderMap, operation: &HeaderMap) {
    for name in operation.keys() {
        headers.remove(name);
        for value in operation.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
}

/// `link` value pointing at the object's sidecars and declaring its LDP type.
pub fn link_relations(path: &str, ext: &str, kind: ObjectKind) -> String {
    let name = basename(path);
    match ext {
        ".acl" => format!(r#"<{LDP}Resource>; rel="type""#),
        ".meta" => format!(r#"<{name}.acl>; rel="acl",<{LDP}Resource>; rel="type""#),
        _ if kind.is_container() => format!(
            r#"<.meta>; rel="describedBy", <.acl>; rel="acl",<{LDP}Container>; rel="type",<{LDP}BasicContainer>; rel="type""#
        ),
        _ => format!(
            r#"<{name}.meta>; rel="describedBy", <{name}.acl>; rel="acl",<{LDP}Resource>; rel="type""#
        ),
    }
}

fn set_default(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if !headers.contains_key(&name) {
        headers.insert(name, header_value(value));
    }
}

/// Header value for arbitrary text.
///
/// Text the header grammar rejects is sent percent-encoded: controls and
/// every non-ASCII byte, which leaves only visible ASCII.
fn header_value(text: &str) -> HeaderValue {
    if let Ok(value) = HeaderValue::from_str(text) {
        return value;
    }
    let encoded = utf8_percent_encode(text, CONTROLS).to_string();
    HeaderValue::from_str(&encoded).unwrap_or_else(|e| {
        tracing::warn!(error = %e, text = %encoded, "header value dropped");
        HeaderValue::from_static("")
    })
}
