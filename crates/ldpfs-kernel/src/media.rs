//! Extension and content-type inference.

use crate::storage::ObjectKind;

/// Structured-text type used for listings, sidecars and PATCH targets.
pub const TURTLE: &str = "text/turtle";

/// Last path segment, ignoring a trailing `/`.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Extension of a path, with the leading dot.
///
/// A dotfile name counts as its own extension, so `/c/.acl` yields `.acl`
/// and `/c/.meta` yields `.meta`. Otherwise this is the text from the last
/// dot of the basename (`a.meta.acl` yields `.acl`), or empty.
pub fn extension(path: &str) -> &str {
    let name = basename(path);
    if name.starts_with('.') {
        return name;
    }
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx..],
        _ => "",
    }
}

/// Content type for an extension and object kind.
///
/// Containers, sidecars, `.ttl` and extensionless names are Turtle.
/// Anything else is looked up by extension, falling back to Turtle.
pub fn content_type(ext: &str, kind: ObjectKind) -> String {
    if ext.is_empty() || matches!(ext, ".ttl" | ".acl" | ".meta") || kind.is_container() {
        return TURTLE.to_string();
    }

    match mime_guess::from_ext(ext.trim_start_matches('.')).first() {
        Some(mime) => with_charset(mime.essence_str()),
        None => TURTLE.to_string(),
    }
}

/// Media type without parameters (`text/plain; charset=utf-8` → `text/plain`).
pub fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or(content_type).trim()
}

/// Textual types carry an explicit UTF-8 charset.
fn with_charset(essence: &str) -> String {
    let textual = essence.starts_with("text/")
        || matches!(essence, "application/json" | "application/javascript");
    if textual {
        format!("{essence}; charset=utf-8")
    } else {
        essence.to_string()
    }
}
