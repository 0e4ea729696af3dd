//! Collision-avoiding names for POST-created objects.

use uuid::Uuid;

use crate::storage::{ObjectKind, StorageBackend, StorageResult};
use crate::uri::PathStyle;

/// A fresh time-ordered unique token.
pub fn unique_token() -> String {
    Uuid::now_v7().to_string()
}

/// Returns true if a requested slug is usable as a single path segment.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.contains('/')
}

/// Full path of `name` under `parent`, with a trailing `/` for containers.
pub fn candidate_path(parent: &str, name: &str, kind: ObjectKind, style: PathStyle) -> String {
    let mut path = style.join(parent, name);
    if kind.is_container() && !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// Pick the short name for a new object under `parent`.
///
/// Without a slug, a unique token is used. If the candidate already
/// exists, one retry is made with `<token>-<slug>`. The retried name is
/// not probed again: a second collision would need two equal time-ordered
/// tokens.
pub async fn available_name(
    backend: &dyn StorageBackend,
    parent: &str,
    slug: Option<&str>,
    kind: ObjectKind,
    style: PathStyle,
) -> StorageResult<String> {
    let slug = match slug {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => unique_token(),
    };

    let candidate = candidate_path(parent, &slug, kind, style);
    if backend.exists(&candidate).await? {
        let renamed = format!("{}-{slug}", unique_token());
        tracing::debug!(taken = %candidate, name = %renamed, "slug collision, renaming");
        return Ok(renamed);
    }
    Ok(slug)
}
