//! Storage backends.
//!
//! Backends implement [`StorageBackend`](crate::storage::StorageBackend) for
//! different storage types.

mod local;
mod memory;

pub use local::LocalBackend;
pub use memory::MemoryBackend;

use chrono::{DateTime, Utc};
use http::HeaderValue;
use std::time::SystemTime;

/// Format a timestamp as an HTTP date (`Tue, 15 Oct 2026 08:00:00 GMT`).
fn http_date(time: SystemTime) -> HeaderValue {
    let time: DateTime<Utc> = time.into();
    let formatted = time.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    // always visible ASCII
    HeaderValue::from_str(&formatted).unwrap_or_else(|_| HeaderValue::from_static(""))
}
