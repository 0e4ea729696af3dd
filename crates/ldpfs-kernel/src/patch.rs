//! PATCH orchestration.
//!
//! The patch language itself is not interpreted here. A [`ContentPatcher`]
//! is handed the current content and returns the new content; this module
//! checks the precondition and turns the collaborator's answer into either
//! new content or a refusal status.

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use thiserror::Error;

use crate::media::TURTLE;

/// What a patcher sees of the request.
#[derive(Debug, Clone, Copy)]
pub struct PatchRequest<'a> {
    /// Target path.
    pub path: &'a str,
    /// Patch document.
    pub body: &'a [u8],
    /// Request headers, notably `content-type` of the patch document.
    pub headers: &'a HeaderMap,
}

/// Collaborator answer: 200 with new content, or another status with an
/// error text in `content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub status: StatusCode,
    pub content: String,
}

impl PatchOutcome {
    /// Successful patch yielding `content`.
    pub fn patched(content: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content: content.into(),
        }
    }

    /// Failed patch with `status` and a message.
    pub fn failed(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            content: message.into(),
        }
    }
}

/// Collaborator failure.
///
/// A message that starts with a status number (e.g. "409 conflicting
/// insert") reports that status; anything else is a 500.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PatchError {
    message: String,
}

impl PatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Status carried by the message, else 500.
    pub fn status(&self) -> StatusCode {
        let digits: String = self
            .message
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Patch result type.
pub type PatchResult<T> = Result<T, PatchError>;

/// Content-patch collaborator.
#[async_trait]
pub trait ContentPatcher: Send + Sync {
    /// Apply the patch in `request` to `content`.
    async fn patch(
        &self,
        content: &str,
        content_type: &str,
        request: &PatchRequest<'_>,
    ) -> PatchResult<PatchOutcome>;
}

/// Outcome of orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchStep {
    /// New content to write back.
    Patched(String),
    /// The patch was refused; respond with this status and body.
    Refused { status: StatusCode, body: String },
}

/// Run `patcher` over `content`.
///
/// `content_type` must be exactly Turtle; otherwise the step is refused
/// with a 500 naming the path.
pub async fn orchestrate(
    patcher: &dyn ContentPatcher,
    content: &str,
    content_type: &str,
    request: &PatchRequest<'_>,
) -> PatchStep {
    if content_type != TURTLE {
        return PatchStep::Refused {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: format!(r#"500 {} is not a "text/turtle" file"#, request.path),
        };
    }

    match patcher.patch(content, content_type, request).await {
        Ok(outcome) if outcome.status == StatusCode::OK => PatchStep::Patched(outcome.content),
        Ok(outcome) => {
            tracing::warn!(path = %request.path, status = %outcome.status, "patch refused by collaborator");
            PatchStep::Refused {
                status: outcome.status,
                body: outcome.content,
            }
        }
        Err(e) => {
            tracing::warn!(path = %request.path, error = %e, "patch collaborator failed");
            PatchStep::Refused {
                status: e.status(),
                body: e.to_string(),
            }
        }
    }
}
