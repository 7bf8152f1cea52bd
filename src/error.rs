//! Classification of failed responses.

use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;

use crate::credential::CredentialKind;

/// Message used when the payload carries none of the recognized fields.
pub const FALLBACK_MESSAGE: &str = "request failed";

/// Payload fields tried in order for a human-readable message.
const MESSAGE_POINTERS: [&str; 3] = ["/error/message", "/detail", "/message"];

/// Failure category, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 401
    Unauthenticated,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// Any other non-success status below 500.
    ClientOther,
    /// 500 and above.
    Server,
}

impl FailureKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => FailureKind::Unauthenticated,
            StatusCode::FORBIDDEN => FailureKind::Forbidden,
            StatusCode::NOT_FOUND => FailureKind::NotFound,
            s if s.is_server_error() => FailureKind::Server,
            _ => FailureKind::ClientOther,
        }
    }
}

/// A failed response as seen by the interceptor chain and the caller.
#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub status: StatusCode,
    pub kind: FailureKind,
    /// Credential the request was sent with, if any.
    pub credential_kind: Option<CredentialKind>,
    /// Message found in the payload, if any.
    pub server_message: Option<String>,
    /// Decoded JSON payload, kept for call sites that inspect field errors.
    pub payload: Option<Value>,
}

impl ErrorClassification {
    /// Classify a failed response from its status and raw body.
    pub fn new(status: StatusCode, credential_kind: Option<CredentialKind>, body: &[u8]) -> Self {
        let payload = serde_json::from_slice::<Value>(body).ok();
        let server_message = payload.as_ref().and_then(resolve_message);
        Self {
            status,
            kind: FailureKind::from_status(status),
            credential_kind,
            server_message,
            payload,
        }
    }

    /// Resolved message, or [`FALLBACK_MESSAGE`].
    pub fn message(&self) -> &str {
        self.server_message.as_deref().unwrap_or(FALLBACK_MESSAGE)
    }

    /// Whether a 401 was caused by a caller-supplied key rather than the session.
    pub fn is_caller_key_rejection(&self) -> bool {
        self.kind == FailureKind::Unauthenticated
            && self.credential_kind == Some(CredentialKind::Caller)
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status.as_u16(), self.message())
    }
}

/// First non-empty string among `error.message`, `detail`, `message`.
pub fn resolve_message(payload: &Value) -> Option<String> {
    MESSAGE_POINTERS
        .iter()
        .filter_map(|pointer| payload.pointer(pointer))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
