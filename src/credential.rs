//! Bearer credential resolution.
//!
//! A request carries at most one `Authorization` header. A caller-supplied
//! credential always wins; otherwise the session token is attached; otherwise
//! the request goes out unauthenticated and the server decides.

use reqwest::header::{HeaderValue, AUTHORIZATION};

use crate::options::SecretString;
use crate::request::RequestDescriptor;
use crate::session::SessionState;

/// Key prefix that distinguishes gateway API keys from session tokens.
pub const CALLER_KEY_PREFIX: &str = "sk-or-";

/// Where the credential on a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Token of the logged-in administrator.
    Session,
    /// Key passed explicitly for one call, e.g. an API key under test.
    Caller,
}

/// Format `Bearer <token>`, or `None` if the token is not a valid header value.
pub fn bearer(token: &SecretString) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).ok()?;
    value.set_sensitive(true);
    Some(value)
}

/// Classify the credential carried by an `Authorization` header value.
///
/// Values of the form `Bearer sk-or-...` are caller keys; anything else is
/// treated as a session token.
pub fn kind_of(value: &HeaderValue) -> CredentialKind {
    let is_caller_key = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token.trim_start().starts_with(CALLER_KEY_PREFIX));
    if is_caller_key {
        CredentialKind::Caller
    } else {
        CredentialKind::Session
    }
}

/// Decides the effective `Authorization` header for outgoing requests.
pub struct CredentialResolver<'a> {
    session: &'a dyn SessionState,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(session: &'a dyn SessionState) -> Self {
        Self { session }
    }

    /// Attach the session token unless the request already carries a credential.
    pub fn attach(&self, request: RequestDescriptor) -> RequestDescriptor {
        if request.headers().contains_key(AUTHORIZATION) {
            return request;
        }
        match self.session.token().and_then(|t| bearer(&t)) {
            Some(value) => request.with_header(AUTHORIZATION, value),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySession;
    use reqwest::Method;

    #[test]
    fn test_explicit_header_wins() {
        let session = MemorySession::with_token("jwt");
        let request = RequestDescriptor::new(Method::GET, "/v1/models")
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer sk-or-v1-abc"));

        let request = CredentialResolver::new(&session).attach(request);
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer sk-or-v1-abc");
        assert_eq!(request.credential_kind(), Some(CredentialKind::Caller));
    }

    #[test]
    fn test_session_token_attached() {
        let session = MemorySession::with_token("jwt");
        let request = CredentialResolver::new(&session)
            .attach(RequestDescriptor::new(Method::GET, "/v1/stats"));
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer jwt");
        assert_eq!(request.credential_kind(), Some(CredentialKind::Session));
    }

    #[test]
    fn test_no_credential() {
        let session = MemorySession::new();
        let request = CredentialResolver::new(&session)
            .attach(RequestDescriptor::new(Method::GET, "/v1/stats"));
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(request.credential_kind(), None);
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(
            kind_of(&HeaderValue::from_static("Bearer sk-or-v1-abc")),
            CredentialKind::Caller
        );
        assert_eq!(
            kind_of(&HeaderValue::from_static("Bearer eyJhbGciOi")),
            CredentialKind::Session
        );
        assert_eq!(
            kind_of(&HeaderValue::from_static("sk-or-v1-abc")),
            CredentialKind::Session
        );
    }
}
