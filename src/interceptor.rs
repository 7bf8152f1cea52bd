//! Interceptors wrapped around every unary call.
//!
//! A chain is fixed when the client is built. Outbound hooks run in
//! insertion order on the request descriptor; inbound hooks run in reverse
//! order on the outcome, so the first interceptor added is both the first to
//! see the request and the last to see the response.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gaiarouter_admin::interceptor::InterceptorChain;
//! use gaiarouter_admin::notify::{NoopNavigator, TracingNotifier};
//! use gaiarouter_admin::session::MemorySession;
//!
//! let chain = InterceptorChain::standard(
//!     Arc::new(MemorySession::new()),
//!     Arc::new(TracingNotifier),
//!     Arc::new(NoopNavigator),
//! );
//! ```

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::client::ClientError;
use crate::credential::CredentialResolver;
use crate::error::FailureKind;
use crate::notify::{Navigator, Notifier};
use crate::request::RequestDescriptor;
use crate::session::SessionState;

pub const SESSION_EXPIRED_MESSAGE: &str = "session expired, please log in again";
pub const INVALID_KEY_MESSAGE: &str = "API key is invalid or expired";
pub const FORBIDDEN_MESSAGE: &str = "insufficient permission";
pub const NOT_FOUND_MESSAGE: &str = "resource not found";
pub const SERVER_ERROR_MESSAGE: &str = "server error, please retry later";
pub const NETWORK_ERROR_MESSAGE: &str = "network error, please check your connection";

/// Result of a unary call as seen by inbound hooks: the unwrapped body on
/// success, the classified failure otherwise.
pub type Outcome = Result<Bytes, ClientError>;

/// A hook around unary calls. Both methods default to pass-through.
pub trait Interceptor: Send + Sync {
    /// Transform the request before it is sent. Must not fail.
    fn outbound(&self, request: RequestDescriptor) -> RequestDescriptor {
        request
    }

    /// Inspect or transform the outcome. `request` is the descriptor as sent.
    fn inbound(&self, request: &RequestDescriptor, outcome: Outcome) -> Outcome {
        let _ = request;
        outcome
    }
}

/// Ordered interceptors, composed at construction time.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("count", &self.interceptors.len())
            .finish()
    }
}

impl InterceptorChain {
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self { interceptors }
    }

    /// Credential injection followed by failure handling.
    pub fn standard(
        session: Arc<dyn SessionState>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(vec![
            Arc::new(CredentialInterceptor::new(session.clone())),
            Arc::new(FailureInterceptor::new(session, notifier, navigator)),
        ])
    }

    /// Append an interceptor; it runs last outbound and first inbound.
    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn apply_outbound(&self, request: RequestDescriptor) -> RequestDescriptor {
        self.interceptors
            .iter()
            .fold(request, |req, interceptor| interceptor.outbound(req))
    }

    pub fn apply_inbound(&self, request: &RequestDescriptor, outcome: Outcome) -> Outcome {
        self.interceptors
            .iter()
            .rev()
            .fold(outcome, |out, interceptor| interceptor.inbound(request, out))
    }
}

/// Attaches the session token unless the request already carries a credential.
pub struct CredentialInterceptor {
    session: Arc<dyn SessionState>,
}

impl CredentialInterceptor {
    pub fn new(session: Arc<dyn SessionState>) -> Self {
        Self { session }
    }
}

impl Interceptor for CredentialInterceptor {
    fn outbound(&self, request: RequestDescriptor) -> RequestDescriptor {
        let request = CredentialResolver::new(self.session.as_ref()).attach(request);
        debug!(
            method = %request.method(),
            path = request.path(),
            credential = ?request.credential_kind(),
            "outbound request"
        );
        request
    }
}

/// Notifies the user about failures and expires the session on a rejected token.
///
/// The failure is always passed on to the caller after handling.
pub struct FailureInterceptor {
    session: Arc<dyn SessionState>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl FailureInterceptor {
    pub fn new(
        session: Arc<dyn SessionState>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            notifier,
            navigator,
        }
    }

    fn handle(&self, request: &RequestDescriptor, error: &ClientError) {
        match error {
            ClientError::Status(c) => {
                warn!(
                    method = %request.method(),
                    path = request.path(),
                    status = c.status.as_u16(),
                    kind = ?c.kind,
                    "request failed: {}",
                    c.message()
                );
                match c.kind {
                    FailureKind::Unauthenticated if c.is_caller_key_rejection() => {
                        let message = c.server_message.as_deref().unwrap_or(INVALID_KEY_MESSAGE);
                        self.notifier.error(message);
                    }
                    FailureKind::Unauthenticated => self.expire_session(),
                    FailureKind::Forbidden => self.notifier.error(FORBIDDEN_MESSAGE),
                    FailureKind::NotFound => self.notifier.error(NOT_FOUND_MESSAGE),
                    FailureKind::Server => self.notifier.error(SERVER_ERROR_MESSAGE),
                    FailureKind::ClientOther => self.notifier.error(c.message()),
                }
            }
            ClientError::Transport(e) => {
                warn!(method = %request.method(), path = request.path(), "no response: {}", e);
                self.notifier.error(NETWORK_ERROR_MESSAGE);
            }
            // A response arrived but could not be used; nothing to tell the user.
            _ => {}
        }
    }

    fn expire_session(&self) {
        if let Err(e) = self.session.clear() {
            warn!("failed to clear session: {}", e);
        } else {
            info!("session cleared after rejected token");
        }
        self.navigator.redirect_to_login();
        self.notifier.error(SESSION_EXPIRED_MESSAGE);
    }
}

impl Interceptor for FailureInterceptor {
    fn inbound(&self, request: &RequestDescriptor, outcome: Outcome) -> Outcome {
        if let Err(error) = &outcome {
            self.handle(request, error);
        }
        outcome
    }
}
