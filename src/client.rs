//! Unary request client and error types.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::error::{ErrorClassification, FailureKind};
use crate::http::{build_http_client, build_request, extra_header_map};
use crate::interceptor::{Interceptor, InterceptorChain, Outcome};
use crate::notify::{Navigator, NoopNavigator, Notifier, TracingNotifier};
use crate::options::{ClientOptions, RequestOptions};
use crate::request::RequestDescriptor;
use crate::session::{MemorySession, SessionState};
use crate::stream::StreamingClient;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No response reached the client.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a failure status.
    #[error("{0}")]
    Status(ErrorClassification),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The streaming endpoint refused the request.
    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session store error: {0}")]
    Session(String),
}

impl ClientError {
    /// Classification of a failed response, if this error is one.
    pub fn classification(&self) -> Option<&ErrorClassification> {
        match self {
            ClientError::Status(c) => Some(c),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.classification().map(|c| c.kind)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

/// Client for the gateway's admin API.
///
/// Every call runs through the interceptor chain: the session token is
/// attached unless the call supplies its own credential, failures are
/// reported to the [`Notifier`] and then returned to the caller.
///
/// # Example
/// ```no_run
/// use gaiarouter_admin::client::ApiClient;
/// use gaiarouter_admin::model::{ListParams, ListResponse, Organization};
///
/// # async fn run() -> Result<(), gaiarouter_admin::ClientError> {
/// let client = ApiClient::builder().build()?;
/// let orgs: ListResponse<Organization> = client
///     .get("/v1/organizations")
///     .query(&ListParams { page: Some(1), ..Default::default() })
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    options: ClientOptions,
    http: reqwest::Client,
    session: Arc<dyn SessionState>,
    navigator: Arc<dyn Navigator>,
    chain: InterceptorChain,
    streaming: StreamingClient,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("options", &self.options)
            .field("chain", &self.chain)
            .finish()
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Client with an in-memory session and the default side-effect sinks.
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        Self::builder().options(options).build()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn session(&self) -> &Arc<dyn SessionState> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Client for the chunked chat-completion channel.
    pub fn streaming(&self) -> &StreamingClient {
        &self.streaming
    }

    pub fn get(&self, path: &str) -> PendingRequest<'_> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> PendingRequest<'_> {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> PendingRequest<'_> {
        self.request(Method::PUT, path)
    }

    pub fn patch(&self, path: &str) -> PendingRequest<'_> {
        self.request(Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> PendingRequest<'_> {
        self.request(Method::DELETE, path)
    }

    pub fn request(&self, method: Method, path: &str) -> PendingRequest<'_> {
        PendingRequest {
            client: self,
            descriptor: Ok(RequestDescriptor::new(method, path)),
        }
    }

    /// Send a descriptor through the chain and decode the payload.
    ///
    /// Configured extra headers fill in whatever the descriptor leaves unset,
    /// before the session token is considered.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ClientError> {
        // Client-wide headers are seeded first so the chain sees the effective credential.
        let descriptor =
            descriptor.with_default_headers(&extra_header_map(&self.options.extra_headers));
        let request = self.chain.apply_outbound(descriptor);
        let outcome = self.dispatch(&request).await;
        let body = self.chain.apply_inbound(&request, outcome)?;
        decode_payload(&body)
    }

    async fn dispatch(&self, request: &RequestDescriptor) -> Outcome {
        let response = build_request(&self.http, &self.options, request)
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.bytes().await?);
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(ClientError::Status(ErrorClassification::new(
            status,
            request.credential_kind(),
            &body,
        )))
    }
}

/// Decode a success body; an empty body decodes as JSON `null`.
fn decode_payload<T: DeserializeOwned>(body: &Bytes) -> Result<T, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// A unary request under construction.
///
/// Building errors are held until [`send`](Self::send).
pub struct PendingRequest<'a> {
    client: &'a ApiClient,
    descriptor: Result<RequestDescriptor, ClientError>,
}

impl<'a> PendingRequest<'a> {
    pub fn query<Q: Serialize + ?Sized>(mut self, params: &Q) -> Self {
        self.descriptor = self.descriptor.and_then(|d| d.with_query(params));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.descriptor = self.descriptor.and_then(|d| d.with_body(body));
        self
    }

    pub fn options(mut self, options: &RequestOptions) -> Self {
        self.descriptor = self.descriptor.and_then(|d| d.with_options(options));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.descriptor = self.descriptor.map(|d| d.with_header(name, value));
        self
    }

    pub async fn send<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        self.client.execute(self.descriptor?).await
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    options: ClientOptions,
    session: Option<Arc<dyn SessionState>>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            options: ClientOptions::default(),
            session: None,
            notifier: Arc::new(TracingNotifier),
            navigator: Arc::new(NoopNavigator),
            interceptors: Vec::new(),
        }
    }

    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn session(mut self, session: Arc<dyn SessionState>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Append an interceptor after the built-in credential and failure hooks.
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> Result<ApiClient, ClientError> {
        let session: Arc<dyn SessionState> = match self.session {
            Some(session) => session,
            None => Arc::new(MemorySession::new()),
        };

        let mut chain =
            InterceptorChain::standard(session.clone(), self.notifier, self.navigator.clone());
        for interceptor in self.interceptors {
            chain.push(interceptor);
        }

        Ok(ApiClient {
            http: build_http_client(&self.options)?,
            streaming: StreamingClient::new(self.options.clone())?,
            options: self.options,
            session,
            navigator: self.navigator,
            chain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_decode_empty_payload() {
        let _: () = decode_payload(&Bytes::new()).unwrap();
        let value: serde_json::Value = decode_payload(&Bytes::from_static(b"  \n")).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_decode_payload() {
        let value: serde_json::Value =
            decode_payload(&Bytes::from_static(br#"{"id": "org-1"}"#)).unwrap();
        assert_eq!(value["id"], "org-1");
        assert!(decode_payload::<serde_json::Value>(&Bytes::from_static(b"nope")).is_err());
    }

    #[test]
    fn test_error_accessors() {
        let err = ClientError::Status(ErrorClassification::new(StatusCode::FORBIDDEN, None, b""));
        assert_eq!(err.kind(), Some(FailureKind::Forbidden));
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "HTTP 403: request failed");
        assert!(ClientError::Config("x".to_string()).classification().is_none());
    }

    #[tokio::test]
    async fn test_build_error_surfaces_on_send() {
        let client = ApiClient::builder().build().unwrap();
        let result = client
            .get("/v1/organizations")
            .query(&[1, 2, 3])
            .send::<serde_json::Value>()
            .await;
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
