//! Streaming chat completions.
//!
//! This path talks to the chunked endpoint directly instead of going
//! through the interceptor chain: the only credential sent is the one the
//! caller passes, the session token is never attached, and a rejected
//! request does not touch the session or notify the user.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::client::ClientError;
use crate::credential::bearer;
use crate::http::{build_streaming_client, extra_header_map};
use crate::model::ChatRequest;
use crate::options::{ClientOptions, SecretString};
use crate::sse::{DeltaExtractor, PointerExtractor, StreamDecoder};

/// Chat completions endpoint.
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// State of one streaming call: the byte source, the decoder and any
/// deltas decoded but not yet handed out.
///
/// The session ends when the sentinel arrives, the source ends, or the
/// source fails. It is not reusable afterwards.
pub struct StreamSession<E = PointerExtractor> {
    source: ByteStream,
    decoder: StreamDecoder<E>,
    ready: VecDeque<String>,
}

impl StreamSession {
    /// Session over any byte stream.
    pub fn new<S, SE>(source: S) -> Self
    where
        S: Stream<Item = Result<Bytes, SE>> + Send + 'static,
        SE: Into<ClientError>,
    {
        Self::with_decoder(source, StreamDecoder::new())
    }

    /// Session over a response body.
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream())
    }
}

impl<E: DeltaExtractor> StreamSession<E> {
    pub fn with_decoder<S, SE>(source: S, decoder: StreamDecoder<E>) -> Self
    where
        S: Stream<Item = Result<Bytes, SE>> + Send + 'static,
        SE: Into<ClientError>,
    {
        Self {
            source: Box::pin(source.map(|r| r.map_err(Into::into))),
            decoder,
            ready: VecDeque::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.decoder.is_closed() && self.ready.is_empty()
    }

    /// Next text delta, or `None` once the stream has ended.
    pub async fn next_delta(&mut self) -> Result<Option<String>, ClientError> {
        loop {
            if let Some(delta) = self.ready.pop_front() {
                return Ok(Some(delta));
            }
            if self.decoder.is_closed() {
                return Ok(None);
            }

            let ready = &mut self.ready;
            match self.source.next().await {
                Some(Ok(chunk)) => {
                    self.decoder.feed(&chunk, |d| ready.push_back(d.to_string()));
                }
                Some(Err(e)) => {
                    self.decoder.close();
                    return Err(e);
                }
                None => {
                    debug!("stream source ended");
                    self.decoder.finish(|d| ready.push_back(d.to_string()));
                }
            }
        }
    }

    /// Drive the session to the end, calling `on_delta` for each delta in order.
    pub async fn run<F>(mut self, mut on_delta: F) -> Result<(), ClientError>
    where
        F: FnMut(&str),
    {
        while let Some(delta) = self.next_delta().await? {
            on_delta(&delta);
        }
        Ok(())
    }
}

impl<E: DeltaExtractor + 'static> StreamSession<E> {
    /// Deltas as a `Stream`. Ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        stream::unfold(Some(self), |session| async move {
            let mut session = session?;
            match session.next_delta().await {
                Ok(Some(delta)) => Some((Ok(delta), Some(session))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

/// Client for the chunked chat-completion channel.
#[derive(Debug, Clone)]
pub struct StreamingClient {
    options: ClientOptions,
    http: reqwest::Client,
}

impl StreamingClient {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_streaming_client(&options)?,
            options,
        })
    }

    /// Open the stream. `stream` is forced on in the request body.
    ///
    /// A failure status is returned as [`ClientError::Stream`] carrying the
    /// server's raw text, or a status message when the body is empty.
    pub async fn open(
        &self,
        request: &ChatRequest,
        credential: Option<&SecretString>,
    ) -> Result<StreamSession, ClientError> {
        let mut body = request.clone();
        body.stream = Some(true);

        let mut headers = extra_header_map(&self.options.extra_headers);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.remove(AUTHORIZATION);
        if let Some(credential) = credential {
            let value = bearer(credential).ok_or_else(|| {
                ClientError::Config("credential is not a valid header value".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        debug!(model = %body.model, "opening chat stream");
        let response = self
            .http
            .post(self.options.url(CHAT_COMPLETIONS_PATH))
            .headers(headers)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                format!("request failed with status {}", status.as_u16())
            } else {
                text
            };
            return Err(ClientError::Stream(message));
        }

        Ok(StreamSession::from_response(response))
    }

    /// Stream a chat completion, calling `on_delta` for each text fragment.
    ///
    /// Returns once the sentinel arrives or the server closes the stream.
    pub async fn stream_chat_completion<F>(
        &self,
        request: &ChatRequest,
        credential: Option<&SecretString>,
        on_delta: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&str),
    {
        self.open(request, credential).await?.run(on_delta).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&'static str]) -> Vec<Result<Bytes, ClientError>> {
        parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect()
    }

    #[tokio::test]
    async fn test_run_collects_deltas_in_order() {
        let source = stream::iter(chunks(&[
            "data: {\"delta\":\"a\"}\n",
            "\ndata: {\"del",
            "ta\":\"b\"}\n\ndata: [DONE]\n\n",
        ]));
        let mut out = Vec::new();
        StreamSession::new(source)
            .run(|d| out.push(d.to_string()))
            .await
            .unwrap();
        assert_eq!(out, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_sentinel_stops_reading() {
        let source = stream::iter(chunks(&["data: {\"delta\":\"a\"}\n\ndata: [DONE]\n\n"]))
            .chain(stream::once(async {
                Err(ClientError::Stream("should not be read".to_string()))
            }));
        let mut out = Vec::new();
        StreamSession::new(source)
            .run(|d| out.push(d.to_string()))
            .await
            .unwrap();
        assert_eq!(out, vec!["a"]);
    }

    #[tokio::test]
    async fn test_source_end_without_sentinel() {
        let source = stream::iter(chunks(&["data: {\"delta\":\"a\"}\n\ndata: {\"delta\":\"b\"}"]));
        let mut session = StreamSession::new(source);
        assert_eq!(session.next_delta().await.unwrap().as_deref(), Some("a"));
        assert_eq!(session.next_delta().await.unwrap().as_deref(), Some("b"));
        assert_eq!(session.next_delta().await.unwrap(), None);
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_transport_error_ends_session() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"delta\":\"a\"}\n\n")),
            Err(ClientError::Stream("connection reset".to_string())),
            Ok(Bytes::from_static(b"data: {\"delta\":\"b\"}\n\n")),
        ]);
        let mut out = Vec::new();
        let result = StreamSession::new(source).run(|d| out.push(d.to_string())).await;
        assert!(matches!(result, Err(ClientError::Stream(_))));
        assert_eq!(out, vec!["a"]);
    }

    #[tokio::test]
    async fn test_into_stream() {
        let source = stream::iter(chunks(&[
            "data: {\"delta\":\"x\"}\n\ndata: {bad\n\ndata: {\"delta\":\"y\"}\n\n",
        ]));
        let deltas: Vec<String> = StreamSession::new(source)
            .into_stream()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["x", "y"]);
    }
}
