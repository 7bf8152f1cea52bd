//! # gaiarouter-admin - Admin client for the GaiaRouter LLM gateway
//!
//! A small async client for the gateway's admin API: organizations, API
//! keys, usage statistics, the model catalog, and chat completions with
//! incremental streaming.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Interceptor chain around every unary call (credential attachment,
//!   failure classification and notification)
//! - Session store abstraction, in memory or persisted to a file
//! - Streaming chat completions decoded from the event-stream channel
//! - Type-safe request/response models
//!
//! ## Architecture
//!
//! There are two transport paths:
//!
//! 1. **Unary calls** go through [`ApiClient`]. The session token is attached
//!    unless the call passes its own credential. Failures are classified,
//!    reported to the [`Notifier`](notify::Notifier), and still returned.
//!    A rejected session clears the session and redirects to login.
//! 2. **Streaming calls** go through [`StreamingClient`], which sends only
//!    the credential the caller passes and hands text deltas to a callback
//!    as they are decoded.
//!
//! ## Example
//! ```no_run
//! use gaiarouter_admin::ApiClient;
//! use gaiarouter_admin::model::{ChatMessage, ChatRequest, Role};
//! use gaiarouter_admin::options::{ClientOptions, SecretString};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ClientOptions::from_env())?;
//!     client.auth().login("admin", "secret").await?;
//!
//!     let keys = client.api_keys().list(&Default::default()).await?;
//!     println!("{} keys", keys.pagination.total);
//!
//!     let key = SecretString::from("sk-or-v1-...");
//!     let request = ChatRequest::new(
//!         "openai/gpt-4o-mini",
//!         vec![ChatMessage::text(Role::User, "Hello!")],
//!     );
//!     client
//!         .chat()
//!         .send_chat_message_stream(&request, Some(&key), |delta| print!("{delta}"))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod credential;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod model;
pub mod notify;
pub mod options;
pub mod request;
pub mod session;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use client::{ApiClient, ApiClientBuilder, ClientError};
pub use credential::{CredentialKind, CredentialResolver};
pub use error::{ErrorClassification, FailureKind};
pub use interceptor::{Interceptor, InterceptorChain};
pub use options::{ClientOptions, RequestOptions, SecretString};
pub use session::{FileSession, MemorySession, SessionState};
pub use sse::StreamDecoder;
pub use stream::{StreamSession, StreamingClient};
