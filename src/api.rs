//! Typed endpoint groups of the admin API.
//!
//! Each group borrows an [`ApiClient`](crate::client::ApiClient) and goes
//! through its interceptor chain, except [`chat::Chat::send_chat_message_stream`]
//! which uses the streaming client.

pub mod admin_models;
pub mod api_keys;
pub mod auth;
pub mod chat;
pub mod organizations;
pub mod stats;

pub use admin_models::AdminModels;
pub use api_keys::ApiKeys;
pub use auth::Auth;
pub use chat::Chat;
pub use organizations::Organizations;
pub use stats::Stats;
