//! Streaming chat completion against a running gateway.
//!
//! Run with:
//! ```bash
//! export GAIAROUTER_API_BASE_URL="http://localhost:8000"
//! export GAIAROUTER_API_KEY="sk-or-v1-..."
//! cargo run --example stream_chat
//! ```

use std::io::Write;

use futures::StreamExt;
use gaiarouter_admin::model::{ChatMessage, ChatRequest, Role};
use gaiarouter_admin::{ClientOptions, SecretString, StreamingClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("gaiarouter_admin=debug")
        .init();

    let api_key = std::env::var("GAIAROUTER_API_KEY")
        .expect("GAIAROUTER_API_KEY environment variable must be set");
    let client = StreamingClient::new(ClientOptions::from_env())?;

    let mut request = ChatRequest::new(
        "openai/gpt-4o-mini",
        vec![ChatMessage::text(Role::User, "Write a haiku about Rust programming.")],
    );
    request.temperature = Some(0.9);

    println!("Streaming response...\n");

    let session = client
        .open(&request, Some(&SecretString::new(api_key)))
        .await?;
    let stream = session.into_stream();
    futures::pin_mut!(stream);

    while let Some(delta) = stream.next().await {
        print!("{}", delta?);
        std::io::stdout().flush()?;
    }

    println!("\n\nStream completed.");
    Ok(())
}
