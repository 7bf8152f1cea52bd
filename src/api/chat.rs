//! Model listing and chat completions, optionally under an explicit API key.

use crate::client::{ApiClient, ClientError};
use crate::model::{ChatRequest, ChatResponse, ModelList};
use crate::options::{RequestOptions, SecretString};
use crate::stream::CHAT_COMPLETIONS_PATH;

const MODELS_PATH: &str = "/v1/models";

pub struct Chat<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn chat(&self) -> Chat<'_> {
        Chat { client: self }
    }
}

fn key_options(api_key: Option<&SecretString>) -> RequestOptions {
    RequestOptions {
        explicit_credential: api_key.cloned(),
        extra_headers: None,
    }
}

impl Chat<'_> {
    /// List models. With `api_key`, the listing is what that key can see.
    pub async fn list_models(&self, api_key: Option<&SecretString>) -> Result<ModelList, ClientError> {
        self.client
            .get(MODELS_PATH)
            .options(&key_options(api_key))
            .send()
            .await
    }

    pub async fn send_chat_message(
        &self,
        request: &ChatRequest,
        api_key: Option<&SecretString>,
    ) -> Result<ChatResponse, ClientError> {
        self.client
            .post(CHAT_COMPLETIONS_PATH)
            .json(request)
            .options(&key_options(api_key))
            .send()
            .await
    }

    /// Stream a completion. Only `api_key` is sent: the session token is not used here.
    pub async fn send_chat_message_stream<F>(
        &self,
        request: &ChatRequest,
        api_key: Option<&SecretString>,
        on_delta: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&str),
    {
        self.client
            .streaming()
            .stream_chat_completion(request, api_key, on_delta)
            .await
    }
}
