//! API key management.

use serde_json::Value;

use crate::client::{ApiClient, ClientError};
use crate::model::{
    ApiKey, CreateApiKeyRequest, KeyStatsResponse, ListParams, ListResponse, StatsQuery,
    UpdateApiKeyRequest,
};

const API_KEYS_PATH: &str = "/v1/api-keys";

pub struct ApiKeys<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn api_keys(&self) -> ApiKeys<'_> {
        ApiKeys { client: self }
    }
}

pub(crate) fn key_path(id: &str) -> String {
    format!("{}/{}", API_KEYS_PATH, id)
}

impl ApiKeys<'_> {
    pub async fn list(&self, params: &ListParams) -> Result<ListResponse<ApiKey>, ClientError> {
        self.client.get(API_KEYS_PATH).query(params).send().await
    }

    pub async fn get(&self, id: &str) -> Result<ApiKey, ClientError> {
        self.client.get(&key_path(id)).send().await
    }

    /// Issue a key. The plaintext value is only present in this response.
    pub async fn create(&self, request: &CreateApiKeyRequest) -> Result<ApiKey, ClientError> {
        self.client.post(API_KEYS_PATH).json(request).send().await
    }

    pub async fn update(&self, id: &str, request: &UpdateApiKeyRequest) -> Result<ApiKey, ClientError> {
        self.client.patch(&key_path(id)).json(request).send().await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ClientError> {
        self.client.delete(&key_path(id)).send().await
    }

    pub async fn stats(&self, id: &str, query: &StatsQuery) -> Result<KeyStatsResponse, ClientError> {
        self.client.stats().key(id, query).await
    }
}
