//! Upstream model catalog administration.
//!
//! Model ids contain slashes (`openai/gpt-4o`), so they are percent-encoded
//! before being placed in a path.

use serde_json::Value;

use crate::client::{ApiClient, ClientError};
use crate::model::{AdminModel, BatchUpdateModelsRequest, ListResponse, ModelListParams};

const ADMIN_MODELS_PATH: &str = "/v1/admin/models";

pub struct AdminModels<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn admin_models(&self) -> AdminModels<'_> {
        AdminModels { client: self }
    }
}

fn toggle_path(model_id: &str, action: &str) -> String {
    format!(
        "{}/{}/{}",
        ADMIN_MODELS_PATH,
        urlencoding::encode(model_id),
        action
    )
}

impl AdminModels<'_> {
    /// Pull the catalog from the upstream provider.
    pub async fn sync(&self) -> Result<Value, ClientError> {
        self.client
            .post(&format!("{}/sync", ADMIN_MODELS_PATH))
            .send()
            .await
    }

    pub async fn list(&self, params: &ModelListParams) -> Result<ListResponse<AdminModel>, ClientError> {
        self.client.get(ADMIN_MODELS_PATH).query(params).send().await
    }

    pub async fn enable(&self, model_id: &str) -> Result<Value, ClientError> {
        self.client.patch(&toggle_path(model_id, "enable")).send().await
    }

    pub async fn disable(&self, model_id: &str) -> Result<Value, ClientError> {
        self.client.patch(&toggle_path(model_id, "disable")).send().await
    }

    pub async fn batch_update(&self, model_ids: Vec<String>, is_enabled: bool) -> Result<Value, ClientError> {
        let request = BatchUpdateModelsRequest { model_ids, is_enabled };
        self.client
            .post(&format!("{}/batch-update", ADMIN_MODELS_PATH))
            .json(&request)
            .send()
            .await
    }
}
