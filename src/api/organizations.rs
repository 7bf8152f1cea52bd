//! Organization management.

use serde_json::Value;

use crate::client::{ApiClient, ClientError};
use crate::model::{
    CreateOrganizationRequest, KeyStatsResponse, ListParams, ListResponse, Organization,
    StatsQuery, UpdateOrganizationRequest,
};

const ORGANIZATIONS_PATH: &str = "/v1/organizations";

pub struct Organizations<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn organizations(&self) -> Organizations<'_> {
        Organizations { client: self }
    }
}

fn item_path(id: &str) -> String {
    format!("{}/{}", ORGANIZATIONS_PATH, id)
}

impl Organizations<'_> {
    /// List organizations. `organization_id` in `params` is not used by this endpoint.
    pub async fn list(&self, params: &ListParams) -> Result<ListResponse<Organization>, ClientError> {
        self.client.get(ORGANIZATIONS_PATH).query(params).send().await
    }

    pub async fn get(&self, id: &str) -> Result<Organization, ClientError> {
        self.client.get(&item_path(id)).send().await
    }

    pub async fn create(&self, request: &CreateOrganizationRequest) -> Result<Organization, ClientError> {
        self.client.post(ORGANIZATIONS_PATH).json(request).send().await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &UpdateOrganizationRequest,
    ) -> Result<Organization, ClientError> {
        self.client.patch(&item_path(id)).json(request).send().await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ClientError> {
        self.client.delete(&item_path(id)).send().await
    }

    /// Usage totals across every key of the organization.
    pub async fn stats(&self, id: &str, query: &StatsQuery) -> Result<KeyStatsResponse, ClientError> {
        self.client
            .get(&format!("{}/stats", item_path(id)))
            .query(query)
            .send()
            .await
    }
}
