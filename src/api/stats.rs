//! Usage statistics.

use crate::client::{ApiClient, ClientError};
use crate::model::{GlobalStatsResponse, KeyStatsResponse, StatsQuery};

use super::api_keys::key_path;

const STATS_PATH: &str = "/v1/stats";

pub struct Stats<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn stats(&self) -> Stats<'_> {
        Stats { client: self }
    }
}

impl Stats<'_> {
    pub async fn global(&self, query: &StatsQuery) -> Result<GlobalStatsResponse, ClientError> {
        self.client.get(STATS_PATH).query(query).send().await
    }

    pub async fn key(&self, key_id: &str, query: &StatsQuery) -> Result<KeyStatsResponse, ClientError> {
        self.client
            .get(&format!("{}/stats", key_path(key_id)))
            .query(query)
            .send()
            .await
    }
}
