//! Monday.com egress connector

use crate::{
    Result,
    client::{HttpClientConfig, create_client, read_json, with_retry},
};
use async_trait::async_trait;
use msbt_core::{DataSource, SourceKind, SourceRequest};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, instrument};

/// Monday connector configuration
#[derive(Debug, Clone)]
pub struct MondayConfig {
    /// API token sent verbatim in the Authorization header
    pub api_key: String,

    /// GraphQL endpoint (default: https://api.monday.com/v2)
    pub base_url: String,

    /// Value of the `API-Version` header
    pub api_version: String,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl MondayConfig {
    /// Create a new Monday configuration
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.monday.com/v2".to_string(),
            api_version: "2023-10".to_string(),
            client_config: HttpClientConfig::default(),
        }
    }

    /// Set the base URL (for custom endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API version
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

/// Monday connector
pub struct MondayConnector {
    config: MondayConfig,
    client: Client,
}

impl MondayConnector {
    /// Create a new Monday connector
    pub fn new(config: MondayConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self { config, client })
    }

    /// Run a GraphQL read. The selection is wrapped as `query <selection>`.
    #[instrument(skip(self))]
    pub async fn api(&self, query: &str) -> Result<serde_json::Value> {
        let body = json!({ "query": format!("query {}", query) });
        debug!("Sending GraphQL query to Monday");

        with_retry(self.config.client_config.max_retries, || {
            let body = &body;
            async move {
                let response = self
                    .client
                    .post(&self.config.base_url)
                    .header("Authorization", &self.config.api_key)
                    .header("API-Version", &self.config.api_version)
                    .json(body)
                    .send()
                    .await?;

                read_json(response, "Monday").await
            }
        })
        .await
    }
}

#[async_trait]
impl DataSource for MondayConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Monday
    }

    async fn execute(&self, request: SourceRequest) -> msbt_core::Result<serde_json::Value> {
        let query = request
            .envelope
            .query_text()
            .ok_or_else(|| msbt_core::Error::InvalidRequest("Query is required".to_string()))?;

        let response = self.api(query).await?;
        info!("🟡[monday]: {}", query);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MondayConfig::new("key");
        assert_eq!(config.base_url, "https://api.monday.com/v2");
        assert_eq!(config.api_version, "2023-10");
    }

    #[test]
    fn test_config_builders() {
        let config = MondayConfig::new("key")
            .with_base_url("http://localhost:9000")
            .with_api_version("2024-01");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.api_version, "2024-01");
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let connector = MondayConnector::new(MondayConfig::new("key")).unwrap();
        let err = connector
            .execute(SourceRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, msbt_core::Error::InvalidRequest(ref m) if m == "Query is required"));
    }
}
