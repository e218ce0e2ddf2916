//! Salesforce REST egress connector
//!
//! Runs SOQL queries and sobject describes against the REST API using the
//! access token carried in the caller's session.

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, create_client, read_json, with_retry},
};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use msbt_core::{DataSource, SessionToken, SourceKind, SourceRequest};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

/// Salesforce connector configuration
#[derive(Debug, Clone)]
pub struct SalesforceConfig {
    /// Fixed instance URL; when unset the session's `instanceUrl` is used
    pub instance_url: Option<String>,

    /// REST API version without the `v` prefix
    pub api_version: String,

    /// Concurrent describe calls issued for `info: all`
    pub describe_concurrency: usize,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            instance_url: None,
            api_version: "59.0".to_string(),
            describe_concurrency: 4,
            client_config: HttpClientConfig::default(),
        }
    }
}

impl SalesforceConfig {
    pub fn with_instance_url(mut self, instance_url: impl Into<String>) -> Self {
        self.instance_url = Some(instance_url.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct DescribeResult {
    #[serde(default)]
    fields: Vec<FieldDescribe>,
}

#[derive(Debug, Deserialize)]
struct FieldDescribe {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GlobalDescribe {
    #[serde(default)]
    sobjects: Vec<SObjectSummary>,
}

#[derive(Debug, Deserialize)]
struct SObjectSummary {
    name: String,
}

/// Salesforce connector
pub struct SalesforceConnector {
    config: SalesforceConfig,
    client: Client,
}

impl SalesforceConnector {
    /// Create a new Salesforce connector
    pub fn new(config: SalesforceConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self { config, client })
    }

    fn api_base(&self, credentials: &SessionToken) -> Result<Url> {
        let instance = self
            .config
            .instance_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&credentials.instance_url);

        if instance.is_empty() {
            return Err(EgressError::ConfigError(
                "No Salesforce instance URL configured or present in session".to_string(),
            ));
        }

        Url::parse(&format!(
            "{}/services/data/v{}/",
            instance.trim_end_matches('/'),
            self.config.api_version
        ))
        .map_err(|e| EgressError::ConfigError(format!("Invalid Salesforce instance URL: {}", e)))
    }

    fn endpoint(&self, credentials: &SessionToken, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base(credentials)?;
        url.path_segments_mut()
            .map_err(|_| EgressError::ConfigError("Instance URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, credentials: &SessionToken, url: Url) -> Result<Value> {
        with_retry(self.config.client_config.max_retries, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url)
                    .bearer_auth(&credentials.access_token)
                    .header("Accept", "application/json")
                    .send()
                    .await?;

                read_json(response, "Salesforce").await
            }
        })
        .await
    }

    /// Run a SOQL query and return the first result page
    #[instrument(skip(self, credentials))]
    pub async fn query(&self, credentials: &SessionToken, soql: &str) -> Result<Value> {
        let mut url = self.endpoint(credentials, &["query"])?;
        url.query_pairs_mut().append_pair("q", soql);
        self.get_json(credentials, url).await
    }

    /// List every sobject visible to the session
    #[instrument(skip(self, credentials))]
    pub async fn describe_global(&self, credentials: &SessionToken) -> Result<Value> {
        let url = self.endpoint(credentials, &["sobjects"])?;
        self.get_json(credentials, url).await
    }

    /// Field names of one sobject
    #[instrument(skip(self, credentials))]
    pub async fn describe_fields(
        &self,
        credentials: &SessionToken,
        sobject: &str,
    ) -> Result<Vec<String>> {
        let url = self.endpoint(credentials, &["sobjects", sobject, "describe"])?;
        let describe: DescribeResult = serde_json::from_value(self.get_json(credentials, url).await?)
            .map_err(|e| EgressError::ParseError(format!("Invalid describe for {}: {}", sobject, e)))?;

        Ok(describe.fields.into_iter().map(|f| f.name).collect())
    }

    /// Map of every sobject name to its field names
    #[instrument(skip(self, credentials))]
    pub async fn describe_all(&self, credentials: &SessionToken) -> Result<Map<String, Value>> {
        let global: GlobalDescribe = serde_json::from_value(self.describe_global(credentials).await?)
            .map_err(|e| EgressError::ParseError(format!("Invalid global describe: {}", e)))?;

        let concurrency = self.config.describe_concurrency.max(1);
        let described: Vec<(String, Vec<String>)> = stream::iter(global.sobjects)
            .map(|sobject| async move {
                let fields = self.describe_fields(credentials, &sobject.name).await?;
                debug!("Object: {}", sobject.name);
                Ok::<_, EgressError>((sobject.name, fields))
            })
            .buffered(concurrency)
            .try_collect()
            .await?;

        Ok(described
            .into_iter()
            .map(|(name, fields)| (name, Value::from(fields)))
            .collect())
    }
}

#[async_trait]
impl DataSource for SalesforceConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Salesforce
    }

    async fn execute(&self, request: SourceRequest) -> msbt_core::Result<Value> {
        let credentials = request.credentials.as_ref().ok_or_else(|| {
            msbt_core::Error::Unauthorized("Access token is missing or invalid".to_string())
        })?;

        let mut response = None;

        if let Some(soql) = request.envelope.query_text() {
            response = Some(self.query(credentials, soql).await?);
            info!("🟣[salesforce]: {}", soql);
        }

        // An info selector replaces the query result
        if let Some(info) = request.envelope.info_text() {
            let described = if info == "all" {
                Value::Object(self.describe_all(credentials).await?)
            } else {
                Value::from(self.describe_fields(credentials, info).await?)
            };
            info!("🟣[salesforce]: {}", info);
            response = Some(described);
        }

        response.ok_or_else(|| {
            msbt_core::Error::InvalidRequest("Either query or info is required".to_string())
        })
    }
}
