//! Salesforce OAuth2 web-server flow
//!
//! Builds the authorization URL and exchanges authorization codes and refresh
//! tokens at the `/services/oauth2/token` endpoint.

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, create_client},
};
use msbt_core::SessionToken;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Connected-app settings for the OAuth2 flow
#[derive(Debug, Clone)]
pub struct SalesforceOAuthConfig {
    /// Consumer key of the connected app
    pub client_id: String,

    /// Consumer secret of the connected app
    pub client_secret: String,

    /// Callback URL registered on the connected app
    pub redirect_uri: String,

    /// Login host (default: https://login.salesforce.com)
    pub login_url: String,

    /// Requested scopes, space separated
    pub scope: String,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl SalesforceOAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            login_url: "https://login.salesforce.com".to_string(),
            scope: "api refresh_token offline_access".to_string(),
            client_config: HttpClientConfig::default(),
        }
    }

    /// Set the login host (sandbox orgs use https://test.salesforce.com)
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth2 client for one connected app
pub struct SalesforceOAuth {
    config: SalesforceOAuthConfig,
    client: Client,
}

impl SalesforceOAuth {
    pub fn new(config: SalesforceOAuthConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self { config, client })
    }

    fn oauth_url(&self, endpoint: &str) -> String {
        format!(
            "{}/services/oauth2/{}",
            self.config.login_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// URL the browser is sent to for consent
    pub fn authorization_url(&self) -> Result<String> {
        let url = Url::parse_with_params(
            &self.oauth_url("authorize"),
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
            ],
        )
        .map_err(|e| EgressError::ConfigError(format!("Invalid Salesforce login URL: {}", e)))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for session credentials
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<SessionToken> {
        debug!("Exchanging Salesforce authorization code");
        let token = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .await?;

        Ok(SessionToken::new(
            token.instance_url,
            token.access_token,
            token.refresh_token.unwrap_or_default(),
        ))
    }

    /// Obtain a fresh access token. Salesforce keeps the refresh token
    /// unchanged, so the one passed in is carried over.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<SessionToken> {
        debug!("Refreshing Salesforce access token");
        let token = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .await?;

        Ok(SessionToken::new(
            token.instance_url,
            token.access_token,
            token
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
        ))
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let body = serde_urlencoded::to_string(params)
            .map_err(|e| EgressError::ConfigError(format!("Failed to encode token request: {}", e)))?;

        let response = self
            .client
            .post(self.oauth_url("token"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("status {}: {}", status.as_u16(), body),
            };
            warn!("Salesforce token endpoint rejected request: {}", message);
            return Err(EgressError::AuthorizationFailed(message));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| EgressError::ParseError(format!("Invalid token response: {}", e)))
    }
}
