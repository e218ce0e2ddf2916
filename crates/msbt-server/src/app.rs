//! Router assembly from configuration

use crate::config::ServerConfig;
use axum::{Router, middleware};
use msbt_core::SourceKind;
use msbt_egress::{
    client::HttpClientConfig,
    monday::{MondayConfig, MondayConnector},
    salesforce::{SalesforceConfig, SalesforceConnector},
    salesforce_oauth::{SalesforceOAuth, SalesforceOAuthConfig},
    smartsheet::{SmartsheetConfig, SmartsheetConnector},
};
use msbt_ingress::{
    AppState,
    middleware::{request_context_middleware, security_headers_middleware},
};
use msbt_observability::{ConfiguredSources, HealthState, Metrics, SourceStatus, health_router};
use msbt_session::TokenSigner;
use msbt_ui::UiState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

fn client_config(config: &ServerConfig) -> HttpClientConfig {
    HttpClientConfig {
        timeout_secs: config.http.timeout_secs,
        max_retries: config.http.max_retries,
        ..HttpClientConfig::default()
    }
}

/// Build the complete application router. Sources without credentials are
/// left out and reported as not configured.
pub fn build_app(config: &ServerConfig) -> anyhow::Result<Router> {
    config.validate()?;

    let metrics = Arc::new(Metrics::new()?);
    let jwt_secret = config.salesforce.jwt_secret.as_deref().unwrap_or_default();
    let signer = TokenSigner::new(jwt_secret).with_ttl_secs(config.session.token_ttl_secs);
    let http = client_config(config);

    let mut state = AppState::new(signer)
        .with_metrics(metrics.clone())
        .with_cookie_max_age_secs(config.session.cookie_max_age_secs);

    // Salesforce
    let sf = &config.salesforce;
    let mut salesforce_config = SalesforceConfig {
        client_config: http.clone(),
        ..SalesforceConfig::default()
    }
    .with_api_version(&sf.api_version);
    if let Some(instance_url) = &sf.instance_url {
        salesforce_config = salesforce_config.with_instance_url(instance_url);
    }
    state = state.with_source(Arc::new(SalesforceConnector::new(salesforce_config)?));

    match (&sf.client_id, &sf.client_secret, &sf.redirect_url) {
        (Some(client_id), Some(client_secret), Some(redirect_url)) => {
            let mut oauth_config = SalesforceOAuthConfig::new(client_id, client_secret, redirect_url)
                .with_login_url(&sf.login_url);
            oauth_config.client_config = http.clone();
            state = state.with_oauth(Arc::new(SalesforceOAuth::new(oauth_config)?));
            info!("✓ Salesforce login configured ({})", sf.login_url);
        }
        _ => warn!("Salesforce login not configured: set SF_KEY, SF_SECRET and SF_REDIRECT_URL"),
    }

    // Monday
    if let Some(api_key) = &config.monday.api_key {
        let mut monday_config = MondayConfig::new(api_key).with_api_version(&config.monday.api_version);
        if let Some(base_url) = &config.monday.base_url {
            monday_config = monday_config.with_base_url(base_url);
        }
        monday_config.client_config = http.clone();
        state = state.with_source(Arc::new(MondayConnector::new(monday_config)?));
        info!("✓ Monday configured");
    } else {
        warn!("Monday not configured: set MONDAY_KEY");
    }

    // Smartsheet
    if let Some(access_token) = &config.smartsheet.access_token {
        let mut smartsheet_config = SmartsheetConfig::new(access_token)
            .with_export_path(config.smartsheet.export_path.clone());
        if let Some(base_url) = &config.smartsheet.base_url {
            smartsheet_config = smartsheet_config.with_base_url(base_url);
        }
        smartsheet_config.client_config = http;
        state = state.with_source(Arc::new(SmartsheetConnector::new(smartsheet_config)?));
        info!("✓ Smartsheet configured");
    } else {
        warn!("Smartsheet not configured: set SMARTSHEET_KEY");
    }

    let statuses = SourceKind::ALL
        .into_iter()
        .map(|kind| {
            let configured = match kind {
                SourceKind::Salesforce => sf.oauth_configured(),
                other => state.is_configured(other),
            };
            SourceStatus::new(kind.as_str(), configured)
        })
        .collect();
    let health_state =
        HealthState::with_readiness_checker(metrics, Arc::new(ConfiguredSources::new(statuses)));

    let ui_state = UiState::new(state.signer.clone(), config.ui.clone());

    Ok(msbt_ingress::router(state)
        .merge(msbt_ui::router(ui_state))
        .merge(health_router(health_state))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_context_middleware))
        .layer(TraceLayer::new_for_http()))
}
