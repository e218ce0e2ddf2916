//! Balance Tool Web UI
//!
//! The query form served at `/`. The HTML template is compiled into the
//! binary; the page talks to the `/api/<source>` endpoints with the session
//! cookie.

pub mod examples;
pub mod handlers;

use axum::{Router, routing::get};
use msbt_core::SourceKind;
use msbt_session::TokenSigner;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Page title
    #[serde(default = "default_title")]
    pub title: String,

    /// Source selected when the page loads (default: salesforce)
    #[serde(default = "default_source")]
    pub default_source: SourceKind,
}

fn default_title() -> String {
    "Managed Services - Balance Sheet Tracking".to_string()
}

fn default_source() -> SourceKind {
    SourceKind::Salesforce
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            default_source: default_source(),
        }
    }
}

/// Shared state for the UI handlers
#[derive(Clone)]
pub struct UiState {
    pub signer: Arc<TokenSigner>,
    pub config: UiConfig,
}

impl UiState {
    pub fn new(signer: Arc<TokenSigner>, config: UiConfig) -> Self {
        Self { signer, config }
    }
}

/// Build the UI router
pub fn router(state: UiState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard::index))
        .route("/login", get(handlers::dashboard::login))
        .with_state(state)
}
