//! Balance Tool Ingress Adapters
//!
//! This crate provides the HTTP API of the dashboard:
//! - `/api/monday`, `/api/salesforce`, `/api/smartsheet` query endpoints
//! - `/api/oauth` Salesforce login and callback

pub mod auth;
pub mod middleware;
pub mod oauth;
pub mod sources;
pub mod state;
pub mod types;

use axum::{Router, routing::{get, post}};

pub use state::AppState;
pub use types::{IngressError, IngressResult, RequestId};

/// Create the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/monday", post(sources::monday))
        .route("/api/salesforce", post(sources::salesforce))
        .route("/api/smartsheet", post(sources::smartsheet))
        .route("/api/oauth", get(oauth::login).post(oauth::callback))
        .with_state(state)
}
