//! Health endpoints
//!
//! This module provides HTTP health check endpoints:
//! - `/api/health` - Status message for the dashboard
//! - `/healthz` - Liveness probe (always returns 200 OK if server is running)
//! - `/readyz` - Readiness probe (reports which data sources are configured)
//! - `/metrics` - Prometheus metrics endpoint

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::TextEncoder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::Metrics;

pub const STATUS_MESSAGE: &str = "managed-services-balance-tool is up 🟢";

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `/api/health` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

/// Readiness check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Service status
    pub status: String,
    /// Source statuses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceStatus>>,
    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Data source status in readiness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    /// Source name
    pub name: String,
    /// `configured` or `not_configured`
    pub status: String,
}

impl SourceStatus {
    pub fn new(name: impl Into<String>, configured: bool) -> Self {
        Self {
            name: name.into(),
            status: if configured {
                "configured".to_string()
            } else {
                "not_configured".to_string()
            },
        }
    }

    pub fn is_configured(&self) -> bool {
        self.status == "configured"
    }
}

/// Readiness checker trait
pub trait ReadinessChecker: Send + Sync {
    /// Check if the service is ready
    fn is_ready(&self) -> bool;

    /// Get source statuses
    fn get_source_statuses(&self) -> Vec<SourceStatus>;
}

/// Source statuses fixed at startup. Ready while at least one source is
/// configured.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredSources {
    statuses: Vec<SourceStatus>,
}

impl ConfiguredSources {
    pub fn new(statuses: Vec<SourceStatus>) -> Self {
        Self { statuses }
    }
}

impl ReadinessChecker for ConfiguredSources {
    fn is_ready(&self) -> bool {
        self.statuses.iter().any(SourceStatus::is_configured)
    }

    fn get_source_statuses(&self) -> Vec<SourceStatus> {
        self.statuses.clone()
    }
}

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    /// Metrics collector
    pub metrics: Arc<Metrics>,
    /// Optional readiness checker
    pub readiness_checker: Option<Arc<dyn ReadinessChecker>>,
}

impl HealthState {
    /// Create a new health state
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            readiness_checker: None,
        }
    }

    /// Create a new health state with readiness checker
    pub fn with_readiness_checker(
        metrics: Arc<Metrics>,
        readiness_checker: Arc<dyn ReadinessChecker>,
    ) -> Self {
        Self {
            metrics,
            readiness_checker: Some(readiness_checker),
        }
    }
}

/// Create health check router
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/api/health", get(status_message))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn status_message() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: STATUS_MESSAGE.to_string(),
    })
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: None,
    })
}

/// 503 while no data source has credentials. Without a checker the server
/// counts as ready.
async fn readyz(State(state): State<HealthState>) -> Response {
    let (ready, sources) = match &state.readiness_checker {
        Some(checker) => (checker.is_ready(), Some(checker.get_source_statuses())),
        None => (true, None),
    };

    let (code, body) = if ready {
        (
            StatusCode::OK,
            ReadinessResponse {
                status: "ready".to_string(),
                sources,
                message: None,
            },
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            ReadinessResponse {
                status: "not_ready".to_string(),
                sources,
                message: Some("No data source is configured".to_string()),
            },
        )
    };
    (code, Json(body)).into_response()
}

async fn metrics_handler(State(state): State<HealthState>) -> Response {
    let families = state.metrics.registry().gather();
    match TextEncoder::new().encode_to_string(&families) {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}
