//! Shared ingress types and utilities

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use msbt_core::SourceKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request ID for tracing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new request ID
    pub fn generate() -> Self {
        Self(format!("req_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Get the string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ingress error types
///
/// The rendered bodies are part of the dashboard contract: some are plain
/// text, the rest are `{"error": "..."}` JSON.
#[derive(Debug, Error)]
pub enum IngressError {
    /// No Authorization header on a Salesforce query
    #[error("Authorization header is missing")]
    MissingAuthorization,

    /// Session token absent, malformed, forged or expired
    #[error("Access token is missing or invalid")]
    InvalidSession,

    /// Invalid request format
    #[error("{0}")]
    InvalidRequest(String),

    /// Salesforce query or describe failed
    #[error("Custom query error")]
    QueryFailed(String),

    /// Upstream failure reported without detail
    #[error("Internal Server Error")]
    UpstreamFailed(String),

    /// Upstream failure reported with its message
    #[error("{0}")]
    SourceFailed(String),

    /// OAuth code exchange failed
    #[error("Authorization failed")]
    AuthorizationFailed(String),

    /// No credentials configured for the source
    #[error("{} is not configured", .0.display_name())]
    NotConfigured(SourceKind),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngressError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngressError::MissingAuthorization | IngressError::InvalidSession => {
                StatusCode::UNAUTHORIZED
            }
            IngressError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            IngressError::QueryFailed(_)
            | IngressError::UpstreamFailed(_)
            | IngressError::SourceFailed(_)
            | IngressError::AuthorizationFailed(_)
            | IngressError::NotConfigured(_)
            | IngressError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_plain_text(&self) -> bool {
        matches!(
            self,
            IngressError::MissingAuthorization
                | IngressError::InvalidSession
                | IngressError::QueryFailed(_)
                | IngressError::AuthorizationFailed(_)
        )
    }
}

impl From<msbt_session::SessionError> for IngressError {
    fn from(err: msbt_session::SessionError) -> Self {
        IngressError::Internal(err.to_string())
    }
}

impl From<msbt_egress::EgressError> for IngressError {
    fn from(err: msbt_egress::EgressError) -> Self {
        IngressError::Internal(err.to_string())
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_plain_text() {
            return (status, self.to_string()).into_response();
        }

        let message = match &self {
            IngressError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Ingress result type
pub type IngressResult<T> = Result<T, IngressError>;
