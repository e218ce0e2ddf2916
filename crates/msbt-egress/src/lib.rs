//! Balance Tool Egress Connectors
//!
//! This crate provides REST connectors to the external platforms:
//! - Monday.com GraphQL connector
//! - Salesforce REST connector and OAuth2 client
//! - Smartsheet connector with virtual function dispatch

pub mod client;
pub mod monday;
pub mod salesforce;
pub mod salesforce_oauth;
pub mod smartsheet;

use thiserror::Error;

/// Egress error types
#[derive(Debug, Error)]
pub enum EgressError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Provider error ({status_code}): {message}")]
    ProviderError { status_code: u16, message: String },

    #[error("Rate limit exceeded{}", retry_after_secs.map(|s| format!(": retry after {}s", s)).unwrap_or_default())]
    RateLimitExceeded { retry_after_secs: Option<u64> },

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Session rejected: {0}")]
    Unauthorized(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EgressError>;

impl From<EgressError> for msbt_core::Error {
    fn from(err: EgressError) -> Self {
        match err {
            EgressError::Unauthorized(msg) | EgressError::AuthorizationFailed(msg) => {
                msbt_core::Error::Unauthorized(msg)
            }
            EgressError::ProviderError {
                status_code,
                message,
            } => msbt_core::Error::Upstream {
                status_code,
                message,
            },
            EgressError::RateLimitExceeded { .. } => msbt_core::Error::Upstream {
                status_code: 429,
                message: err.to_string(),
            },
            EgressError::HttpError(e) => msbt_core::Error::Upstream {
                status_code: e.status().map(|s| s.as_u16()).unwrap_or(502),
                message: e.to_string(),
            },
            EgressError::Timeout(_) => msbt_core::Error::Upstream {
                status_code: 504,
                message: err.to_string(),
            },
            EgressError::ConfigError(msg) => msbt_core::Error::Config(msg),
            EgressError::ParseError(msg) => msbt_core::Error::Parse(msg),
            EgressError::Io(e) => msbt_core::Error::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_core_unauthorized() {
        let core: msbt_core::Error = EgressError::Unauthorized("INVALID_SESSION_ID".into()).into();
        assert!(core.is_unauthorized());
    }

    #[test]
    fn test_provider_error_keeps_status() {
        let core: msbt_core::Error = EgressError::ProviderError {
            status_code: 404,
            message: "NOT_FOUND".into(),
        }
        .into();
        match core {
            msbt_core::Error::Upstream { status_code, .. } => assert_eq!(status_code, 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_display() {
        let err = EgressError::RateLimitExceeded {
            retry_after_secs: Some(60),
        };
        assert!(err.to_string().contains("60s"));
    }
}
