//! Shared HTTP client utilities

use crate::{EgressError, Result};
use reqwest::{Client, ClientBuilder, Response, StatusCode, header::RETRY_AFTER};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    /// Note: `info: all` on Salesforce issues one describe call per sobject,
    /// each bounded by this timeout.
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum number of idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Maximum number of retries for transient errors
    pub max_retries: u32,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 8,
            max_retries: 2,
            user_agent: format!("msbt/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a configured HTTP client with connection pooling
pub fn create_client(config: &HttpClientConfig) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        // Vendor APIs drop idle keep-alive connections after about a minute
        .pool_idle_timeout(Duration::from_secs(50))
        .user_agent(&config.user_agent)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| EgressError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Run `operation` up to `max_retries + 1` times, backing off 100ms, 200ms,
/// 400ms... between attempts. Only transient failures are retried.
pub async fn with_retry<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                attempt += 1;
                let backoff = backoff_delay(attempt);
                warn!("Vendor request failed, retry {}/{} in {:?}: {}", attempt, max_retries, backoff, e);
                tokio::time::sleep(backoff).await;
            }
            result => {
                if attempt > 0 {
                    debug!("Vendor request finished after {} retries", attempt);
                }
                return result;
            }
        }
    }
}

/// Delay before retry `attempt` (1-based), doubling up to 3.2s
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    Duration::from_millis(100 << exponent)
}

fn is_retryable(error: &EgressError) -> bool {
    match error {
        EgressError::HttpError(req_err) => req_err.is_connect() || req_err.is_timeout(),
        EgressError::ProviderError { status_code, .. } => {
            matches!(status_code, 500 | 502 | 503 | 504)
        }
        EgressError::RateLimitExceeded { .. } | EgressError::Timeout(_) => true,
        _ => false,
    }
}

/// Turn a non-success status into the matching `EgressError`
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());

    Err(match status {
        StatusCode::UNAUTHORIZED => EgressError::Unauthorized(body),
        StatusCode::TOO_MANY_REQUESTS => EgressError::RateLimitExceeded { retry_after_secs },
        _ => EgressError::ProviderError {
            status_code: status.as_u16(),
            message: body,
        },
    })
}

/// Check the status and decode the body as JSON
pub async fn read_json(response: Response, provider: &str) -> Result<serde_json::Value> {
    check_status(response)
        .await?
        .json::<serde_json::Value>()
        .await
        .map_err(|e| EgressError::ParseError(format!("Failed to parse {} response: {}", provider, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.max_retries, 2);
        assert!(config.user_agent.starts_with("msbt/"));
    }

    #[test]
    fn test_create_client() {
        let client = create_client(&HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let result = with_retry(3, || async { Ok::<i32, EgressError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_non_retryable_error() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(3, || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err::<i32, EgressError>(EgressError::Unauthorized("expired".to_string()))
        })
        .await;

        assert!(matches!(result, Err(EgressError::Unauthorized(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_server_error() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(2, || async {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(EgressError::ProviderError {
                    status_code: 503,
                    message: "unavailable".to_string(),
                })
            } else {
                Ok("ok")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(100));
        assert_eq!(backoff_delay(3), Duration::from_millis(400));
        assert_eq!(backoff_delay(6), Duration::from_millis(3200));
        assert_eq!(backoff_delay(65), Duration::from_millis(3200));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(3200));
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        assert!(!is_retryable(&EgressError::ProviderError {
            status_code: 400,
            message: "MALFORMED_QUERY".to_string(),
        }));
        assert!(is_retryable(&EgressError::Timeout(30)));
    }
}
