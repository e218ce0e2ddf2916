//! Query endpoints for the three data sources
//!
//! - `POST /api/monday`
//! - `POST /api/salesforce`
//! - `POST /api/smartsheet`

use crate::{
    auth,
    state::AppState,
    types::{IngressError, IngressResult},
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use msbt_core::{QueryEnvelope, SessionToken, SourceKind, SourceRequest};
use msbt_session::session_cookie;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Parse a query body; an empty body is an empty envelope
pub fn parse_envelope(body: &Bytes) -> IngressResult<QueryEnvelope> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(QueryEnvelope::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| IngressError::InvalidRequest(format!("Invalid JSON body: {}", e)))
}

fn error_type(err: &msbt_core::Error) -> &'static str {
    match err {
        msbt_core::Error::Unauthorized(_) => "unauthorized",
        msbt_core::Error::InvalidRequest(_) => "invalid_request",
        msbt_core::Error::Upstream { .. } => "upstream",
        msbt_core::Error::Parse(_) | msbt_core::Error::Serialization(_) => "parse",
        _ => "internal",
    }
}

/// Execute against a registered source and record metrics
async fn execute(
    state: &AppState,
    kind: SourceKind,
    request: SourceRequest,
) -> IngressResult<msbt_core::Result<Value>> {
    let source = state.source(kind)?;
    let start = Instant::now();
    let result = source.execute(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    if let Some(metrics) = &state.metrics {
        match &result {
            Ok(_) => metrics.record_source_success(kind.as_str(), elapsed),
            Err(err) => metrics.record_source_failure(kind.as_str(), error_type(err), elapsed),
        }
    }

    Ok(result)
}

pub async fn monday(State(state): State<AppState>, body: Bytes) -> IngressResult<Response> {
    let envelope = parse_envelope(&body)?;
    if envelope.query_text().is_none() {
        return Err(IngressError::InvalidRequest("Query is required".to_string()));
    }

    match execute(&state, SourceKind::Monday, SourceRequest::new(envelope)).await? {
        Ok(value) => Ok(Json(value).into_response()),
        Err(msbt_core::Error::InvalidRequest(msg)) => Err(IngressError::InvalidRequest(msg)),
        Err(err) => {
            error!("Error calling Monday API: {}", err);
            Err(IngressError::UpstreamFailed(err.to_string()))
        }
    }
}

pub async fn smartsheet(State(state): State<AppState>, body: Bytes) -> IngressResult<Response> {
    let envelope = parse_envelope(&body)?;

    match execute(&state, SourceKind::Smartsheet, SourceRequest::new(envelope)).await? {
        Ok(value) => Ok(Json(value).into_response()),
        Err(msbt_core::Error::InvalidRequest(msg)) => Err(IngressError::InvalidRequest(msg)),
        Err(err) => {
            error!("Error calling Smartsheet API: {}", err);
            Err(IngressError::SourceFailed(err.to_string()))
        }
    }
}

fn salesforce_error(err: msbt_core::Error) -> IngressError {
    match err {
        msbt_core::Error::Unauthorized(_) => IngressError::InvalidSession,
        msbt_core::Error::InvalidRequest(msg) => IngressError::InvalidRequest(msg),
        other => {
            info!("🟣[salesforce]: custom query error {}", other);
            IngressError::QueryFailed(other.to_string())
        }
    }
}

/// Trade the session's refresh token for a new access token and cache it.
/// `None` when no refresh is possible.
async fn refresh_session(state: &AppState, session: &SessionToken) -> Option<SessionToken> {
    if !session.has_refresh_token() {
        debug!("Session has no refresh token");
        return None;
    }
    let oauth = state.oauth.as_ref()?;

    match oauth.refresh(&session.refresh_token).await {
        Ok(renewed) => {
            state.cache.store(&renewed);
            Some(renewed)
        }
        Err(e) => {
            warn!("Failed to refresh Salesforce session: {}", e);
            None
        }
    }
}

pub async fn salesforce(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> IngressResult<Response> {
    let token = auth::session_token(&headers)?;
    let session = state.signer.verify(token).map_err(|e| {
        debug!("Rejected session token: {}", e);
        IngressError::InvalidSession
    })?;
    if session.access_token.is_empty() {
        return Err(IngressError::InvalidSession);
    }

    let envelope = parse_envelope(&body)?;
    let request = SourceRequest::new(envelope.clone()).with_credentials(session.clone());

    match execute(&state, SourceKind::Salesforce, request).await? {
        Ok(value) => Ok(Json(value).into_response()),
        Err(err) if err.is_unauthorized() => {
            let Some(renewed) = refresh_session(&state, &session).await else {
                return Err(IngressError::InvalidSession);
            };
            info!("Salesforce session refreshed, retrying query");

            // The browser gets the renewed session whatever the retry returns
            let jwt = state.signer.sign(&renewed)?;
            let jar = jar.add(session_cookie(jwt, state.cookie_max_age_secs));

            let retry = SourceRequest::new(envelope).with_credentials(renewed);
            Ok(match execute(&state, SourceKind::Salesforce, retry).await? {
                Ok(value) => (jar, Json(value)).into_response(),
                Err(err) => (jar, salesforce_error(err)).into_response(),
            })
        }
        Err(err) => Err(salesforce_error(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope() {
        let envelope = parse_envelope(&Bytes::from_static(br#"{"query":"SELECT Id FROM Account"}"#)).unwrap();
        assert_eq!(envelope.query_text(), Some("SELECT Id FROM Account"));

        let envelope = parse_envelope(&Bytes::from_static(br#"{"info":"all"}"#)).unwrap();
        assert_eq!(envelope.info_text(), Some("all"));
    }

    #[test]
    fn test_parse_empty_body() {
        let envelope = parse_envelope(&Bytes::new()).unwrap();
        assert!(envelope.query_text().is_none());
        assert!(parse_envelope(&Bytes::from_static(b"  \n")).is_ok());
    }

    #[test]
    fn test_parse_invalid_body() {
        assert!(matches!(
            parse_envelope(&Bytes::from_static(b"{not json")),
            Err(IngressError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_salesforce_error_mapping() {
        assert!(matches!(
            salesforce_error(msbt_core::Error::Unauthorized("expired".into())),
            IngressError::InvalidSession
        ));
        assert!(matches!(
            salesforce_error(msbt_core::Error::Upstream {
                status_code: 400,
                message: "MALFORMED_QUERY".into()
            }),
            IngressError::QueryFailed(_)
        ));
    }
}
