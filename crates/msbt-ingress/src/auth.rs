//! Session token extraction from the Authorization header
//!
//! The dashboard sends `Authorization: Bearer token <jwt>`; everything after
//! the first `token ` is the signed session.

use crate::types::{IngressError, IngressResult};
use axum::http::{HeaderMap, header::AUTHORIZATION};

const TOKEN_MARKER: &str = "token ";

pub fn session_token(headers: &HeaderMap) -> IngressResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(IngressError::MissingAuthorization)?
        .to_str()
        .map_err(|_| IngressError::InvalidSession)?;

    value
        .split_once(TOKEN_MARKER)
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or(IngressError::InvalidSession)
}
