//! The `access` session cookie

use crate::signer::TokenSigner;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use msbt_core::SessionToken;
use tracing::debug;

pub const SESSION_COOKIE: &str = "access";

/// Browser lifetime of the session cookie (4 hours)
pub const DEFAULT_COOKIE_MAX_AGE_SECS: i64 = 4 * 60 * 60;

/// Build the session cookie. It stays readable from page scripts, which
/// attach it to API calls as `Authorization: Bearer token <jwt>`.
pub fn session_cookie(token: impl Into<String>, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.into()))
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Verified session from the request cookies, if any
pub fn session_from_jar(jar: &CookieJar, signer: &TokenSigner) -> Option<SessionToken> {
    let cookie = jar.get(SESSION_COOKIE)?;
    match signer.verify(cookie.value()) {
        Ok(session) => Some(session),
        Err(e) => {
            debug!("Ignoring session cookie: {}", e);
            None
        }
    }
}
