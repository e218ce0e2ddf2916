//! Salesforce login endpoints
//!
//! `GET /api/oauth` starts the login, `POST /api/oauth?code=...` completes it.
//! A `GET` carrying `code` (the browser following the connected app's
//! redirect) is handled as the callback too.

use crate::{
    state::AppState,
    types::{IngressError, IngressResult},
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use msbt_session::{session_cookie, session_from_jar};
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl CallbackParams {
    fn is_callback(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}

fn record(state: &AppState, outcome: &str) {
    if let Some(metrics) = &state.metrics {
        metrics.record_oauth_login(outcome);
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> IngressResult<Response> {
    if params.is_callback() {
        return complete_login(state, jar, params).await;
    }

    if session_from_jar(&jar, &state.signer).is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let url = state.oauth()?.authorization_url()?;
    Ok(Redirect::to(&url).into_response())
}

pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> IngressResult<Response> {
    complete_login(state, jar, params).await
}

async fn complete_login(
    state: AppState,
    jar: CookieJar,
    params: CallbackParams,
) -> IngressResult<Response> {
    if session_from_jar(&jar, &state.signer).is_some() {
        record(&state, "existing_session");
        return Ok(Redirect::to("/").into_response());
    }

    if let Some(err) = params.error {
        let detail = match params.error_description {
            Some(description) => format!("{}: {}", err, description),
            None => err,
        };
        error!("Salesforce login was refused: {}", detail);
        record(&state, "failure");
        return Err(IngressError::AuthorizationFailed(detail));
    }

    let oauth = state.oauth()?;
    let code = params.code.unwrap_or_default();

    let session = match oauth.exchange_code(&code).await {
        Ok(session) => session,
        Err(e) => {
            error!("Authorization failed: {}", e);
            record(&state, "failure");
            return Err(IngressError::AuthorizationFailed(e.to_string()));
        }
    };

    state.cache.store(&session);
    let jwt = state.signer.sign(&session)?;
    record(&state, "success");
    info!("Salesforce login for {}", session.instance_url);

    let jar = jar.add(session_cookie(jwt, state.cookie_max_age_secs));
    Ok((jar, Redirect::to("/")).into_response())
}
