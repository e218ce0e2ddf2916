//! Query form page handler

use crate::{UiState, examples::example_query};
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use msbt_core::SourceKind;
use msbt_session::session_from_jar;
use tracing::error;

struct SourceOption {
    value: &'static str,
    label: &'static str,
    example: &'static str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    title: String,
    sources: Vec<SourceOption>,
    query: &'static str,
}

fn source_options(selected: SourceKind) -> Vec<SourceOption> {
    SourceKind::ALL
        .into_iter()
        .map(|kind| SourceOption {
            value: kind.as_str(),
            label: kind.display_name(),
            example: example_query(kind),
            selected: kind == selected,
        })
        .collect()
}

/// `GET /` behind the session gate
pub async fn index(State(state): State<UiState>, jar: CookieJar) -> Response {
    if session_from_jar(&jar, &state.signer).is_none() {
        return Redirect::to("/login").into_response();
    }

    let selected = state.config.default_source;
    let template = IndexTemplate {
        title: state.config.title.clone(),
        sources: source_options(selected),
        query: example_query(selected),
    };

    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render index page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

/// `GET /login` hands over to the OAuth endpoint
pub async fn login() -> Redirect {
    Redirect::to("/api/oauth")
}
