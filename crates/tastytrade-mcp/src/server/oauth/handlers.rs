//! OAuth endpoint handlers.
//!
//! Maps the authorization server's typed results onto the HTTP wire:
//! - RFC 9728: `GET /.well-known/oauth-protected-resource`
//! - RFC 8414: `GET /.well-known/oauth-authorization-server`
//! - RFC 7591: `POST /oauth/register`
//! - RFC 6749: `GET /oauth/authorize`, `POST /oauth/authorize/submit`,
//!   `POST /oauth/token`

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use super::consent;
use super::registry::RegistrationRequest;
use super::server::{AuthorizationServer, AuthorizeError, AuthorizeParams, ConsentForm, SubmitOutcome, TokenParams};
use crate::server::transport::HttpState;

/// `GET /.well-known/oauth-protected-resource`
///
/// Tells clients which authorization server protects this resource.
pub async fn handle_protected_resource(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(AuthorizationServer::protected_resource_metadata(&state.base_url, &state.base_url))
}

/// `GET /.well-known/oauth-authorization-server`
///
/// Describes the OAuth endpoints and capabilities.
pub async fn handle_server_metadata(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(AuthorizationServer::metadata(&state.base_url))
}

/// `POST /oauth/register`
///
/// Register a new OAuth client dynamically.
pub async fn handle_register(
    State(state): State<Arc<HttpState>>,
    Json(request): Json<RegistrationRequest>,
) -> Response {
    match state.oauth.register_client(request).await {
        Ok(client) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "client_id": client.client_id,
                "client_name": client.client_name,
                "redirect_uris": client.redirect_uris,
                "grant_types": client.grant_types,
                "response_types": client.response_types,
                "token_endpoint_auth_method": client.token_endpoint_auth_method,
                "client_id_issued_at": client.issued_at_secs(),
            })),
        )
            .into_response(),
        Err(err) => {
            tracing::debug!(error = %err, "Client registration rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "invalid_client_metadata",
                    "error_description": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// `GET /oauth/authorize`
///
/// Validate the authorization request and render the consent page.
pub async fn handle_authorize(
    State(state): State<Arc<HttpState>>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    match state.oauth.begin_authorization(&params).await {
        Ok(prompt) => Html(consent::render_consent_page(&prompt)).into_response(),
        Err(err) => authorize_error(&err),
    }
}

/// `POST /oauth/authorize/submit`
///
/// Handle the consent form: redirect back to the client with a code on
/// approval, re-render the form on a bad credential.
pub async fn handle_authorize_submit(
    State(state): State<Arc<HttpState>>,
    Form(form): Form<ConsentForm>,
) -> Response {
    match state.oauth.submit_consent(&form).await {
        Ok(SubmitOutcome::Approved { redirect }) => {
            (StatusCode::FOUND, [(header::LOCATION, redirect)]).into_response()
        }
        Ok(SubmitOutcome::Denied { prompt }) => {
            Html(consent::render_consent_page(&prompt)).into_response()
        }
        Err(err) => authorize_error(&err),
    }
}

/// `POST /oauth/token`
///
/// Exchange an authorization code for an access token.
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    Form(params): Form<TokenParams>,
) -> Response {
    match state.oauth.exchange_token(&params).await {
        Ok(grant) => {
            let mut response = Json(grant).into_response();
            // RFC 6749 §5.1 requires token responses to be uncacheable.
            let headers = response.headers_mut();
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
            response
        }
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": err.error_code() })),
        )
            .into_response(),
    }
}

fn authorize_error(err: &AuthorizeError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": err.error_code(),
            "error_description": err.to_string(),
        })),
    )
        .into_response()
}
