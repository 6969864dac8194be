//! Integration tests for the OAuth 2.1 authorization flow.
//!
//! Exercises the full lifecycle over the HTTP surface: discovery →
//! registration → authorization → consent → token exchange → bearer
//! authentication of the MCP endpoint.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

use tastytrade_mcp::client::TastytradeClient;
use tastytrade_mcp::config::Config;
use tastytrade_mcp::server::oauth::pkce;
use tastytrade_mcp::server::transport::create_router;
use tastytrade_mcp::tools::{self, ToolContext};

const AUTH_TOKEN: &str = "test-secret-token-12345";
const BASE_URL: &str = "https://mcp.example.com";
const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

fn build_test_router() -> axum::Router {
    let config = Config::for_testing("http://unused.localhost");
    let client = TastytradeClient::new(config).unwrap();
    let ctx = ToolContext::new(Arc::new(client));
    let tools = tools::register_all_tools();

    create_router(tools, ctx, Some(BASE_URL.to_string()), Some(AUTH_TOKEN.to_string()))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Register a client and return its ID.
async fn register_client(app: &axum::Router, redirect_uri: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::post("/oauth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({
                        "client_name": "Test Client",
                        "redirect_uris": [redirect_uri]
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["client_id"].as_str().unwrap().to_string()
}

/// Submit consent with the given credential; returns the response.
async fn submit_consent(
    app: &axum::Router,
    client_id: &str,
    redirect_uri: &str,
    token: &str,
) -> axum::response::Response {
    let challenge = pkce::challenge_s256(VERIFIER);
    let form = serde_urlencoded::to_string([
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("state", "xyz"),
        ("code_challenge", challenge.as_str()),
        ("code_challenge_method", "S256"),
        ("scope", "mcp:tools"),
        ("token", token),
    ])
    .unwrap();

    app.clone()
        .oneshot(
            Request::post("/oauth/authorize/submit")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Run the happy-path flow up to an authorization code.
async fn obtain_code(app: &axum::Router, client_id: &str, redirect_uri: &str) -> String {
    let response = submit_consent(app, client_id, redirect_uri, AUTH_TOKEN).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    let url = url::Url::parse(location).unwrap();
    url.query_pairs().find(|(k, _)| k == "code").map(|(_, v)| v.into_owned()).unwrap()
}

/// Exchange a code at the token endpoint; returns the response.
async fn exchange(
    app: &axum::Router,
    code: &str,
    client_id: &str,
    verifier: &str,
    redirect_uri: &str,
) -> axum::response::Response {
    let form = serde_urlencoded::to_string([
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", client_id),
        ("code_verifier", verifier),
        ("redirect_uri", redirect_uri),
    ])
    .unwrap();

    app.clone()
        .oneshot(
            Request::post("/oauth/token")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap()
}

// ─── Discovery ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_protected_resource_metadata() {
    let app = build_test_router();

    let response = app
        .oneshot(Request::get("/.well-known/oauth-protected-resource").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["resource"], BASE_URL);
    assert!(json["authorization_servers"].as_array().unwrap().contains(&json!(BASE_URL)));
    assert!(json["scopes_supported"].as_array().unwrap().contains(&json!("mcp:tools")));
}

#[tokio::test]
async fn test_auth_server_metadata() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::get("/.well-known/oauth-authorization-server").body(Body::empty()).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["issuer"], BASE_URL);
    assert_eq!(json["authorization_endpoint"], format!("{BASE_URL}/oauth/authorize"));
    assert_eq!(json["token_endpoint"], format!("{BASE_URL}/oauth/token"));
    assert_eq!(json["registration_endpoint"], format!("{BASE_URL}/oauth/register"));
    assert!(json["code_challenge_methods_supported"].as_array().unwrap().contains(&json!("S256")));
    assert_eq!(json["grant_types_supported"], json!(["authorization_code"]));
}

// ─── Dynamic Client Registration ─────────────────────────────────────────────

#[tokio::test]
async fn test_register_client_round_trips_redirect_uris() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::post("/oauth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({
                        "client_name": "Test Client",
                        "redirect_uris": ["http://localhost:3000/callback"]
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;

    assert!(json["client_id"].as_str().is_some());
    assert_eq!(json["client_name"], "Test Client");
    assert_eq!(json["redirect_uris"], json!(["http://localhost:3000/callback"]));
    assert_eq!(json["token_endpoint_auth_method"], "none");
    assert_eq!(json["grant_types"], json!(["authorization_code"]));
}

#[tokio::test]
async fn test_register_requires_redirect_uris() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::post("/oauth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(json!({"client_name": "Bad Client"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_client_metadata");
}

#[tokio::test]
async fn test_register_rejects_malformed_redirect_uri() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::post("/oauth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(json!({"redirect_uris": ["not a uri"]}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_client_metadata");
    assert!(json["error_description"].as_str().unwrap().contains("not a uri"));
}

// ─── Authorization endpoint ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authorize_rejects_wrong_response_type() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb").await;

    let response = app
        .oneshot(
            Request::get(format!(
                "/oauth/authorize?response_type=token&client_id={client_id}\
                 &redirect_uri=https%3A%2F%2Fapp.example%2Fcb&code_challenge=x"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "unsupported_response_type");
}

#[tokio::test]
async fn test_authorize_rejects_missing_parameters() {
    let app = build_test_router();

    let response = app
        .oneshot(Request::get("/oauth/authorize?response_type=code").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn test_authorize_rejects_plain_challenge_method() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb").await;

    let response = app
        .oneshot(
            Request::get(format!(
                "/oauth/authorize?response_type=code&client_id={client_id}\
                 &redirect_uri=https%3A%2F%2Fapp.example%2Fcb\
                 &code_challenge=x&code_challenge_method=plain"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn test_authorize_rejects_unknown_client() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::get(
                "/oauth/authorize?response_type=code&client_id=ghost\
                 &redirect_uri=https%3A%2F%2Fapp.example%2Fcb&code_challenge=x",
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_client");
}

#[tokio::test]
async fn test_authorize_rejects_unregistered_redirect() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb").await;

    let response = app
        .oneshot(
            Request::get(format!(
                "/oauth/authorize?response_type=code&client_id={client_id}\
                 &redirect_uri=https%3A%2F%2Fevil.example%2Fcb&code_challenge=x"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn test_authorize_renders_consent_page() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb").await;
    let challenge = pkce::challenge_s256(VERIFIER);

    let response = app
        .oneshot(
            Request::get(format!(
                "/oauth/authorize?response_type=code&client_id={client_id}\
                 &redirect_uri=https%3A%2F%2Fapp.example%2Fcb\
                 &code_challenge={challenge}&code_challenge_method=S256&state=xyz"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Test Client"));
    assert!(html.contains(&format!(r#"name="client_id" value="{client_id}""#)));
    assert!(html.contains(r#"name="state" value="xyz""#));
    assert!(html.contains(&format!(r#"name="code_challenge" value="{challenge}""#)));
}

// ─── Consent submission ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_with_wrong_credential_rerenders() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb").await;

    let response = submit_consent(&app, &client_id, "https://app.example/cb", "wrong").await;

    // Re-rendered consent page, not an error and not a redirect.
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LOCATION).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Authorize MCP Access"));
}

#[tokio::test]
async fn test_submit_with_tampered_client_is_rejected() {
    let app = build_test_router();
    register_client(&app, "https://app.example/cb").await;

    let response = submit_consent(&app, "forged", "https://app.example/cb", AUTH_TOKEN).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_client");
}

#[tokio::test]
async fn test_submit_redirects_with_code_and_state() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb?app=1").await;

    let response = submit_consent(&app, &client_id, "https://app.example/cb?app=1", AUTH_TOKEN).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    let url = url::Url::parse(location).unwrap();
    let pairs: Vec<(String, String)> =
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();

    // Pre-existing query parameters survive.
    assert!(pairs.iter().any(|(k, v)| k == "app" && v == "1"));
    assert!(pairs.iter().any(|(k, _)| k == "code"));
    assert!(pairs.iter().any(|(k, v)| k == "state" && v == "xyz"));
}

// ─── Token exchange ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_token_exchange_happy_path() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb").await;
    let code = obtain_code(&app, &client_id, "https://app.example/cb").await;

    let response = exchange(&app, &code, &client_id, VERIFIER, "https://app.example/cb").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap().to_str().unwrap(),
        "no-store"
    );

    let json = body_json(response).await;
    assert!(json["access_token"].as_str().is_some());
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], 86400);
    assert_eq!(json["scope"], "mcp:tools");
}

#[tokio::test]
async fn test_token_exchange_is_single_use() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb").await;
    let code = obtain_code(&app, &client_id, "https://app.example/cb").await;

    let first = exchange(&app, &code, &client_id, VERIFIER, "https://app.example/cb").await;
    assert_eq!(first.status(), StatusCode::OK);

    // Immediate replay with identical parameters fails.
    let second = exchange(&app, &code, &client_id, VERIFIER, "https://app.example/cb").await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(second).await["error"], "invalid_grant");
}

#[tokio::test]
async fn test_token_exchange_collapses_all_failures_to_invalid_grant() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb").await;
    let code = obtain_code(&app, &client_id, "https://app.example/cb").await;

    // Wrong verifier.
    let response = exchange(&app, &code, &client_id, "wrong", "https://app.example/cb").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_grant");
    assert!(json.get("error_description").is_none());

    // Wrong redirect.
    let response = exchange(&app, &code, &client_id, VERIFIER, "https://evil.example/cb").await;
    assert_eq!(body_json(response).await["error"], "invalid_grant");

    // Wrong client.
    let response = exchange(&app, &code, "other", VERIFIER, "https://app.example/cb").await;
    assert_eq!(body_json(response).await["error"], "invalid_grant");

    // Unknown code.
    let response = exchange(&app, "ghost", &client_id, VERIFIER, "https://app.example/cb").await;
    assert_eq!(body_json(response).await["error"], "invalid_grant");
}

#[tokio::test]
async fn test_token_exchange_rejects_unsupported_grant_type() {
    let app = build_test_router();

    let form = serde_urlencoded::to_string([("grant_type", "client_credentials")]).unwrap();
    let response = app
        .oneshot(
            Request::post("/oauth/token")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn test_token_exchange_rejects_missing_parameters() {
    let app = build_test_router();

    let form = serde_urlencoded::to_string([
        ("grant_type", "authorization_code"),
        ("code", "something"),
    ])
    .unwrap();
    let response = app
        .oneshot(
            Request::post("/oauth/token")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

// ─── Bearer authentication of the MCP endpoint ───────────────────────────────

#[tokio::test]
async fn test_mcp_401_without_credentials() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::post("/mcp")
                .header("Content-Type", "application/json")
                .body(Body::from(json!({"jsonrpc":"2.0","method":"tools/list","id":1}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let www_auth = response.headers().get("WWW-Authenticate").unwrap().to_str().unwrap();
    assert!(www_auth.contains("oauth-protected-resource"));
    assert!(!www_auth.contains("invalid_token"));
}

#[tokio::test]
async fn test_mcp_401_with_rejected_token() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::post("/mcp")
                .header("Content-Type", "application/json")
                .header("Authorization", "Bearer garbage")
                .body(Body::from(json!({"jsonrpc":"2.0","method":"tools/list","id":1}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let www_auth = response.headers().get("WWW-Authenticate").unwrap().to_str().unwrap();
    assert!(www_auth.contains(r#"error="invalid_token""#));
    assert!(www_auth.contains("oauth-protected-resource"));
}

#[tokio::test]
async fn test_mcp_accepts_operator_bearer() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::post("/mcp")
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {AUTH_TOKEN}"))
                .body(Body::from(json!({"jsonrpc":"2.0","method":"tools/list","id":1}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("Mcp-Session-Id").is_some());
    let json = body_json(response).await;
    assert!(!json["result"]["tools"].as_array().unwrap().is_empty());
}

// ─── End-to-end scenario ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_flow_token_authenticates_mcp() {
    let app = build_test_router();
    let client_id = register_client(&app, "https://app.example/cb").await;
    let code = obtain_code(&app, &client_id, "https://app.example/cb").await;

    let response = exchange(&app, &code, &client_id, VERIFIER, "https://app.example/cb").await;
    assert_eq!(response.status(), StatusCode::OK);
    let access_token = body_json(response).await["access_token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::post("/mcp")
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {access_token}"))
                .body(Body::from(json!({"jsonrpc":"2.0","method":"tools/list","id":1}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let tools = json["result"]["tools"].as_array().unwrap();
    assert!(tools.iter().any(|t| t["name"] == "get_account_balances"));
}
