//! Authorization server orchestration.
//!
//! Composes the client registry, grant store, and token store into the
//! authorization-code + PKCE flow. One instance per process; the stores
//! are injected at construction so tests can run against fresh state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use url::Url;

use super::grants::GrantStore;
use super::registry::{ClientRegistry, RegisteredClient, RegistrationError, RegistrationRequest};
use super::tokens::{EXPIRES_IN_SECS, IssuedToken, TokenStore};

/// The single scope this server grants.
pub const DEFAULT_SCOPE: &str = "mcp:tools";

/// Interval between expiry sweeps of the grant and token stores.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Authorization request parameters, as received on the authorize
/// endpoint. Everything is optional at the wire; validation decides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeParams {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub scope: Option<String>,
}

/// Consent form submission: the authorize parameters round-tripped as
/// hidden fields, plus the operator credential the resource owner typed.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsentForm {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub scope: Option<String>,
    pub token: Option<String>,
}

/// Data needed to render the consent prompt.
#[derive(Debug, Clone)]
pub struct ConsentPrompt {
    pub client_name: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub state: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub scope: String,
}

/// Outcome of a consent submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Credential accepted: redirect the resource owner back to the
    /// client with a fresh authorization code.
    Approved {
        /// The registered redirect URI with `code` (and `state`, if any)
        /// appended as query parameters.
        redirect: String,
    },
    /// Credential rejected or not configured: re-render the consent
    /// prompt so the resource owner can retry.
    Denied { prompt: ConsentPrompt },
}

/// Why an authorization request was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeError {
    #[error("response_type must be 'code'")]
    UnsupportedResponseType,

    #[error("Missing required parameters")]
    MissingParameters,

    #[error("Only S256 code_challenge_method is supported")]
    UnsupportedChallengeMethod,

    #[error("Unknown client_id")]
    UnknownClient,

    #[error("redirect_uri not registered for this client")]
    UnregisteredRedirect,
}

impl AuthorizeError {
    /// Stable machine-readable code from the OAuth error vocabulary.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::UnknownClient => "invalid_client",
            Self::MissingParameters
            | Self::UnsupportedChallengeMethod
            | Self::UnregisteredRedirect => "invalid_request",
        }
    }
}

/// Token endpoint request parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenParams {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub client_id: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: Option<String>,
}

/// Why a token request was rejected.
///
/// Every exchange failure is collapsed to `InvalidGrant`; the sub-reason
/// is logged but never disclosed to the caller.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("unsupported grant_type")]
    UnsupportedGrantType,

    #[error("missing required parameters")]
    MissingParameters,

    #[error("invalid grant")]
    InvalidGrant,
}

impl TokenError {
    /// Stable machine-readable code from the OAuth error vocabulary.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::MissingParameters => "invalid_request",
            Self::InvalidGrant => "invalid_grant",
        }
    }
}

/// A successful token response body (RFC 6749 §5.1).
#[derive(Debug, Clone, Serialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub scope: String,
}

/// The embedded OAuth 2.1 authorization server.
#[derive(Clone)]
pub struct AuthorizationServer {
    registry: ClientRegistry,
    grants: GrantStore,
    tokens: TokenStore,
    operator_secret: Option<String>,
}

impl AuthorizationServer {
    /// Create a server over the given stores.
    ///
    /// `operator_secret` is the single bearer secret gating consent
    /// approval; without it every consent submission is rejected.
    #[must_use]
    pub fn new(
        registry: ClientRegistry,
        grants: GrantStore,
        tokens: TokenStore,
        operator_secret: Option<String>,
    ) -> Self {
        Self { registry, grants, tokens, operator_secret }
    }

    /// Convenience constructor with fresh stores.
    #[must_use]
    pub fn with_secret(operator_secret: Option<String>) -> Self {
        Self::new(ClientRegistry::new(), GrantStore::new(), TokenStore::new(), operator_secret)
    }

    /// RFC 8414 authorization server metadata for the given issuer.
    #[must_use]
    pub fn metadata(issuer: &str) -> serde_json::Value {
        serde_json::json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{issuer}/oauth/authorize"),
            "token_endpoint": format!("{issuer}/oauth/token"),
            "registration_endpoint": format!("{issuer}/oauth/register"),
            "response_types_supported": ["code"],
            "grant_types_supported": ["authorization_code"],
            "code_challenge_methods_supported": ["S256"],
            "token_endpoint_auth_methods_supported": ["none"],
            "scopes_supported": [DEFAULT_SCOPE],
        })
    }

    /// RFC 9728 protected resource metadata.
    #[must_use]
    pub fn protected_resource_metadata(
        resource_url: &str,
        authorization_server_url: &str,
    ) -> serde_json::Value {
        serde_json::json!({
            "resource": resource_url,
            "authorization_servers": [authorization_server_url],
            "bearer_methods_supported": ["header"],
            "scopes_supported": [DEFAULT_SCOPE],
        })
    }

    /// Register a new OAuth client (RFC 7591).
    pub async fn register_client(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegisteredClient, RegistrationError> {
        let client = self.registry.register(request).await?;
        tracing::info!(client_id = %client.client_id, client_name = %client.client_name,
            "Registered OAuth client");
        Ok(client)
    }

    /// Validate an authorization request and produce the consent prompt.
    ///
    /// Checks run in a fixed order so each failure maps to a specific
    /// OAuth error code: response type, parameter presence, challenge
    /// method, client existence, redirect registration.
    pub async fn begin_authorization(
        &self,
        params: &AuthorizeParams,
    ) -> Result<ConsentPrompt, AuthorizeError> {
        if params.response_type.as_deref() != Some("code") {
            return Err(AuthorizeError::UnsupportedResponseType);
        }

        let client_id = non_empty(&params.client_id).ok_or(AuthorizeError::MissingParameters)?;
        let redirect_uri =
            non_empty(&params.redirect_uri).ok_or(AuthorizeError::MissingParameters)?;
        let code_challenge =
            non_empty(&params.code_challenge).ok_or(AuthorizeError::MissingParameters)?;

        if let Some(method) = non_empty(&params.code_challenge_method) {
            if method != "S256" {
                return Err(AuthorizeError::UnsupportedChallengeMethod);
            }
        }

        let client = self.registry.get(client_id).await.ok_or(AuthorizeError::UnknownClient)?;

        if !ClientRegistry::is_redirect_registered(&client, redirect_uri) {
            return Err(AuthorizeError::UnregisteredRedirect);
        }

        Ok(ConsentPrompt {
            client_name: client.client_name,
            client_id: client_id.to_owned(),
            redirect_uri: redirect_uri.to_owned(),
            state: params.state.clone().unwrap_or_default(),
            code_challenge: code_challenge.to_owned(),
            code_challenge_method: "S256".to_string(),
            scope: non_empty(&params.scope).unwrap_or(DEFAULT_SCOPE).to_owned(),
        })
    }

    /// Handle a consent form submission.
    ///
    /// Re-validates the round-tripped client and redirect (defense
    /// against tampered hidden fields), then gates on the operator
    /// secret. A wrong or missing credential re-renders the prompt
    /// rather than erroring; a missing configured secret fails closed.
    pub async fn submit_consent(
        &self,
        form: &ConsentForm,
    ) -> Result<SubmitOutcome, AuthorizeError> {
        let params = AuthorizeParams {
            response_type: Some("code".to_string()),
            client_id: form.client_id.clone(),
            redirect_uri: form.redirect_uri.clone(),
            state: form.state.clone(),
            code_challenge: form.code_challenge.clone(),
            code_challenge_method: form.code_challenge_method.clone(),
            scope: form.scope.clone(),
        };
        let prompt = self.begin_authorization(&params).await?;

        let Some(secret) = &self.operator_secret else {
            tracing::warn!("Consent submitted but no operator bearer secret is configured; \
                 rejecting");
            return Ok(SubmitOutcome::Denied { prompt });
        };
        let presented = form.token.as_deref().unwrap_or_default();
        if !constant_time_eq(presented, secret) {
            tracing::debug!(client_id = %prompt.client_id, "Consent credential mismatch");
            return Ok(SubmitOutcome::Denied { prompt });
        }

        let code = self
            .grants
            .issue(
                prompt.client_id.clone(),
                prompt.redirect_uri.clone(),
                prompt.code_challenge.clone(),
                prompt.code_challenge_method.clone(),
                prompt.scope.clone(),
            )
            .await;

        // The redirect URI parsed at registration, so this cannot fail
        // for a URI that passed the registration check above.
        let mut redirect =
            Url::parse(&prompt.redirect_uri).map_err(|_| AuthorizeError::UnregisteredRedirect)?;
        redirect.query_pairs_mut().append_pair("code", &code);
        if !prompt.state.is_empty() {
            redirect.query_pairs_mut().append_pair("state", &prompt.state);
        }

        tracing::info!(client_id = %prompt.client_id, "Authorization approved, code issued");
        Ok(SubmitOutcome::Approved { redirect: redirect.into() })
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_token(&self, params: &TokenParams) -> Result<TokenGrant, TokenError> {
        if params.grant_type.as_deref() != Some("authorization_code") {
            return Err(TokenError::UnsupportedGrantType);
        }

        let code = non_empty(&params.code).ok_or(TokenError::MissingParameters)?;
        let client_id = non_empty(&params.client_id).ok_or(TokenError::MissingParameters)?;
        let code_verifier =
            non_empty(&params.code_verifier).ok_or(TokenError::MissingParameters)?;
        let redirect_uri =
            non_empty(&params.redirect_uri).ok_or(TokenError::MissingParameters)?;

        let access = self
            .grants
            .consume(code, client_id, redirect_uri, code_verifier)
            .await
            .map_err(|reason| {
                // Sub-reason stays in the logs; the wire sees only
                // invalid_grant.
                tracing::debug!(client_id = %client_id, %reason, "Code exchange rejected");
                TokenError::InvalidGrant
            })?;

        let token = self.tokens.issue(&access.client_id, &access.scope).await;
        tracing::info!(client_id = %access.client_id, "Access token issued");

        Ok(TokenGrant {
            access_token: token.token,
            token_type: "Bearer",
            expires_in: EXPIRES_IN_SECS,
            scope: access.scope,
        })
    }

    /// Validate a bearer token presented to the resource boundary.
    pub async fn validate_bearer(&self, token: &str) -> Option<IssuedToken> {
        self.tokens.validate(token).await
    }

    /// Whether the presented credential is the operator bearer secret.
    #[must_use]
    pub fn is_operator_secret(&self, presented: &str) -> bool {
        self.operator_secret.as_deref().is_some_and(|secret| constant_time_eq(presented, secret))
    }

    /// Start the background expiry sweep for grants and tokens.
    pub fn start_cleanup_task(&self) {
        let grants = self.grants.clone();
        let tokens = self.tokens.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                grants.sweep_expired().await;
                tokens.sweep_expired().await;
            }
        });
    }
}

impl std::fmt::Debug for AuthorizationServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationServer")
            .field("operator_secret_configured", &self.operator_secret.is_some())
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
