//! Authorization code store.
//!
//! Codes are one-time credentials binding a consent approval to a
//! client, redirect URI, and PKCE challenge.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::pkce;
use super::random_token;

/// Authorization code lifetime: 10 minutes.
pub(crate) const AUTH_CODE_LIFETIME: Duration = Duration::from_secs(600);

/// An issued authorization code and its binding data.
#[derive(Debug, Clone)]
struct AuthorizationGrant {
    client_id: String,
    redirect_uri: String,
    code_challenge: String,
    code_challenge_method: String,
    scope: String,
    expires_at: Instant,
}

/// The binding returned by a successful exchange, used to mint a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedAccess {
    pub client_id: String,
    pub scope: String,
}

/// Why an exchange attempt failed.
///
/// These sub-reasons are collapsed to a single `invalid_grant` at the
/// wire boundary; they exist so logs and tests can tell them apart.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("authorization code not found")]
    NotFound,

    #[error("authorization code expired")]
    Expired,

    #[error("client_id does not match the code")]
    ClientMismatch,

    #[error("redirect_uri does not match the code")]
    RedirectMismatch,

    #[error("PKCE verification failed")]
    ChallengeMismatch,
}

/// In-memory store of outstanding authorization codes.
#[derive(Clone)]
pub struct GrantStore {
    grants: Arc<RwLock<HashMap<String, AuthorizationGrant>>>,
}

impl GrantStore {
    #[must_use]
    pub fn new() -> Self {
        Self { grants: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Issue a fresh authorization code bound to the given parameters.
    pub async fn issue(
        &self,
        client_id: String,
        redirect_uri: String,
        code_challenge: String,
        code_challenge_method: String,
        scope: String,
    ) -> String {
        let code = random_token();
        self.grants.write().await.insert(
            code.clone(),
            AuthorizationGrant {
                client_id,
                redirect_uri,
                code_challenge,
                code_challenge_method,
                scope,
                expires_at: Instant::now() + AUTH_CODE_LIFETIME,
            },
        );
        code
    }

    /// Consume an authorization code (one-time use).
    ///
    /// The whole lookup-validate-delete sequence runs under one write
    /// lock, and the grant is removed before success is returned, so
    /// concurrent exchanges of the same code see at most one success.
    ///
    /// The grant is deleted only on success or on detected expiry; a
    /// failed validation (wrong client, redirect, or verifier) leaves it
    /// in place so a legitimate client can retry within the code's
    /// lifetime.
    pub async fn consume(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<GrantedAccess, ExchangeError> {
        let mut grants = self.grants.write().await;

        let grant = grants.get(code).ok_or(ExchangeError::NotFound)?;

        if Instant::now() >= grant.expires_at {
            grants.remove(code);
            return Err(ExchangeError::Expired);
        }
        if grant.client_id != client_id {
            return Err(ExchangeError::ClientMismatch);
        }
        if grant.redirect_uri != redirect_uri {
            return Err(ExchangeError::RedirectMismatch);
        }
        if !pkce::verify_s256(code_verifier, &grant.code_challenge) {
            return Err(ExchangeError::ChallengeMismatch);
        }

        let grant = grants.remove(code).ok_or(ExchangeError::NotFound)?;
        Ok(GrantedAccess { client_id: grant.client_id, scope: grant.scope })
    }

    /// Remove expired codes. Correctness does not depend on this; it
    /// only bounds memory for codes that were never exchanged.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut grants = self.grants.write().await;
        let before = grants.len();
        grants.retain(|_, grant| now < grant.expires_at);
        let removed = before - grants.len();
        if removed > 0 {
            tracing::debug!(count = removed, "Swept expired authorization codes");
        }
        removed
    }

    /// Number of outstanding codes (for monitoring).
    pub async fn len(&self) -> usize {
        self.grants.read().await.len()
    }

    /// Whether the store holds no codes.
    pub async fn is_empty(&self) -> bool {
        self.grants.read().await.is_empty()
    }
}

impl Default for GrantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantStore").finish()
    }
}
