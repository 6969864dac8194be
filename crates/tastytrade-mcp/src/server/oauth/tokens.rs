//! Bearer access token store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::random_token;

/// Access token lifetime: 24 hours.
pub(crate) const ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 3600);

/// Seconds until expiry, as reported in token responses.
pub const EXPIRES_IN_SECS: u64 = ACCESS_TOKEN_LIFETIME.as_secs();

/// An issued bearer token and its binding data.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub client_id: String,
    pub scope: String,
    expires_at: Instant,
}

/// In-memory store of issued access tokens.
#[derive(Clone)]
pub struct TokenStore {
    tokens: Arc<RwLock<HashMap<String, IssuedToken>>>,
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self { tokens: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Issue a fresh access token for the given client and scope.
    pub async fn issue(&self, client_id: &str, scope: &str) -> IssuedToken {
        let token = IssuedToken {
            token: random_token(),
            client_id: client_id.to_owned(),
            scope: scope.to_owned(),
            expires_at: Instant::now() + ACCESS_TOKEN_LIFETIME,
        };
        self.tokens.write().await.insert(token.token.clone(), token.clone());
        token
    }

    /// Validate a bearer token.
    ///
    /// An expired token is purged on detection and reported identically
    /// to a token that was never issued.
    pub async fn validate(&self, token: &str) -> Option<IssuedToken> {
        let mut tokens = self.tokens.write().await;
        let issued = tokens.get(token)?;
        if Instant::now() >= issued.expires_at {
            tokens.remove(token);
            return None;
        }
        Some(issued.clone())
    }

    /// Remove expired tokens.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| now < token.expires_at);
        let removed = before - tokens.len();
        if removed > 0 {
            tracing::debug!(count = removed, "Swept expired access tokens");
        }
        removed
    }

    /// Number of live tokens (for monitoring).
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Whether the store holds no tokens.
    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_and_validate() {
        let store = TokenStore::new();
        let issued = store.issue("client1", "mcp:tools").await;

        let validated = store.validate(&issued.token).await.unwrap();
        assert_eq!(validated.client_id, "client1");
        assert_eq!(validated.scope, "mcp:tools");
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let store = TokenStore::new();
        assert!(store.validate("never-issued").await.is_none());
    }

    #[tokio::test]
    async fn test_validate_expired_token_purges() {
        let store = TokenStore::new();
        let issued = store.issue("client1", "mcp:tools").await;

        {
            let mut tokens = store.tokens.write().await;
            tokens.get_mut(&issued.token).unwrap().expires_at =
                Instant::now() - Duration::from_secs(1);
        }

        assert!(store.validate(&issued.token).await.is_none());
        // Purged on detection, not just hidden.
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = TokenStore::new();
        let a = store.issue("client1", "mcp:tools").await;
        let b = store.issue("client1", "mcp:tools").await;
        assert_ne!(a.token, b.token);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let store = TokenStore::new();
        let dead = store.issue("client1", "mcp:tools").await;
        let _live = store.issue("client2", "mcp:tools").await;

        {
            let mut tokens = store.tokens.write().await;
            tokens.get_mut(&dead.token).unwrap().expires_at =
                Instant::now() - Duration::from_secs(1);
        }

        assert_eq!(store.sweep_expired().await, 1);
        assert_eq!(store.len().await, 1);
    }
}
