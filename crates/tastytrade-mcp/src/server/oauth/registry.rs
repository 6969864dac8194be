//! Dynamically registered OAuth client store (RFC 7591).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Deserialize;
use tokio::sync::RwLock;
use url::Url;

/// Default display name for clients that register without one.
const DEFAULT_CLIENT_NAME: &str = "MCP Client";

/// Registration request body per RFC 7591.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub client_name: Option<String>,
    pub redirect_uris: Option<Vec<String>>,
    pub grant_types: Option<Vec<String>>,
    pub response_types: Option<Vec<String>>,
    pub token_endpoint_auth_method: Option<String>,
}

/// A registered OAuth client.
///
/// The redirect URI set is fixed at registration; any redirect used later
/// in the flow must exactly string-match one of these entries.
#[derive(Debug, Clone)]
pub struct RegisteredClient {
    pub client_id: String,
    pub client_name: String,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub token_endpoint_auth_method: String,
    pub created_at: SystemTime,
}

impl RegisteredClient {
    /// Seconds since the Unix epoch at which the client was registered.
    #[must_use]
    pub fn issued_at_secs(&self) -> u64 {
        self.created_at.duration_since(SystemTime::UNIX_EPOCH).map_or(0, |d| d.as_secs())
    }
}

/// Why a registration request was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("redirect_uris is required and must contain at least one URI")]
    MissingRedirectUris,

    #[error("Invalid redirect URI: {uri}")]
    InvalidRedirectUri { uri: String },
}

/// In-memory store of registered clients.
///
/// Clients live for the process lifetime; there is no update or
/// revocation path.
#[derive(Clone)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<String, RegisteredClient>>>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { clients: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Register a new OAuth client.
    ///
    /// Validates that `redirect_uris` is present, non-empty, and that
    /// every entry parses as an absolute URI. Server-assigned defaults
    /// fill any omitted optional field.
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegisteredClient, RegistrationError> {
        let redirect_uris = request.redirect_uris.unwrap_or_default();
        if redirect_uris.is_empty() {
            return Err(RegistrationError::MissingRedirectUris);
        }
        for uri in &redirect_uris {
            if Url::parse(uri).is_err() {
                return Err(RegistrationError::InvalidRedirectUri { uri: uri.clone() });
            }
        }

        let client = RegisteredClient {
            client_id: uuid::Uuid::new_v4().simple().to_string(),
            client_name: request
                .client_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
            redirect_uris,
            grant_types: request
                .grant_types
                .filter(|g| !g.is_empty())
                .unwrap_or_else(|| vec!["authorization_code".to_string()]),
            response_types: request
                .response_types
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| vec!["code".to_string()]),
            token_endpoint_auth_method: request
                .token_endpoint_auth_method
                .unwrap_or_else(|| "none".to_string()),
            created_at: SystemTime::now(),
        };

        self.clients.write().await.insert(client.client_id.clone(), client.clone());
        Ok(client)
    }

    /// Look up a client by ID.
    pub async fn get(&self, client_id: &str) -> Option<RegisteredClient> {
        self.clients.read().await.get(client_id).cloned()
    }

    /// Whether the given redirect URI is registered for this client.
    ///
    /// Exact string equality only: no scheme/host normalization, no
    /// wildcard or prefix matching.
    #[must_use]
    pub fn is_redirect_registered(client: &RegisteredClient, redirect_uri: &str) -> bool {
        client.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry").finish()
    }
}
