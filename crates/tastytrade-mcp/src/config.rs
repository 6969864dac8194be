//! Configuration for the Tastytrade MCP server.

use std::time::Duration;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for the production Tastytrade API.
    pub const PROD_API: &str = "https://api.tastyworks.com";

    /// Base URL for the certification (sandbox) Tastytrade API.
    pub const SANDBOX_API: &str = "https://api.cert.tastyworks.com";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth client secret for the Tastytrade API.
    pub client_secret: Option<String>,

    /// OAuth refresh token for the Tastytrade API.
    pub refresh_token: Option<String>,

    /// Operator bearer secret gating consent approval and accepted as a
    /// bearer shortcut on the MCP endpoint. Absent means consent always
    /// fails closed.
    pub bearer_token: Option<String>,

    /// Use the certification (sandbox) environment.
    pub sandbox: bool,

    /// Base URL for the Tastytrade API (overridable for mock servers).
    pub api_base_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Config {
    /// Create a new configuration.
    #[must_use]
    pub fn new(
        client_secret: Option<String>,
        refresh_token: Option<String>,
        bearer_token: Option<String>,
        sandbox: bool,
    ) -> Self {
        Self {
            client_secret,
            refresh_token,
            bearer_token,
            sandbox,
            api_base_url: if sandbox { api::SANDBOX_API } else { api::PROD_API }.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
        }
    }

    /// Create a test configuration pointing at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            client_secret: Some("test-client-secret".to_string()),
            refresh_token: Some("test-refresh-token".to_string()),
            bearer_token: None,
            sandbox: true,
            api_base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        let client_secret = std::env::var("TASTYTRADE_CLIENT_SECRET").ok();
        let refresh_token = std::env::var("TASTYTRADE_REFRESH_TOKEN").ok();
        let bearer_token = std::env::var("MCP_BEARER_TOKEN").ok();
        let sandbox = std::env::var("TASTYTRADE_SANDBOX")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(Self::new(client_secret, refresh_token, bearer_token, sandbox))
    }

    /// Check if brokerage credentials are configured.
    #[must_use]
    pub const fn has_brokerage_credentials(&self) -> bool {
        self.client_secret.is_some() && self.refresh_token.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None, None, false)
    }
}
