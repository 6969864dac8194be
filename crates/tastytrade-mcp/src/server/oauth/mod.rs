//! OAuth 2.1 authorization server for MCP authentication.
//!
//! Implements a self-contained authorization server embedded in the
//! binary, supporting the MCP OAuth flow used by Claude.ai Custom
//! Connectors and other third-party OAuth clients.
//!
//! ## Supported Standards
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256 only)
//! - RFC 6749: Authorization Code Grant

pub mod consent;
pub mod grants;
pub mod handlers;
pub mod pkce;
pub mod registry;
pub mod server;
pub mod tokens;

pub use grants::{ExchangeError, GrantStore};
pub use registry::{ClientRegistry, RegistrationError};
pub use server::AuthorizationServer;
pub use tokens::TokenStore;

/// Generate a random credential string using two UUIDs (256 bits).
pub(crate) fn random_token() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}
