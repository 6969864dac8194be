//! Tastytrade MCP Server
//!
//! A Model Context Protocol (MCP) server exposing the Tastytrade
//! brokerage API as tool calls, protected by an embedded OAuth 2.1
//! authorization server (authorization-code grant with PKCE and dynamic
//! client registration).
//!
//! # Features
//!
//! - **Brokerage tools**: accounts, balances, positions, orders,
//!   instruments, market data, transactions, watchlists
//! - **OAuth 2.1**: RFC 8414 discovery, RFC 7591 registration, RFC 7636
//!   PKCE (S256 only), single-use authorization codes
//! - **Transports**: stdio for local hosts, streamable HTTP with SSE
//!   replay for remote connectors
//!
//! # Example
//!
//! ```no_run
//! use tastytrade_mcp::{TastytradeClient, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = TastytradeClient::new(config)?;
//!
//!     // Use client for API calls
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod tools;

pub use client::TastytradeClient;
pub use config::Config;
pub use error::{ClientError, ToolError};
