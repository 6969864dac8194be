//! Data models for Tastytrade MCP tool parameters.
//!
//! All inputs use `#[serde(rename_all = "camelCase")]` to match the
//! tool schemas advertised over MCP.

mod inputs;

pub use inputs::*;
