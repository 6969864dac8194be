//! Watchlist tools: get_watchlists, create_watchlist, delete_watchlist.

use serde_json::json;

use super::{McpTool, ToolContext, render_json};
use crate::error::{ToolError, ToolResult};
use crate::models::{CreateWatchlistInput, WatchlistNameInput};

/// List the customer's watchlists.
pub struct GetWatchlistsTool;

#[async_trait::async_trait]
impl McpTool for GetWatchlistsTool {
    fn name(&self) -> &'static str {
        "get_watchlists"
    }

    fn description(&self) -> &'static str {
        "List all watchlists for the authenticated customer."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let watchlists = ctx.client.get_watchlists().await.map_err(ToolError::from)?;
        render_json(&watchlists)
    }
}

/// Create a watchlist.
pub struct CreateWatchlistTool;

#[async_trait::async_trait]
impl McpTool for CreateWatchlistTool {
    fn name(&self) -> &'static str {
        "create_watchlist"
    }

    fn description(&self) -> &'static str {
        "Create a new watchlist with the given name and entries."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The watchlist name"
                },
                "entries": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "symbol": {"type": "string"},
                            "instrument-type": {"type": "string"}
                        },
                        "required": ["symbol", "instrument-type"]
                    },
                    "description": "Symbols to include in the watchlist"
                }
            },
            "required": ["name", "entries"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: CreateWatchlistInput = serde_json::from_value(input)?;
        let body = json!({
            "name": params.name,
            "watchlist-entries": params.entries,
        });
        let created = ctx.client.create_watchlist(&body).await.map_err(ToolError::from)?;
        render_json(&created)
    }
}

/// Delete a watchlist by name.
pub struct DeleteWatchlistTool;

#[async_trait::async_trait]
impl McpTool for DeleteWatchlistTool {
    fn name(&self) -> &'static str {
        "delete_watchlist"
    }

    fn description(&self) -> &'static str {
        "Delete a watchlist by name."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The watchlist name to delete"
                }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: WatchlistNameInput = serde_json::from_value(input)?;
        let result = ctx.client.delete_watchlist(&params.name).await.map_err(ToolError::from)?;
        render_json(&result)
    }
}
