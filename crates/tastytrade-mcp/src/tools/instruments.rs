//! Instrument tools: get_equity_instrument, get_option_chain, list_futures.

use serde_json::json;

use super::{McpTool, ToolContext, render_json};
use crate::error::{ToolError, ToolResult};
use crate::models::{FuturesInput, SymbolInput};

/// Equity instrument lookup.
pub struct GetEquityInstrumentTool;

#[async_trait::async_trait]
impl McpTool for GetEquityInstrumentTool {
    fn name(&self) -> &'static str {
        "get_equity_instrument"
    }

    fn description(&self) -> &'static str {
        "Get instrument details for an equity symbol including tick sizes and trading status."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "The equity symbol (e.g., 'AAPL')"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: SymbolInput = serde_json::from_value(input)?;
        let equity = ctx.client.get_equity(&params.symbol).await.map_err(ToolError::from)?;
        render_json(&equity)
    }
}

/// Nested option chain for an underlying.
pub struct GetOptionChainTool;

#[async_trait::async_trait]
impl McpTool for GetOptionChainTool {
    fn name(&self) -> &'static str {
        "get_option_chain"
    }

    fn description(&self) -> &'static str {
        "Get the nested option chain for an underlying symbol, grouped by expiration and strike."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "The underlying symbol (e.g., 'SPY')"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: SymbolInput = serde_json::from_value(input)?;
        let chain = ctx.client.get_option_chain(&params.symbol).await.map_err(ToolError::from)?;
        render_json(&chain)
    }
}

/// Futures instrument listing.
pub struct ListFuturesTool;

#[async_trait::async_trait]
impl McpTool for ListFuturesTool {
    fn name(&self) -> &'static str {
        "list_futures"
    }

    fn description(&self) -> &'static str {
        "List futures instruments, optionally filtered by product code."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "productCode": {
                    "type": "string",
                    "description": "Futures product code filter (e.g., 'ES')"
                }
            }
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: FuturesInput = serde_json::from_value(input)?;
        let futures =
            ctx.client.get_futures(params.product_code.as_deref()).await.map_err(ToolError::from)?;
        render_json(&futures)
    }
}
