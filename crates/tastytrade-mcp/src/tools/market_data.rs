//! Market data tools: get_market_data.

use serde_json::json;

use super::{McpTool, ToolContext, render_json};
use crate::error::{ToolError, ToolResult};
use crate::models::MarketDataInput;

/// Snapshot quotes for a list of equity symbols.
pub struct GetMarketDataTool;

#[async_trait::async_trait]
impl McpTool for GetMarketDataTool {
    fn name(&self) -> &'static str {
        "get_market_data"
    }

    fn description(&self) -> &'static str {
        "Get snapshot market data (bid, ask, last, volume) for one or more equity symbols."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "symbols": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Equity symbols to quote (e.g., ['AAPL', 'SPY'])"
                }
            },
            "required": ["symbols"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: MarketDataInput = serde_json::from_value(input)?;
        if params.symbols.is_empty() {
            return Err(ToolError::validation("symbols", "at least one symbol is required"));
        }
        let quotes = ctx.client.get_market_data(&params.symbols).await.map_err(ToolError::from)?;
        render_json(&quotes)
    }
}
