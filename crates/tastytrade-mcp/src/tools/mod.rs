//! MCP tools for the Tastytrade brokerage API.
//!
//! Each tool is a thin pass-through: validate parameters, call the
//! corresponding API endpoint, return the response JSON.

mod accounts;
mod auth;
mod balances;
mod instruments;
mod market_data;
mod orders;
mod transactions;
mod watchlists;

use std::sync::Arc;

use crate::client::TastytradeClient;
use crate::error::ToolResult;

/// Shared context passed to tool execution.
#[derive(Clone)]
pub struct ToolContext {
    /// The brokerage API client.
    pub client: Arc<TastytradeClient>,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(client: Arc<TastytradeClient>) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext").finish()
    }
}

/// An MCP tool: name, description, JSON Schema, and async execution.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name as advertised in tools/list.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// JSON Schema for the tool input.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given input.
    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String>;
}

/// Render an API response for an MCP text content block.
pub(crate) fn render_json(value: &serde_json::Value) -> ToolResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Register all brokerage tools.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![
        Box::new(auth::CheckAuthStatusTool),
        Box::new(accounts::GetCustomerInfoTool),
        Box::new(accounts::GetCustomerAccountsTool),
        Box::new(accounts::GetAccountDetailsTool),
        Box::new(balances::GetAccountBalancesTool),
        Box::new(balances::GetPositionsTool),
        Box::new(balances::GetBalanceSnapshotsTool),
        Box::new(orders::GetOrdersTool),
        Box::new(orders::GetLiveOrdersTool),
        Box::new(orders::GetOrderTool),
        Box::new(orders::CancelOrderTool),
        Box::new(instruments::GetEquityInstrumentTool),
        Box::new(instruments::GetOptionChainTool),
        Box::new(instruments::ListFuturesTool),
        Box::new(market_data::GetMarketDataTool),
        Box::new(transactions::GetTransactionsTool),
        Box::new(transactions::GetTransactionTool),
        Box::new(watchlists::GetWatchlistsTool),
        Box::new(watchlists::CreateWatchlistTool),
        Box::new(watchlists::DeleteWatchlistTool),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_names_unique() {
        let tools = register_all_tools();
        let names: HashSet<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_tool_schemas_are_objects() {
        for tool in register_all_tools() {
            let schema = tool.input_schema();
            assert_eq!(schema["type"], "object", "schema for {}", tool.name());
            assert!(!tool.description().is_empty());
        }
    }
}
