//! Balance and position tools: get_account_balances, get_positions, get_balance_snapshots.

use serde_json::json;

use super::{McpTool, ToolContext, render_json};
use crate::error::{ToolError, ToolResult};
use crate::models::{AccountInput, BalanceSnapshotsInput, PositionsInput};

/// Current balance values for an account.
pub struct GetAccountBalancesTool;

#[async_trait::async_trait]
impl McpTool for GetAccountBalancesTool {
    fn name(&self) -> &'static str {
        "get_account_balances"
    }

    fn description(&self) -> &'static str {
        "Get current balance values for an account including cash, equity, and buying power."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number to get balances for"
                }
            },
            "required": ["accountNumber"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: AccountInput = serde_json::from_value(input)?;
        let balances =
            ctx.client.get_balances(&params.account_number).await.map_err(ToolError::from)?;
        render_json(&balances)
    }
}

/// Open positions, optionally filtered by symbol.
pub struct GetPositionsTool;

#[async_trait::async_trait]
impl McpTool for GetPositionsTool {
    fn name(&self) -> &'static str {
        "get_positions"
    }

    fn description(&self) -> &'static str {
        "Get all current positions for an account. Can be filtered by symbol or underlying symbol."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number to get positions for"
                },
                "symbol": {
                    "type": "string",
                    "description": "Filter positions by specific symbol"
                },
                "underlyingSymbol": {
                    "type": "string",
                    "description": "Filter positions by underlying symbol"
                }
            },
            "required": ["accountNumber"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: PositionsInput = serde_json::from_value(input)?;
        let positions = ctx
            .client
            .get_positions(
                &params.account_number,
                params.symbol.as_deref(),
                params.underlying_symbol.as_deref(),
            )
            .await
            .map_err(ToolError::from)?;
        render_json(&positions)
    }
}

/// Historical balance snapshots.
pub struct GetBalanceSnapshotsTool;

#[async_trait::async_trait]
impl McpTool for GetBalanceSnapshotsTool {
    fn name(&self) -> &'static str {
        "get_balance_snapshots"
    }

    fn description(&self) -> &'static str {
        "Get balance snapshots for an account showing historical balance data."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number to get snapshots for"
                },
                "timeOfDay": {
                    "type": "string",
                    "description": "Time of day for snapshot ('BOD' for beginning of day, 'EOD' for end of day)"
                }
            },
            "required": ["accountNumber"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: BalanceSnapshotsInput = serde_json::from_value(input)?;
        let snapshots = ctx
            .client
            .get_balance_snapshots(&params.account_number, params.time_of_day.as_deref())
            .await
            .map_err(ToolError::from)?;
        render_json(&snapshots)
    }
}
