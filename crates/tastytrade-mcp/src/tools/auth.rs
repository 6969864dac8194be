//! Brokerage connection status tool.

use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::ToolResult;

/// Report (and, if needed, retry) brokerage authentication.
pub struct CheckAuthStatusTool;

#[async_trait::async_trait]
impl McpTool for CheckAuthStatusTool {
    fn name(&self) -> &'static str {
        "check_auth_status"
    }

    fn description(&self) -> &'static str {
        "Check whether the server is connected to Tastytrade, retrying \
         authentication if the connection was lost at startup."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        if ctx.client.is_authenticated().await {
            return Ok("Authenticated with Tastytrade.".to_string());
        }

        match ctx.client.authenticate().await {
            Ok(accounts) => Ok(format!(
                "Successfully authenticated via OAuth. Found {accounts} account(s)."
            )),
            Err(e) => Ok(format!("Not authenticated: {e}")),
        }
    }
}
