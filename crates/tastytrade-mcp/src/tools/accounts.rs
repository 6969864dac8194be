//! Account tools: get_customer_info, get_customer_accounts, get_account_details.

use serde_json::json;

use super::{McpTool, ToolContext, render_json};
use crate::error::{ToolError, ToolResult};
use crate::models::AccountInput;

/// Customer profile lookup.
pub struct GetCustomerInfoTool;

#[async_trait::async_trait]
impl McpTool for GetCustomerInfoTool {
    fn name(&self) -> &'static str {
        "get_customer_info"
    }

    fn description(&self) -> &'static str {
        "Get the authenticated customer's profile information."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let customer = ctx.client.get_customer().await.map_err(ToolError::from)?;
        render_json(&customer)
    }
}

/// List all accounts visible to the customer.
pub struct GetCustomerAccountsTool;

#[async_trait::async_trait]
impl McpTool for GetCustomerAccountsTool {
    fn name(&self) -> &'static str {
        "get_customer_accounts"
    }

    fn description(&self) -> &'static str {
        "List all trading accounts for the authenticated customer."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let accounts = ctx.client.get_customer_accounts().await.map_err(ToolError::from)?;
        render_json(&accounts)
    }
}

/// Single account detail lookup.
pub struct GetAccountDetailsTool;

#[async_trait::async_trait]
impl McpTool for GetAccountDetailsTool {
    fn name(&self) -> &'static str {
        "get_account_details"
    }

    fn description(&self) -> &'static str {
        "Get details for a specific account including type, nickname, and margin status."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number to look up"
                }
            },
            "required": ["accountNumber"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: AccountInput = serde_json::from_value(input)?;
        let account = ctx.client.get_account(&params.account_number).await.map_err(ToolError::from)?;
        render_json(&account)
    }
}
