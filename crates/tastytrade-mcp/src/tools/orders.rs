//! Order tools: get_orders, get_live_orders, get_order, cancel_order.

use serde_json::json;

use super::{McpTool, ToolContext, render_json};
use crate::error::{ToolError, ToolResult};
use crate::models::{OrderIdInput, OrdersInput};

/// Order history for an account.
pub struct GetOrdersTool;

#[async_trait::async_trait]
impl McpTool for GetOrdersTool {
    fn name(&self) -> &'static str {
        "get_orders"
    }

    fn description(&self) -> &'static str {
        "Get order history for an account, optionally filtered by status."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number to list orders for"
                },
                "status": {
                    "type": "string",
                    "description": "Filter by order status (e.g., 'Live', 'Filled', 'Cancelled')"
                }
            },
            "required": ["accountNumber"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: OrdersInput = serde_json::from_value(input)?;
        let orders = ctx
            .client
            .get_orders(&params.account_number, params.status.as_deref())
            .await
            .map_err(ToolError::from)?;
        render_json(&orders)
    }
}

/// Orders still working at the exchange.
pub struct GetLiveOrdersTool;

#[async_trait::async_trait]
impl McpTool for GetLiveOrdersTool {
    fn name(&self) -> &'static str {
        "get_live_orders"
    }

    fn description(&self) -> &'static str {
        "Get all currently live (working) orders for an account."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number to list live orders for"
                }
            },
            "required": ["accountNumber"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: OrdersInput = serde_json::from_value(input)?;
        let orders =
            ctx.client.get_live_orders(&params.account_number).await.map_err(ToolError::from)?;
        render_json(&orders)
    }
}

/// Single order lookup.
pub struct GetOrderTool;

#[async_trait::async_trait]
impl McpTool for GetOrderTool {
    fn name(&self) -> &'static str {
        "get_order"
    }

    fn description(&self) -> &'static str {
        "Get details for a specific order by ID."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number the order belongs to"
                },
                "orderId": {
                    "type": "string",
                    "description": "The order ID"
                }
            },
            "required": ["accountNumber", "orderId"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: OrderIdInput = serde_json::from_value(input)?;
        let order = ctx
            .client
            .get_order(&params.account_number, &params.order_id)
            .await
            .map_err(ToolError::from)?;
        render_json(&order)
    }
}

/// Cancel a working order.
pub struct CancelOrderTool;

#[async_trait::async_trait]
impl McpTool for CancelOrderTool {
    fn name(&self) -> &'static str {
        "cancel_order"
    }

    fn description(&self) -> &'static str {
        "Cancel a live order by ID."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number the order belongs to"
                },
                "orderId": {
                    "type": "string",
                    "description": "The order ID to cancel"
                }
            },
            "required": ["accountNumber", "orderId"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: OrderIdInput = serde_json::from_value(input)?;
        let result = ctx
            .client
            .cancel_order(&params.account_number, &params.order_id)
            .await
            .map_err(ToolError::from)?;
        render_json(&result)
    }
}
