//! Transaction tools: get_transactions, get_transaction.

use serde_json::json;

use super::{McpTool, ToolContext, render_json};
use crate::error::{ToolError, ToolResult};
use crate::models::{TransactionIdInput, TransactionsInput};

/// Transaction history for an account.
pub struct GetTransactionsTool;

#[async_trait::async_trait]
impl McpTool for GetTransactionsTool {
    fn name(&self) -> &'static str {
        "get_transactions"
    }

    fn description(&self) -> &'static str {
        "Get transaction history for an account, optionally bounded by start and end dates."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number to list transactions for"
                },
                "startDate": {
                    "type": "string",
                    "description": "Start date filter (YYYY-MM-DD)"
                },
                "endDate": {
                    "type": "string",
                    "description": "End date filter (YYYY-MM-DD)"
                }
            },
            "required": ["accountNumber"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: TransactionsInput = serde_json::from_value(input)?;
        let transactions = ctx
            .client
            .get_transactions(
                &params.account_number,
                params.start_date.as_deref(),
                params.end_date.as_deref(),
            )
            .await
            .map_err(ToolError::from)?;
        render_json(&transactions)
    }
}

/// Single transaction lookup.
pub struct GetTransactionTool;

#[async_trait::async_trait]
impl McpTool for GetTransactionTool {
    fn name(&self) -> &'static str {
        "get_transaction"
    }

    fn description(&self) -> &'static str {
        "Get details for a specific transaction by ID."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "accountNumber": {
                    "type": "string",
                    "description": "The account number the transaction belongs to"
                },
                "transactionId": {
                    "type": "string",
                    "description": "The transaction ID"
                }
            },
            "required": ["accountNumber", "transactionId"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: TransactionIdInput = serde_json::from_value(input)?;
        let transaction = ctx
            .client
            .get_transaction(&params.account_number, &params.transaction_id)
            .await
            .map_err(ToolError::from)?;
        render_json(&transaction)
    }
}
