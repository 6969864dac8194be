//! Input models for MCP tool parameters.

use serde::{Deserialize, Serialize};

/// Input naming only an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInput {
    /// The account number to operate on.
    pub account_number: String,
}

/// Input for position queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsInput {
    /// The account number to get positions for.
    pub account_number: String,

    /// Filter positions by specific symbol.
    #[serde(default)]
    pub symbol: Option<String>,

    /// Filter positions by underlying symbol.
    #[serde(default)]
    pub underlying_symbol: Option<String>,
}

/// Input for balance snapshot queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshotsInput {
    /// The account number to get snapshots for.
    pub account_number: String,

    /// Time of day for the snapshot ("BOD" or "EOD").
    #[serde(default)]
    pub time_of_day: Option<String>,
}

/// Input for order list queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersInput {
    /// The account number to list orders for.
    pub account_number: String,

    /// Filter by order status (e.g., "Live", "Filled", "Cancelled").
    #[serde(default)]
    pub status: Option<String>,
}

/// Input naming a single order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdInput {
    /// The account number the order belongs to.
    pub account_number: String,

    /// The order ID.
    pub order_id: String,
}

/// Input naming a single symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInput {
    /// The instrument symbol (e.g., "AAPL").
    pub symbol: String,
}

/// Input for futures listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesInput {
    /// Filter by futures product code (e.g., "ES").
    #[serde(default)]
    pub product_code: Option<String>,
}

/// Input for market data quotes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataInput {
    /// Equity symbols to quote.
    pub symbols: Vec<String>,
}

/// Input for transaction history queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsInput {
    /// The account number to list transactions for.
    pub account_number: String,

    /// Start date filter (YYYY-MM-DD).
    #[serde(default)]
    pub start_date: Option<String>,

    /// End date filter (YYYY-MM-DD).
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Input naming a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIdInput {
    /// The account number the transaction belongs to.
    pub account_number: String,

    /// The transaction ID.
    pub transaction_id: String,
}

/// Input naming a watchlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistNameInput {
    /// The watchlist name.
    pub name: String,
}

/// Input for watchlist creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWatchlistInput {
    /// The watchlist name.
    pub name: String,

    /// Entries to include, each a symbol with an instrument type.
    pub entries: Vec<WatchlistEntry>,
}

/// A single watchlist entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WatchlistEntry {
    /// The instrument symbol.
    pub symbol: String,

    /// The instrument type (e.g., "Equity").
    pub instrument_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_inputs() {
        let input: PositionsInput = serde_json::from_value(serde_json::json!({
            "accountNumber": "5WT0001",
            "underlyingSymbol": "SPY"
        }))
        .unwrap();
        assert_eq!(input.account_number, "5WT0001");
        assert_eq!(input.underlying_symbol.as_deref(), Some("SPY"));
        assert!(input.symbol.is_none());
    }

    #[test]
    fn test_watchlist_entry_kebab_case() {
        let entry: WatchlistEntry = serde_json::from_value(serde_json::json!({
            "symbol": "AAPL",
            "instrument-type": "Equity"
        }))
        .unwrap();
        assert_eq!(entry.instrument_type, "Equity");
    }
}
