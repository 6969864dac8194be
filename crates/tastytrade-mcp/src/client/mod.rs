//! Tastytrade API client.
//!
//! Provides an async HTTP client with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff
//! - OAuth refresh-token authentication against the brokerage API
//!
//! The client is a thin pass-through: tool calls map to single API
//! requests and responses are returned as raw JSON.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tokio::sync::RwLock;

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};

/// Tastytrade API client.
pub struct TastytradeClient {
    /// HTTP client with middleware.
    client: ClientWithMiddleware,

    /// Brokerage access token obtained from the refresh-token exchange.
    access_token: RwLock<Option<String>>,

    /// OAuth client secret.
    client_secret: Option<String>,

    /// OAuth refresh token.
    refresh_token: Option<String>,

    /// API base URL.
    base_url: String,
}

impl TastytradeClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
            .build_with_max_retries(3);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            access_token: RwLock::new(None),
            client_secret: config.client_secret,
            refresh_token: config.refresh_token,
            base_url: config.api_base_url,
        })
    }

    /// Exchange the configured refresh token for a brokerage access token.
    ///
    /// Called once at startup; failure is non-fatal (the server starts
    /// without a brokerage connection and the auth-status tool retries).
    /// Returns the number of accounts visible to the authenticated session.
    pub async fn authenticate(&self) -> ClientResult<usize> {
        let (Some(secret), Some(refresh)) = (&self.client_secret, &self.refresh_token) else {
            return Err(ClientError::unauthenticated(
                "TASTYTRADE_CLIENT_SECRET and TASTYTRADE_REFRESH_TOKEN are not configured",
            ));
        };

        let response = self
            .client
            .post(format!("{}/oauth/token", self.base_url))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh.as_str()),
                ("client_secret", secret.as_str()),
            ])
            .send()
            .await?;

        let body = Self::check_status(response, "oauth token exchange").await?;
        let token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ClientError::unauthenticated("token response missing access_token"))?
            .to_string();

        *self.access_token.write().await = Some(token);

        // Confirm the session works and report account visibility.
        let accounts = self.get_customer_accounts().await?;
        let count = accounts
            .pointer("/data/items")
            .and_then(|v| v.as_array())
            .map_or(0, |items| items.len());

        tracing::info!(accounts = count, "Authenticated with Tastytrade");
        Ok(count)
    }

    /// Whether a brokerage access token is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    async fn bearer(&self) -> ClientResult<String> {
        self.access_token
            .read()
            .await
            .clone()
            .ok_or_else(|| ClientError::unauthenticated("no brokerage session"))
    }

    /// Perform a GET request against the brokerage API.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> ClientResult<serde_json::Value> {
        let token = self.bearer().await?;
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        Self::check_status(response, path).await
    }

    /// Perform a POST request with a JSON body.
    pub async fn post(&self, path: &str, body: &serde_json::Value) -> ClientResult<serde_json::Value> {
        let token = self.bearer().await?;
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::check_status(response, path).await
    }

    /// Perform a DELETE request.
    pub async fn delete(&self, path: &str) -> ClientResult<serde_json::Value> {
        let token = self.bearer().await?;
        let response = self
            .client
            .delete(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check_status(response, path).await
    }

    /// Map an HTTP response to a JSON value or a typed error.
    async fn check_status(
        response: reqwest::Response,
        resource: &str,
    ) -> ClientResult<serde_json::Value> {
        let status = response.status();

        if status.is_success() {
            if status == StatusCode::NO_CONTENT {
                return Ok(serde_json::json!({}));
            }
            let text = response.text().await?;
            if text.is_empty() {
                return Ok(serde_json::json!({}));
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        let message = response.text().await.unwrap_or_default();

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ClientError::unauthenticated("brokerage session rejected")
            }
            StatusCode::NOT_FOUND => ClientError::not_found(resource),
            StatusCode::TOO_MANY_REQUESTS => ClientError::rate_limited(retry_after),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::bad_request(message)
            }
            s if s.is_server_error() => ClientError::server(s.as_u16(), message),
            s => ClientError::UnexpectedStatus { status: s.as_u16(), message },
        })
    }

    // ── Customers & accounts ─────────────────────────────────────────────

    /// `GET /customers/me`
    pub async fn get_customer(&self) -> ClientResult<serde_json::Value> {
        self.get("/customers/me", &[]).await
    }

    /// `GET /customers/me/accounts`
    pub async fn get_customer_accounts(&self) -> ClientResult<serde_json::Value> {
        self.get("/customers/me/accounts", &[]).await
    }

    /// `GET /customers/me/accounts/{account_number}`
    pub async fn get_account(&self, account_number: &str) -> ClientResult<serde_json::Value> {
        self.get(&format!("/customers/me/accounts/{account_number}"), &[]).await
    }

    // ── Balances & positions ─────────────────────────────────────────────

    /// `GET /accounts/{account_number}/balances`
    pub async fn get_balances(&self, account_number: &str) -> ClientResult<serde_json::Value> {
        self.get(&format!("/accounts/{account_number}/balances"), &[]).await
    }

    /// `GET /accounts/{account_number}/positions`
    pub async fn get_positions(
        &self,
        account_number: &str,
        symbol: Option<&str>,
        underlying_symbol: Option<&str>,
    ) -> ClientResult<serde_json::Value> {
        let mut query = Vec::new();
        if let Some(s) = symbol {
            query.push(("symbol", s.to_string()));
        }
        if let Some(u) = underlying_symbol {
            query.push(("underlying-symbol", u.to_string()));
        }
        self.get(&format!("/accounts/{account_number}/positions"), &query).await
    }

    /// `GET /accounts/{account_number}/balance-snapshots`
    pub async fn get_balance_snapshots(
        &self,
        account_number: &str,
        time_of_day: Option<&str>,
    ) -> ClientResult<serde_json::Value> {
        let mut query = Vec::new();
        if let Some(tod) = time_of_day {
            query.push(("time-of-day", tod.to_string()));
        }
        self.get(&format!("/accounts/{account_number}/balance-snapshots"), &query).await
    }

    // ── Orders ───────────────────────────────────────────────────────────

    /// `GET /accounts/{account_number}/orders`
    pub async fn get_orders(
        &self,
        account_number: &str,
        status: Option<&str>,
    ) -> ClientResult<serde_json::Value> {
        let mut query = Vec::new();
        if let Some(s) = status {
            query.push(("status", s.to_string()));
        }
        self.get(&format!("/accounts/{account_number}/orders"), &query).await
    }

    /// `GET /accounts/{account_number}/orders/live`
    pub async fn get_live_orders(&self, account_number: &str) -> ClientResult<serde_json::Value> {
        self.get(&format!("/accounts/{account_number}/orders/live"), &[]).await
    }

    /// `GET /accounts/{account_number}/orders/{order_id}`
    pub async fn get_order(
        &self,
        account_number: &str,
        order_id: &str,
    ) -> ClientResult<serde_json::Value> {
        self.get(&format!("/accounts/{account_number}/orders/{order_id}"), &[]).await
    }

    /// `DELETE /accounts/{account_number}/orders/{order_id}`
    pub async fn cancel_order(
        &self,
        account_number: &str,
        order_id: &str,
    ) -> ClientResult<serde_json::Value> {
        self.delete(&format!("/accounts/{account_number}/orders/{order_id}")).await
    }

    // ── Instruments & market data ────────────────────────────────────────

    /// `GET /instruments/equities/{symbol}`
    pub async fn get_equity(&self, symbol: &str) -> ClientResult<serde_json::Value> {
        self.get(&format!("/instruments/equities/{symbol}"), &[]).await
    }

    /// `GET /option-chains/{symbol}/nested`
    pub async fn get_option_chain(&self, symbol: &str) -> ClientResult<serde_json::Value> {
        self.get(&format!("/option-chains/{symbol}/nested"), &[]).await
    }

    /// `GET /instruments/futures`
    pub async fn get_futures(&self, product_code: Option<&str>) -> ClientResult<serde_json::Value> {
        let mut query = Vec::new();
        if let Some(code) = product_code {
            query.push(("product-code[]", code.to_string()));
        }
        self.get("/instruments/futures", &query).await
    }

    /// `GET /market-data/by-type` with an equity symbol list.
    pub async fn get_market_data(&self, symbols: &[String]) -> ClientResult<serde_json::Value> {
        let query = vec![("equity", symbols.join(","))];
        self.get("/market-data/by-type", &query).await
    }

    // ── Transactions ─────────────────────────────────────────────────────

    /// `GET /accounts/{account_number}/transactions`
    pub async fn get_transactions(
        &self,
        account_number: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ClientResult<serde_json::Value> {
        let mut query = Vec::new();
        if let Some(start) = start_date {
            query.push(("start-date", start.to_string()));
        }
        if let Some(end) = end_date {
            query.push(("end-date", end.to_string()));
        }
        self.get(&format!("/accounts/{account_number}/transactions"), &query).await
    }

    /// `GET /accounts/{account_number}/transactions/{id}`
    pub async fn get_transaction(
        &self,
        account_number: &str,
        transaction_id: &str,
    ) -> ClientResult<serde_json::Value> {
        self.get(&format!("/accounts/{account_number}/transactions/{transaction_id}"), &[]).await
    }

    // ── Watchlists ───────────────────────────────────────────────────────

    /// `GET /watchlists`
    pub async fn get_watchlists(&self) -> ClientResult<serde_json::Value> {
        self.get("/watchlists", &[]).await
    }

    /// `POST /watchlists`
    pub async fn create_watchlist(&self, body: &serde_json::Value) -> ClientResult<serde_json::Value> {
        self.post("/watchlists", body).await
    }

    /// `DELETE /watchlists/{name}`
    pub async fn delete_watchlist(&self, name: &str) -> ClientResult<serde_json::Value> {
        self.delete(&format!("/watchlists/{name}")).await
    }
}

impl std::fmt::Debug for TastytradeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TastytradeClient").field("base_url", &self.base_url).finish()
    }
}
