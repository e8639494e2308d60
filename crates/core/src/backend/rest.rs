use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::BrokerageBackend;
use crate::errors::CoreError;
use crate::models::record::{Holding, TradeSide, Transaction, WatchlistEntry};
use crate::models::stock::{Quote, StockMetadata};

/// REST implementation of [`BrokerageBackend`] against the Pegasus API.
///
/// - **Auth**: watchlist endpoints require a bearer token; when one is
///   configured it is attached to every request.
/// - **Endpoints**: `/api/holdings`, `/api/transactions`, `/api/watchlist`,
///   `/api/stocks`
/// - **Errors**: non-2xx responses carry a JSON body whose `message`
///   field is surfaced through [`CoreError::Api`].
pub struct RestBackend {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, bearer_token: Option<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        let base_url = base_url.into();
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(format!("{}{path}", self.base_url)))
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.delete(format!("{}{path}", self.base_url)))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// Turn a non-2xx response into a `CoreError::Api`, extracting the
/// backend's JSON error body (`{"timestamp", "error", "message"}`)
/// when one is present.
async fn error_for(operation: &str, resp: reqwest::Response) -> CoreError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| format!("HTTP {status}"));
    CoreError::Api {
        operation: operation.to_string(),
        message,
    }
}

// ── Pegasus API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct HoldingResponse {
    #[serde(rename = "holdingId")]
    holding_id: String,
    #[serde(rename = "stockId")]
    stock_id: String,
    quantity: f64,
    #[serde(rename = "averageCostBasis")]
    average_cost_basis: f64,
    #[serde(rename = "totalCostBasis")]
    total_cost_basis: f64,
}

#[derive(Deserialize)]
struct TransactionResponse {
    #[serde(rename = "transactionId")]
    transaction_id: String,
    #[serde(rename = "stockId")]
    stock_id: String,
    #[serde(rename = "accountId")]
    account_id: String,
    #[serde(rename = "shareQuantity")]
    share_quantity: f64,
    #[serde(rename = "pricePerShare")]
    price_per_share: f64,
    #[serde(rename = "transactionType")]
    transaction_type: TradeSide,
    #[serde(rename = "transactionDate")]
    transaction_date: chrono::NaiveDateTime,
}

#[derive(Deserialize)]
struct WatchlistItemResponse {
    #[serde(rename = "watchlistId")]
    watchlist_id: String,
    #[serde(rename = "stockId")]
    stock_id: String,
    #[serde(rename = "stockSymbol")]
    stock_symbol: Option<String>,
}

#[derive(Deserialize)]
struct StockResponse {
    #[serde(rename = "stockId")]
    stock_id: String,
    #[serde(rename = "stockCode")]
    stock_code: String,
    #[serde(rename = "companyName")]
    company_name: String,
    sector: Option<String>,
}

#[derive(Deserialize)]
struct QuoteResponse {
    #[serde(rename = "currentPrice")]
    current_price: f64,
    #[serde(rename = "previousClosePrice")]
    previous_close_price: f64,
    #[serde(rename = "highPrice")]
    high_price: f64,
    #[serde(rename = "lowPrice")]
    low_price: f64,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl BrokerageBackend for RestBackend {
    async fn list_holdings(&self, account_id: &str) -> Result<Vec<Holding>, CoreError> {
        let resp = self
            .get(&format!("/api/holdings/account/{account_id}"))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_for("list_holdings", resp).await);
        }
        let rows: Vec<HoldingResponse> = resp.json().await.map_err(|e| CoreError::Api {
            operation: "list_holdings".into(),
            message: format!("Failed to parse holdings: {e}"),
        })?;
        Ok(rows
            .into_iter()
            .map(|r| Holding {
                id: r.holding_id,
                stock_id: r.stock_id,
                quantity: r.quantity,
                average_cost_basis: r.average_cost_basis,
                total_cost_basis: r.total_cost_basis,
            })
            .collect())
    }

    async fn list_transactions(&self, account_id: &str) -> Result<Vec<Transaction>, CoreError> {
        let resp = self
            .get(&format!("/api/transactions/account/{account_id}"))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_for("list_transactions", resp).await);
        }
        let rows: Vec<TransactionResponse> = resp.json().await.map_err(|e| CoreError::Api {
            operation: "list_transactions".into(),
            message: format!("Failed to parse transactions: {e}"),
        })?;
        Ok(rows
            .into_iter()
            .map(|r| Transaction {
                id: r.transaction_id,
                stock_id: r.stock_id,
                account_id: r.account_id,
                share_quantity: r.share_quantity,
                price_per_share: r.price_per_share,
                side: r.transaction_type,
                executed_at: r.transaction_date,
            })
            .collect())
    }

    async fn list_watchlist(&self) -> Result<Vec<WatchlistEntry>, CoreError> {
        let resp = self.get("/api/watchlist").send().await?;
        if !resp.status().is_success() {
            return Err(error_for("list_watchlist", resp).await);
        }
        let rows: Vec<WatchlistItemResponse> = resp.json().await.map_err(|e| CoreError::Api {
            operation: "list_watchlist".into(),
            message: format!("Failed to parse watchlist: {e}"),
        })?;
        Ok(rows
            .into_iter()
            .map(|r| WatchlistEntry {
                id: r.watchlist_id,
                stock_id: r.stock_id,
                symbol_hint: r.stock_symbol,
            })
            .collect())
    }

    async fn remove_watchlist_entry(&self, stock_id: &str) -> Result<(), CoreError> {
        let resp = self
            .delete(&format!("/api/watchlist/{stock_id}"))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_for("remove_watchlist_entry", resp).await);
        }
        Ok(())
    }

    async fn get_stock(&self, stock_id: &str) -> Result<StockMetadata, CoreError> {
        let resp = self.get(&format!("/api/stocks/{stock_id}")).send().await?;
        if !resp.status().is_success() {
            return Err(error_for("get_stock", resp).await);
        }
        let raw: StockResponse = resp.json().await.map_err(|e| CoreError::Api {
            operation: "get_stock".into(),
            message: format!("Failed to parse stock {stock_id}: {e}"),
        })?;
        Ok(StockMetadata {
            stock_id: raw.stock_id,
            symbol: raw.stock_code,
            company_name: raw.company_name,
            sector: raw.sector,
        })
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError> {
        let resp = self
            .get(&format!("/api/stocks/quote/{symbol}"))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_for("get_quote", resp).await);
        }
        let raw: QuoteResponse = resp.json().await.map_err(|e| CoreError::Api {
            operation: "get_quote".into(),
            message: format!("Failed to parse quote for {symbol}: {e}"),
        })?;
        Ok(Quote {
            symbol: symbol.to_string(),
            current_price: raw.current_price,
            previous_close: raw.previous_close_price,
            day_high: raw.high_price,
            day_low: raw.low_price,
        })
    }
}
