use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::record::{Holding, Transaction, WatchlistEntry};
use crate::models::stock::{Quote, StockMetadata};

/// Trait abstraction over the brokerage backend (SOLID: Dependency Inversion).
///
/// The production implementation talks REST to the Pegasus API; tests
/// substitute in-memory fakes. Swapping transports touches only the
/// implementation, not the aggregation core.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait BrokerageBackend: Send + Sync {
    /// All holdings in the given account.
    async fn list_holdings(&self, account_id: &str) -> Result<Vec<Holding>, CoreError>;

    /// All transactions executed in the given account.
    async fn list_transactions(&self, account_id: &str) -> Result<Vec<Transaction>, CoreError>;

    /// The authenticated user's watchlist.
    async fn list_watchlist(&self) -> Result<Vec<WatchlistEntry>, CoreError>;

    /// Remove the watchlist entry for a stock. Requires authentication.
    async fn remove_watchlist_entry(&self, stock_id: &str) -> Result<(), CoreError>;

    /// Descriptive metadata for a stock, by id.
    async fn get_stock(&self, stock_id: &str) -> Result<StockMetadata, CoreError>;

    /// Live quote for a symbol. Best-effort: the quote feed degrades
    /// independently of stock metadata.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError>;
}
