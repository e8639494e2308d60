use serde::{Deserialize, Serialize};

/// Descriptive metadata for a stock, resolved by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMetadata {
    /// Backend identifier of the stock
    pub stock_id: String,

    /// Ticker symbol (e.g. "MSFT")
    pub symbol: String,

    /// Full company name
    pub company_name: String,

    /// Sector classification, when the backend knows it
    #[serde(default)]
    pub sector: Option<String>,
}

/// A live market quote, resolved by symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker symbol the quote is for
    pub symbol: String,

    /// Latest traded price
    pub current_price: f64,

    /// Previous session's closing price
    pub previous_close: f64,

    /// Highest price of the current session
    pub day_high: f64,

    /// Lowest price of the current session
    pub day_low: f64,
}
