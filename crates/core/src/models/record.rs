use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    /// Shares bought
    Buy,
    /// Shares sold
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "Buy"),
            TradeSide::Sell => write!(f, "Sell"),
        }
    }
}

/// A position held in a brokerage account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Unique identifier of the holding row
    pub id: String,

    /// Stock the position is in
    pub stock_id: String,

    /// Number of shares held (non-negative)
    pub quantity: f64,

    /// Average cost paid per share
    pub average_cost_basis: f64,

    /// Total cost paid for the position
    pub total_cost_basis: f64,
}

/// An entry on the user's watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// Unique identifier of the watchlist row
    pub id: String,

    /// Stock being watched
    pub stock_id: String,

    /// Ticker symbol, when the backend already attached one
    #[serde(default)]
    pub symbol_hint: Option<String>,
}

/// A single executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier of the transaction
    pub id: String,

    /// Stock that was traded
    pub stock_id: String,

    /// Account the trade was executed in
    pub account_id: String,

    /// Number of shares traded (always positive)
    pub share_quantity: f64,

    /// Execution price per share
    pub price_per_share: f64,

    /// Buy or Sell
    pub side: TradeSide,

    /// Execution timestamp (backend local time, no zone)
    pub executed_at: NaiveDateTime,
}

/// A thin record as returned by the backend list endpoints, before
/// enrichment with stock metadata and quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimaryRecord {
    Holding(Holding),
    Watchlist(WatchlistEntry),
    Transaction(Transaction),
}

impl PrimaryRecord {
    /// Unique identifier within its collection.
    pub fn id(&self) -> &str {
        match self {
            PrimaryRecord::Holding(h) => &h.id,
            PrimaryRecord::Watchlist(w) => &w.id,
            PrimaryRecord::Transaction(t) => &t.id,
        }
    }

    /// Stock id used for metadata lookups.
    pub fn stock_id(&self) -> &str {
        match self {
            PrimaryRecord::Holding(h) => &h.stock_id,
            PrimaryRecord::Watchlist(w) => &w.stock_id,
            PrimaryRecord::Transaction(t) => &t.stock_id,
        }
    }

    /// Symbol the backend already attached to the record, if any.
    pub fn symbol_hint(&self) -> Option<&str> {
        match self {
            PrimaryRecord::Watchlist(w) => w.symbol_hint.as_deref(),
            _ => None,
        }
    }

    /// Price stored on the record itself, used when no live quote is
    /// available. Watchlist entries carry no price of their own.
    pub fn stored_price(&self) -> Option<f64> {
        match self {
            PrimaryRecord::Holding(h) => Some(h.average_cost_basis),
            PrimaryRecord::Transaction(t) => Some(t.price_per_share),
            PrimaryRecord::Watchlist(_) => None,
        }
    }

    /// Execution timestamp, for transaction records.
    pub fn executed_at(&self) -> Option<NaiveDateTime> {
        match self {
            PrimaryRecord::Transaction(t) => Some(t.executed_at),
            _ => None,
        }
    }

    /// Trade side, for transaction records.
    pub fn side(&self) -> Option<TradeSide> {
        match self {
            PrimaryRecord::Transaction(t) => Some(t.side),
            _ => None,
        }
    }
}
