use serde::{Deserialize, Serialize};

/// Computed per-record fields, derived locally after the join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    /// Absolute change: current price minus the record's baseline
    /// (average cost basis for holdings, previous close otherwise)
    pub change: f64,

    /// Percentage change: (change / baseline) * 100, 0.0 when the
    /// baseline is zero
    pub change_percent: f64,

    /// Monetary size of the record: quantity × current price for
    /// holdings, the historical trade amount for transactions, 0.0 for
    /// watchlist entries
    pub total_value: f64,
}

/// Buy/sell totals over a set of transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionTotals {
    /// Sum of buy amounts (share_quantity × price_per_share)
    pub total_bought: f64,

    /// Sum of sell amounts
    pub total_sold: f64,

    /// total_sold - total_bought
    pub net_amount: f64,

    /// Number of transaction records counted
    pub count: usize,
}
