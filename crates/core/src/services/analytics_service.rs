use crate::models::analytics::{DerivedFields, TransactionTotals};
use crate::models::enriched::EnrichedRecord;
use crate::models::record::{PrimaryRecord, TradeSide};

/// Computes per-record derived fields and collection aggregates.
///
/// Pure arithmetic over already-joined data: no I/O, no shared state.
/// A zero baseline yields a 0.0 percentage, never NaN or infinity.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    /// Derive change, percentage change and total value for one record.
    ///
    /// The change baseline is the average cost basis for holdings and
    /// the previous close otherwise. Total value marks holdings to
    /// market, keeps the historical trade amount for transactions, and
    /// is 0.0 for watchlist entries (nothing is held).
    pub fn derive(
        &self,
        record: &PrimaryRecord,
        current_price: f64,
        previous_close: f64,
    ) -> DerivedFields {
        let (baseline, total_value) = match record {
            PrimaryRecord::Holding(h) => (h.average_cost_basis, h.quantity * current_price),
            PrimaryRecord::Watchlist(_) => (previous_close, 0.0),
            PrimaryRecord::Transaction(t) => {
                (previous_close, t.share_quantity * t.price_per_share)
            }
        };
        let change = current_price - baseline;
        let change_percent = if baseline != 0.0 {
            (change / baseline) * 100.0
        } else {
            0.0
        };
        DerivedFields {
            change,
            change_percent,
            total_value,
        }
    }

    /// Mean percentage change across a collection (0.0 when empty).
    pub fn average_change_percent(&self, records: &[EnrichedRecord]) -> f64 {
        if records.is_empty() {
            return 0.0;
        }
        let sum: f64 = records.iter().map(|r| r.derived.change_percent).sum();
        sum / records.len() as f64
    }

    /// Buy/sell totals over the transaction records in a collection.
    /// Records of other kinds are ignored.
    pub fn transaction_totals(&self, records: &[EnrichedRecord]) -> TransactionTotals {
        let mut totals = TransactionTotals {
            total_bought: 0.0,
            total_sold: 0.0,
            net_amount: 0.0,
            count: 0,
        };
        for record in records {
            if let PrimaryRecord::Transaction(t) = &record.record {
                let amount = t.share_quantity * t.price_per_share;
                match t.side {
                    TradeSide::Buy => totals.total_bought += amount,
                    TradeSide::Sell => totals.total_sold += amount,
                }
                totals.count += 1;
            }
        }
        totals.net_amount = totals.total_sold - totals.total_bought;
        totals
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
