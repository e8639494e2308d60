use serde::{Deserialize, Serialize};

use super::analytics::DerivedFields;
use super::record::PrimaryRecord;

/// A primary record joined with its resolved (or fallback) display and
/// price fields, plus locally derived metrics.
///
/// Enriched records are rebuilt from scratch on every refresh; they are
/// never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    /// The underlying backend record
    pub record: PrimaryRecord,

    /// Resolved ticker symbol, or a fallback derived from the stock id
    pub symbol: String,

    /// Resolved company name, or a "Stock <id>" fallback
    pub company_name: String,

    /// Sector classification, or the fallback sector
    pub sector: String,

    /// Latest price, or the record's own stored price when no quote
    /// could be fetched
    pub current_price: f64,

    /// Previous session close; equals current_price when no quote could
    /// be fetched, so the derived change is zero
    pub previous_close: f64,

    /// Session high
    pub day_high: f64,

    /// Session low
    pub day_low: f64,

    /// Locally computed metrics
    pub derived: DerivedFields,
}

impl EnrichedRecord {
    /// Unique identifier within the collection.
    pub fn id(&self) -> &str {
        self.record.id()
    }

    /// Stock id of the underlying record.
    pub fn stock_id(&self) -> &str {
        self.record.stock_id()
    }
}
