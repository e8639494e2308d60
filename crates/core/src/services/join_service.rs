use futures::future::join_all;

use crate::models::enriched::EnrichedRecord;
use crate::models::record::PrimaryRecord;
use crate::services::analytics_service::AnalyticsService;
use crate::services::lookup_service::{Lookup, LookupService};

/// Sector shown when the backend has no classification for a stock.
pub const FALLBACK_SECTOR: &str = "Unknown";

/// Number of stock-id characters used in fallback symbols and names.
const ID_PREFIX_LEN: usize = 8;

/// Joins primary records with stock metadata and quotes, falling back
/// per record when a lookup is unavailable.
///
/// The fan-out is concurrent across records and strictly
/// order-preserving: the output has exactly one enriched record per
/// input record, in input order, regardless of which lookups fail.
pub struct JoinService {
    analytics: AnalyticsService,
}

impl JoinService {
    pub fn new() -> Self {
        Self {
            analytics: AnalyticsService::new(),
        }
    }

    /// Enrich a whole batch. Completes only when every record has been
    /// resolved (or fallen back); a slow lookup delays the batch rather
    /// than dropping its record.
    pub async fn enrich_all(
        &self,
        lookups: &LookupService,
        records: Vec<PrimaryRecord>,
    ) -> Vec<EnrichedRecord> {
        join_all(
            records
                .into_iter()
                .map(|record| self.enrich_one(lookups, record)),
        )
        .await
    }

    /// Enrich one record: metadata by stock id, then (only when the
    /// metadata resolved) a quote by the resolved symbol.
    async fn enrich_one(&self, lookups: &LookupService, record: PrimaryRecord) -> EnrichedRecord {
        let id_prefix: String = record.stock_id().chars().take(ID_PREFIX_LEN).collect();

        // Fallback display values first; lookups overwrite what they resolve.
        let mut symbol = record
            .symbol_hint()
            .map(str::to_string)
            .unwrap_or_else(|| id_prefix.clone());
        let mut company_name = format!("Stock {id_prefix}");
        let mut sector = FALLBACK_SECTOR.to_string();

        let mut quote = None;
        if let Lookup::Found(meta) = lookups.metadata(record.stock_id()).await {
            symbol = meta.symbol;
            company_name = meta.company_name;
            if let Some(known) = meta.sector {
                sector = known;
            }
            quote = lookups.quote(&symbol).await.found();
        }

        let (current_price, previous_close, day_high, day_low) = match &quote {
            Some(q) => (q.current_price, q.previous_close, q.day_high, q.day_low),
            None => {
                // No quote: fall back to the price the record itself
                // carries, with a zero change.
                let price = record.stored_price().unwrap_or(0.0);
                (price, price, price, price)
            }
        };

        let derived = self.analytics.derive(&record, current_price, previous_close);

        EnrichedRecord {
            record,
            symbol,
            company_name,
            sector,
            current_price,
            previous_close,
            day_high,
            day_low,
            derived,
        }
    }
}

impl Default for JoinService {
    fn default() -> Self {
        Self::new()
    }
}
