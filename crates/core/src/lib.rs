pub mod backend;
pub mod errors;
pub mod models;
pub mod services;

use backend::traits::BrokerageBackend;
use models::{
    analytics::TransactionTotals,
    enriched::EnrichedRecord,
    record::PrimaryRecord,
    view::{RecordFilter, SortField, ViewOptions},
};
use services::{
    analytics_service::AnalyticsService, join_service::JoinService,
    lookup_service::LookupService, mutation_service::MutationService,
    view_service::ViewService,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use errors::CoreError;

/// The backend view a session aggregates records for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Positions held in one account
    Holdings { account_id: String },
    /// Trade history of one account
    Transactions { account_id: String },
    /// The authenticated user's watchlist
    Watchlist,
}

impl Screen {
    /// Short name used in errors and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Screen::Holdings { .. } => "holdings",
            Screen::Transactions { .. } => "transactions",
            Screen::Watchlist => "watchlist",
        }
    }
}

/// How a refresh ended: its batch either became the current collection
/// or lost the race to a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The batch was committed as the new collection
    Committed,
    /// A newer refresh started while this one ran; its result was
    /// discarded
    Superseded,
}

/// Mutable session state: the reconciled collection plus its
/// presentation settings. Lives behind the session lock.
struct ScreenState {
    records: Vec<EnrichedRecord>,
    options: ViewOptions,
}

/// Main entry point: one aggregation session per screen visit.
///
/// Owns the lookup caches, the reconciled collection and the view
/// settings for a single screen. Every method takes `&self`; state
/// lives behind a lock that is never held across an await, so
/// overlapping refreshes and mutations from concurrent tasks interleave
/// safely.
#[must_use]
pub struct ScreenSession {
    backend: Arc<dyn BrokerageBackend>,
    screen: Screen,
    lookups: LookupService,
    joiner: JoinService,
    analytics: AnalyticsService,
    viewer: ViewService,
    mutations: MutationService,
    state: Mutex<ScreenState>,
    /// Monotonic refresh sequence; a batch commits only while it is
    /// still the newest one.
    batch_counter: AtomicU64,
}

impl std::fmt::Debug for ScreenSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("ScreenSession")
            .field("screen", &self.screen.label())
            .field("records", &state.records.len())
            .field("options", &state.options)
            .field("in_flight_mutations", &self.mutations.in_flight_count())
            .finish()
    }
}

impl ScreenSession {
    /// Create a session for one screen. Nothing is fetched until the
    /// first [`refresh`](Self::refresh).
    pub fn new(backend: Arc<dyn BrokerageBackend>, screen: Screen) -> Self {
        Self {
            lookups: LookupService::new(Arc::clone(&backend)),
            backend,
            screen,
            joiner: JoinService::new(),
            analytics: AnalyticsService::new(),
            viewer: ViewService::new(),
            mutations: MutationService::new(),
            state: Mutex::new(ScreenState {
                records: Vec::new(),
                options: ViewOptions::default(),
            }),
            batch_counter: AtomicU64::new(0),
        }
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Re-fetch the primary list, re-join it against metadata and
    /// quotes, and commit the result as the new collection.
    ///
    /// Each call starts a new batch. If another refresh starts before
    /// this one commits, the older batch is discarded and reported as
    /// [`RefreshOutcome::Superseded`]. Unavailable lookup markers are
    /// evicted first so this batch retries them.
    pub async fn refresh(&self) -> Result<RefreshOutcome, CoreError> {
        let seq = self.batch_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.lookups.evict_unavailable();

        let records = match self.fetch_primary().await {
            Ok(records) => records,
            Err(err) => {
                if self.batch_counter.load(Ordering::SeqCst) != seq {
                    // A newer batch owns the screen now; its outcome is
                    // the one that matters.
                    log::debug!(
                        "Discarding failed stale {} batch {seq}: {err}",
                        self.screen.label()
                    );
                    return Ok(RefreshOutcome::Superseded);
                }
                log::error!("Primary fetch for {} failed: {err}", self.screen.label());
                return Err(CoreError::PrimaryFetch {
                    view: self.screen.label(),
                    message: err.to_string(),
                });
            }
        };

        let enriched = self.joiner.enrich_all(&self.lookups, records).await;

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if self.batch_counter.load(Ordering::SeqCst) != seq {
            log::debug!("Discarding stale {} batch {seq}", self.screen.label());
            return Ok(RefreshOutcome::Superseded);
        }
        state.records = enriched;
        Ok(RefreshOutcome::Committed)
    }

    /// Fetch the thin primary records for this session's screen.
    async fn fetch_primary(&self) -> Result<Vec<PrimaryRecord>, CoreError> {
        let records = match &self.screen {
            Screen::Holdings { account_id } => self
                .backend
                .list_holdings(account_id)
                .await?
                .into_iter()
                .map(PrimaryRecord::Holding)
                .collect(),
            Screen::Transactions { account_id } => self
                .backend
                .list_transactions(account_id)
                .await?
                .into_iter()
                .map(PrimaryRecord::Transaction)
                .collect(),
            Screen::Watchlist => self
                .backend
                .list_watchlist()
                .await?
                .into_iter()
                .map(PrimaryRecord::Watchlist)
                .collect(),
        };
        Ok(records)
    }

    // ── Records & Views ─────────────────────────────────────────────

    /// The reconciled collection, in backend order.
    #[must_use]
    pub fn records(&self) -> Vec<EnrichedRecord> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.records.clone()
    }

    /// Number of records in the reconciled collection.
    #[must_use]
    pub fn record_count(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.records.len()
    }

    /// The collection as currently presented: filtered, then sorted.
    #[must_use]
    pub fn view(&self) -> Vec<EnrichedRecord> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.viewer.apply(&state.records, &state.options)
    }

    /// Current sort field, direction and filter.
    #[must_use]
    pub fn view_options(&self) -> ViewOptions {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.options.clone()
    }

    /// Select a sort field: re-selecting the current field flips the
    /// direction, a new field starts ascending.
    pub fn toggle_sort(&self, field: SortField) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.options.toggle_sort(field);
    }

    /// Replace the record filter.
    pub fn set_filter(&self, filter: RecordFilter) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.options.filter = filter;
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Optimistically remove a stock from the watchlist.
    ///
    /// Matching records disappear from the collection immediately; if
    /// the server then rejects the removal, the exact prior collection
    /// is restored and [`CoreError::MutationRemote`] is returned. A
    /// second removal for the same id while one is in flight is
    /// rejected with [`CoreError::MutationInProgress`].
    pub async fn remove_watchlist_entry(&self, stock_id: &str) -> Result<(), CoreError> {
        let applied = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            self.mutations.apply_removal(&mut state.records, stock_id)?
        };

        match self.backend.remove_watchlist_entry(stock_id).await {
            Ok(()) => {
                self.mutations.confirm(applied);
                Ok(())
            }
            Err(err) => {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                self.mutations.roll_back(applied, &mut state.records);
                Err(CoreError::MutationRemote {
                    target_id: stock_id.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }

    // ── Aggregates ──────────────────────────────────────────────────

    /// Mean percentage change across the whole reconciled collection
    /// (not the filtered view). 0.0 when empty.
    #[must_use]
    pub fn average_change_percent(&self) -> f64 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.analytics.average_change_percent(&state.records)
    }

    /// Buy/sell totals over the records in the current view, matching
    /// what the user is looking at.
    #[must_use]
    pub fn transaction_totals(&self) -> TransactionTotals {
        let view = self.view();
        self.analytics.transaction_totals(&view)
    }

    // ── Cache Inspection ────────────────────────────────────────────

    /// Number of cached metadata entries (resolved or in flight).
    #[must_use]
    pub fn metadata_cache_entries(&self) -> usize {
        self.lookups.metadata_entries()
    }

    /// Number of cached quote entries (resolved or in flight).
    #[must_use]
    pub fn quote_cache_entries(&self) -> usize {
        self.lookups.quote_entries()
    }

    /// The screen this session aggregates for.
    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }
}
