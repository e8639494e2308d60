// ═══════════════════════════════════════════════════════════════════
// Mutation Tests — MutationService state machine, optimistic removal
// through the ScreenSession facade
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use pegasus_client_core::backend::traits::BrokerageBackend;
use pegasus_client_core::errors::CoreError;
use pegasus_client_core::models::enriched::EnrichedRecord;
use pegasus_client_core::models::record::{
    Holding, PrimaryRecord, Transaction, WatchlistEntry,
};
use pegasus_client_core::models::stock::{Quote, StockMetadata};
use pegasus_client_core::services::analytics_service::AnalyticsService;
use pegasus_client_core::services::mutation_service::MutationService;
use pegasus_client_core::{Screen, ScreenSession};

fn wl(id: &str, stock_id: &str) -> WatchlistEntry {
    WatchlistEntry {
        id: id.into(),
        stock_id: stock_id.into(),
        symbol_hint: None,
    }
}

fn entry(id: &str, stock_id: &str, symbol: &str) -> EnrichedRecord {
    let record = PrimaryRecord::Watchlist(wl(id, stock_id));
    let derived = AnalyticsService::new().derive(&record, 100.0, 100.0);
    EnrichedRecord {
        record,
        symbol: symbol.into(),
        company_name: format!("{symbol} Corp"),
        sector: "Technology".into(),
        current_price: 100.0,
        previous_close: 100.0,
        day_high: 100.0,
        day_low: 100.0,
        derived,
    }
}

fn collection() -> Vec<EnrichedRecord> {
    vec![
        entry("w1", "s1", "AAA"),
        entry("w2", "s2", "BBB"),
        entry("w3", "s3", "CCC"),
    ]
}

// ═══════════════════════════════════════════════════════════════════
// Mock Backend (watchlist removal only)
// ═══════════════════════════════════════════════════════════════════

/// Watchlist backend whose removals can fail or wait on a gate.
/// Lookups always fail, so sessions enrich with fallbacks; the values
/// are irrelevant here, only collection membership is.
struct RemovalBackend {
    watchlist: Vec<WatchlistEntry>,
    fail_removals: bool,
    removal_calls: AtomicUsize,
    /// Consumed in call order: the n-th removal awaits the n-th gate.
    gates: Mutex<Vec<oneshot::Receiver<()>>>,
}

impl RemovalBackend {
    fn new(fail_removals: bool) -> Self {
        Self {
            watchlist: vec![wl("w1", "s1"), wl("w2", "s2"), wl("w3", "s3")],
            fail_removals,
            removal_calls: AtomicUsize::new(0),
            gates: Mutex::new(Vec::new()),
        }
    }

    fn gated(fail_removals: bool, gates: Vec<oneshot::Receiver<()>>) -> Self {
        let mut backend = Self::new(fail_removals);
        backend.gates = Mutex::new(gates);
        backend
    }
}

#[async_trait]
impl BrokerageBackend for RemovalBackend {
    async fn list_holdings(&self, _account_id: &str) -> Result<Vec<Holding>, CoreError> {
        Ok(Vec::new())
    }

    async fn list_transactions(&self, _account_id: &str) -> Result<Vec<Transaction>, CoreError> {
        Ok(Vec::new())
    }

    async fn list_watchlist(&self) -> Result<Vec<WatchlistEntry>, CoreError> {
        Ok(self.watchlist.clone())
    }

    async fn remove_watchlist_entry(&self, stock_id: &str) -> Result<(), CoreError> {
        self.removal_calls.fetch_add(1, Ordering::SeqCst);
        let gate = {
            let mut gates = self.gates.lock().unwrap();
            if gates.is_empty() {
                None
            } else {
                Some(gates.remove(0))
            }
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_removals {
            return Err(CoreError::Api {
                operation: "remove_watchlist_entry".into(),
                message: format!("Simulated rejection for {stock_id}"),
            });
        }
        Ok(())
    }

    async fn get_stock(&self, stock_id: &str) -> Result<StockMetadata, CoreError> {
        Err(CoreError::Api {
            operation: "get_stock".into(),
            message: format!("No stock {stock_id}"),
        })
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError> {
        Err(CoreError::Api {
            operation: "get_quote".into(),
            message: format!("No quote for {symbol}"),
        })
    }
}

async fn refreshed_session(backend: Arc<RemovalBackend>) -> Arc<ScreenSession> {
    let session = Arc::new(ScreenSession::new(backend, Screen::Watchlist));
    session.refresh().await.unwrap();
    session
}

// ═══════════════════════════════════════════════════════════════════
// MutationService — state machine
// ═══════════════════════════════════════════════════════════════════

mod state_machine {
    use super::*;

    #[test]
    fn apply_removes_matching_records() {
        let svc = MutationService::new();
        let mut records = collection();

        let applied = svc.apply_removal(&mut records, "s2").unwrap();

        assert_eq!(applied.target_id(), "s2");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.stock_id() != "s2"));
        assert_eq!(svc.in_flight_count(), 1);
    }

    #[test]
    fn apply_removes_every_record_for_the_target() {
        let svc = MutationService::new();
        let mut records = vec![
            entry("w1", "s1", "AAA"),
            entry("w2", "s1", "AAA"),
            entry("w3", "s2", "BBB"),
        ];

        svc.apply_removal(&mut records, "s1").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "w3");
    }

    #[test]
    fn confirm_keeps_the_mutated_state() {
        let svc = MutationService::new();
        let mut records = collection();

        let applied = svc.apply_removal(&mut records, "s1").unwrap();
        svc.confirm(applied);

        assert_eq!(records.len(), 2);
        assert_eq!(svc.in_flight_count(), 0);
    }

    #[test]
    fn rollback_restores_exact_prior_state() {
        let svc = MutationService::new();
        let mut records = collection();
        let before = records.clone();

        let applied = svc.apply_removal(&mut records, "s2").unwrap();
        assert_ne!(records, before);

        svc.roll_back(applied, &mut records);

        assert_eq!(records, before);
        assert_eq!(svc.in_flight_count(), 0);
    }

    #[test]
    fn same_id_rejected_while_unsettled() {
        let svc = MutationService::new();
        let mut records = collection();

        let _applied = svc.apply_removal(&mut records, "s1").unwrap();
        let len_after_first = records.len();

        let err = svc.apply_removal(&mut records, "s1").unwrap_err();
        match err {
            CoreError::MutationInProgress { target_id } => assert_eq!(target_id, "s1"),
            other => panic!("Expected MutationInProgress, got {other:?}"),
        }
        // The rejected call must not touch the collection
        assert_eq!(records.len(), len_after_first);
    }

    #[test]
    fn same_id_allowed_after_confirm() {
        let svc = MutationService::new();
        let mut records = collection();

        let applied = svc.apply_removal(&mut records, "s1").unwrap();
        svc.confirm(applied);

        let mut records = collection();
        assert!(svc.apply_removal(&mut records, "s1").is_ok());
    }

    #[test]
    fn same_id_allowed_after_rollback() {
        let svc = MutationService::new();
        let mut records = collection();

        let applied = svc.apply_removal(&mut records, "s1").unwrap();
        svc.roll_back(applied, &mut records);

        assert!(svc.apply_removal(&mut records, "s1").is_ok());
    }

    #[test]
    fn distinct_ids_have_independent_snapshots() {
        let svc = MutationService::new();
        let mut records = collection();

        let applied_one = svc.apply_removal(&mut records, "s1").unwrap();
        let state_without_s1 = records.clone();
        let applied_two = svc.apply_removal(&mut records, "s2").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(svc.in_flight_count(), 2);

        // Rolling back the second restores only its own capture
        svc.roll_back(applied_two, &mut records);
        assert_eq!(records, state_without_s1);

        svc.confirm(applied_one);
        assert_eq!(svc.in_flight_count(), 0);
    }

    #[test]
    fn default_trait() {
        let svc = MutationService::default();
        assert_eq!(svc.in_flight_count(), 0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// ScreenSession — optimistic removal end to end
// ═══════════════════════════════════════════════════════════════════

mod session {
    use super::*;

    #[tokio::test]
    async fn removal_confirms_and_keeps_state() {
        let backend = Arc::new(RemovalBackend::new(false));
        let session = refreshed_session(Arc::clone(&backend)).await;
        assert_eq!(session.record_count(), 3);

        session.remove_watchlist_entry("s2").await.unwrap();

        let ids: Vec<String> = session.records().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["w1", "w3"]);
        assert_eq!(backend.removal_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn removal_rolls_back_on_remote_failure() {
        let backend = Arc::new(RemovalBackend::new(true));
        let session = refreshed_session(Arc::clone(&backend)).await;
        let before = session.records();

        let err = session.remove_watchlist_entry("s2").await.unwrap_err();
        match err {
            CoreError::MutationRemote { target_id, .. } => assert_eq!(target_id, "s2"),
            other => panic!("Expected MutationRemote, got {other:?}"),
        }

        assert_eq!(session.records(), before);
    }

    #[tokio::test]
    async fn concurrent_same_id_is_rejected() {
        let (tx, rx) = oneshot::channel();
        let backend = Arc::new(RemovalBackend::gated(false, vec![rx]));
        let session = refreshed_session(Arc::clone(&backend)).await;

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.remove_watchlist_entry("s1").await })
        };
        while backend.removal_calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        // Second removal for the same id while the first is in flight
        let err = session.remove_watchlist_entry("s1").await.unwrap_err();
        match err {
            CoreError::MutationInProgress { target_id } => assert_eq!(target_id, "s1"),
            other => panic!("Expected MutationInProgress, got {other:?}"),
        }

        tx.send(()).unwrap();
        first.await.unwrap().unwrap();

        // Final state matches the single first mutation
        let ids: Vec<String> = session.records().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["w2", "w3"]);
        assert_eq!(backend.removal_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_same_id_rejected_then_rolled_back() {
        let (tx, rx) = oneshot::channel();
        let backend = Arc::new(RemovalBackend::gated(true, vec![rx]));
        let session = refreshed_session(Arc::clone(&backend)).await;
        let before = session.records();

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.remove_watchlist_entry("s1").await })
        };
        while backend.removal_calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        let err = session.remove_watchlist_entry("s1").await.unwrap_err();
        assert!(matches!(err, CoreError::MutationInProgress { .. }));

        tx.send(()).unwrap();
        let outcome = first.await.unwrap();
        assert!(matches!(outcome, Err(CoreError::MutationRemote { .. })));

        // The failed first mutation rolled the collection back
        assert_eq!(session.records(), before);
    }

    #[tokio::test]
    async fn distinct_ids_can_overlap() {
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        let backend = Arc::new(RemovalBackend::gated(false, vec![rx1, rx2]));
        let session = refreshed_session(Arc::clone(&backend)).await;

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.remove_watchlist_entry("s1").await })
        };
        while backend.removal_calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        let second = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.remove_watchlist_entry("s2").await })
        };
        while backend.removal_calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        // Both applied optimistically before either settles
        assert_eq!(session.record_count(), 1);

        tx2.send(()).unwrap();
        second.await.unwrap().unwrap();
        tx1.send(()).unwrap();
        first.await.unwrap().unwrap();

        let ids: Vec<String> = session.records().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["w3"]);
    }

    #[tokio::test]
    async fn same_id_can_be_retried_after_settle() {
        let backend = Arc::new(RemovalBackend::new(true));
        let session = refreshed_session(Arc::clone(&backend)).await;

        let err1 = session.remove_watchlist_entry("s1").await.unwrap_err();
        assert!(matches!(err1, CoreError::MutationRemote { .. }));

        // The id is free again: the retry reaches the server
        let err2 = session.remove_watchlist_entry("s1").await.unwrap_err();
        assert!(matches!(err2, CoreError::MutationRemote { .. }));
        assert_eq!(backend.removal_calls.load(Ordering::SeqCst), 2);
    }
}
