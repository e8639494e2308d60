use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[cfg(not(target_arch = "wasm32"))]
use futures::future::BoxFuture;
#[cfg(target_arch = "wasm32")]
use futures::future::LocalBoxFuture;
use futures::future::Shared;
use futures::FutureExt;

use crate::backend::traits::BrokerageBackend;
use crate::models::stock::{Quote, StockMetadata};

/// Outcome of a secondary lookup: the value, or a typed marker that the
/// entity could not be fetched right now. Lookups never surface
/// transport errors to their callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Unavailable,
}

impl<T> Lookup<T> {
    /// The value, if the lookup succeeded.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Unavailable => None,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
type SharedLookup<T> = Shared<BoxFuture<'static, Lookup<T>>>;
#[cfg(target_arch = "wasm32")]
type SharedLookup<T> = Shared<LocalBoxFuture<'static, Lookup<T>>>;

/// Memoizing, request-coalescing cache over the backend's per-entity
/// lookups (stock metadata by id, live quotes by symbol).
///
/// - **One call per key**: concurrent callers of the same key await the
///   same in-flight future; the backend sees a single request.
/// - **Failures become markers**: a failed lookup resolves to
///   [`Lookup::Unavailable`] (logged at warn), never an error.
/// - **Success is sticky**: resolved values live for the session.
///   [`evict_unavailable`](Self::evict_unavailable) drops only the
///   unavailable markers so the next refresh retries them.
pub struct LookupService {
    backend: Arc<dyn BrokerageBackend>,
    metadata: Mutex<HashMap<String, SharedLookup<StockMetadata>>>,
    quotes: Mutex<HashMap<String, SharedLookup<Quote>>>,
}

impl LookupService {
    pub fn new(backend: Arc<dyn BrokerageBackend>) -> Self {
        Self {
            backend,
            metadata: Mutex::new(HashMap::new()),
            quotes: Mutex::new(HashMap::new()),
        }
    }

    /// Stock metadata by id, memoized.
    pub async fn metadata(&self, stock_id: &str) -> Lookup<StockMetadata> {
        let fut = {
            let mut map = self.metadata.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(existing) = map.get(stock_id) {
                existing.clone()
            } else {
                let backend = Arc::clone(&self.backend);
                let key = stock_id.to_string();
                let fetch = async move {
                    match backend.get_stock(&key).await {
                        Ok(meta) => Lookup::Found(meta),
                        Err(e) => {
                            log::warn!("Stock lookup failed for {key}: {e}");
                            Lookup::Unavailable
                        }
                    }
                };
                #[cfg(not(target_arch = "wasm32"))]
                let shared = fetch.boxed().shared();
                #[cfg(target_arch = "wasm32")]
                let shared = fetch.boxed_local().shared();
                map.insert(stock_id.to_string(), shared.clone());
                shared
            }
        };
        fut.await
    }

    /// Live quote by symbol, memoized.
    pub async fn quote(&self, symbol: &str) -> Lookup<Quote> {
        let fut = {
            let mut map = self.quotes.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(existing) = map.get(symbol) {
                existing.clone()
            } else {
                let backend = Arc::clone(&self.backend);
                let key = symbol.to_string();
                let fetch = async move {
                    match backend.get_quote(&key).await {
                        Ok(quote) => Lookup::Found(quote),
                        Err(e) => {
                            log::warn!("Quote lookup failed for {key}: {e}");
                            Lookup::Unavailable
                        }
                    }
                };
                #[cfg(not(target_arch = "wasm32"))]
                let shared = fetch.boxed().shared();
                #[cfg(target_arch = "wasm32")]
                let shared = fetch.boxed_local().shared();
                map.insert(symbol.to_string(), shared.clone());
                shared
            }
        };
        fut.await
    }

    /// Drop completed unavailable markers so the next lookup retries
    /// them. Resolved values and still-running lookups are kept.
    pub fn evict_unavailable(&self) {
        let mut evicted = 0usize;
        {
            let mut map = self.metadata.lock().unwrap_or_else(|e| e.into_inner());
            let before = map.len();
            map.retain(|_, fut| !matches!(fut.peek(), Some(Lookup::Unavailable)));
            evicted += before - map.len();
        }
        {
            let mut map = self.quotes.lock().unwrap_or_else(|e| e.into_inner());
            let before = map.len();
            map.retain(|_, fut| !matches!(fut.peek(), Some(Lookup::Unavailable)));
            evicted += before - map.len();
        }
        if evicted > 0 {
            log::debug!("Evicted {evicted} unavailable lookup entries for retry");
        }
    }

    /// Number of cached metadata entries (resolved or in flight).
    pub fn metadata_entries(&self) -> usize {
        self.metadata
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Number of cached quote entries (resolved or in flight).
    pub fn quote_entries(&self) -> usize {
        self.quotes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
