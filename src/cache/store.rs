use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::ApiError;

use super::key::QueryKey;

type SharedFetch<T> = Shared<BoxFuture<'static, Result<Arc<T>, Arc<ApiError>>>>;

/// Per-query behavior knobs. Each adapter owns one of these.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// How long a successful result is served without re-fetching.
    pub stale_after: Duration,
    /// How many times the fetch function is re-invoked after a failure
    /// before the query settles into its error state.
    pub retries: u32,
    /// Whether [`QueryCache::activate`] revalidates even over a fresh
    /// entry.
    pub refetch_on_activate: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(30),
            retries: 0,
            refetch_on_activate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// A guard kept the query from ever running (e.g. no child selected).
    Disabled,
    Loading,
    Success,
    Error,
}

/// The borrowed per-render view of one cached query.
///
/// `data` keeps its last successful value through later failures;
/// a failure is visible in `error`/`status`, never swallowed into an
/// empty success.
#[derive(Debug)]
pub struct QuerySnapshot<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<ApiError>>,
    pub status: QueryStatus,
    pub fetched_at: Option<DateTime<Utc>>,
}

// Manual impl: `T` itself never needs to be Clone behind the Arc.
impl<T> Clone for QuerySnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            status: self.status,
            fetched_at: self.fetched_at,
        }
    }
}

impl<T> QuerySnapshot<T> {
    pub fn disabled() -> Self {
        Self {
            data: None,
            error: None,
            status: QueryStatus::Disabled,
            fetched_at: None,
        }
    }

    fn loading() -> Self {
        Self {
            data: None,
            error: None,
            status: QueryStatus::Loading,
            fetched_at: None,
        }
    }

    fn from_result(result: Result<Arc<T>, Arc<ApiError>>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
                status: QueryStatus::Success,
                fetched_at: Some(Utc::now()),
            },
            Err(err) => Self {
                data: None,
                error: Some(err),
                status: QueryStatus::Error,
                fetched_at: None,
            },
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Successful data younger than the staleness window.
    pub fn is_fresh(&self, stale_after: Duration) -> bool {
        if self.status != QueryStatus::Success {
            return false;
        }
        let Some(fetched_at) = self.fetched_at else {
            return false;
        };
        let age = Utc::now().signed_duration_since(fetched_at);
        match chrono::Duration::from_std(stale_after) {
            Ok(window) => age < window,
            // Window too large to represent: never stale
            Err(_) => true,
        }
    }
}

struct Slot<T> {
    snapshot: QuerySnapshot<T>,
    inflight: Option<SharedFetch<T>>,
    /// Stamp of the fetch the slot last accepted. A completing fetch
    /// whose stamp no longer matches was superseded (invalidation, or a
    /// newer fetch) and must not overwrite the entry.
    generation: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            snapshot: QuerySnapshot::loading(),
            inflight: None,
            generation: 0,
        }
    }
}

/// Process-wide in-memory query store.
///
/// Created at application start and dropped at shutdown, the store owns
/// every cached value's lifetime; adapters register fetch functions
/// against it and only ever hand out snapshot clones.
///
/// Guarantees, per key:
/// - at most one fetch in flight - concurrent callers join the same
///   shared future instead of duplicating the request;
/// - a fetch nobody awaits (every caller dropped) is cancelled and never
///   writes;
/// - a fetch that completes after its entry was invalidated is discarded
///   on arrival.
pub struct QueryCache<T> {
    slots: Mutex<HashMap<QueryKey, Slot<T>>>,
    next_generation: std::sync::atomic::AtomicU64,
}

impl<T: Send + Sync + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            next_generation: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn stamp(&self) -> u64 {
        self.next_generation
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }

    /// Resolve the query under `key`: serve the cached snapshot while it
    /// is fresh, otherwise run `fetch_fn` (with `opts.retries`
    /// re-attempts) and cache the outcome.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, opts: QueryOptions, fetch_fn: F) -> QuerySnapshot<T>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.run(key, opts, false, fetch_fn).await
    }

    /// The consuming view became active. With `refetch_on_activate` set
    /// this revalidates even over a fresh entry; otherwise it behaves
    /// like [`fetch`](Self::fetch).
    pub async fn activate<F, Fut>(&self, key: QueryKey, opts: QueryOptions, fetch_fn: F) -> QuerySnapshot<T>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.run(key, opts, opts.refetch_on_activate, fetch_fn).await
    }

    async fn run<F, Fut>(&self, key: QueryKey, opts: QueryOptions, force: bool, fetch_fn: F) -> QuerySnapshot<T>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (fut, generation) = {
            let mut slots = self.slots.lock().await;
            let slot = slots.entry(key.clone()).or_default();

            if let Some(inflight) = &slot.inflight {
                debug!(key = %key, "joining in-flight query");
                (inflight.clone(), slot.generation)
            } else if !force && slot.snapshot.is_fresh(opts.stale_after) {
                return slot.snapshot.clone();
            } else {
                let generation = self.stamp();
                slot.generation = generation;

                let retries = opts.retries;
                let label = key.clone();
                let fut: SharedFetch<T> = async move {
                    let mut attempt = 0u32;
                    loop {
                        match fetch_fn().await {
                            Ok(value) => return Ok(Arc::new(value)),
                            Err(err) if attempt < retries => {
                                attempt += 1;
                                debug!(key = %label, attempt, error = %err, "query fetch failed, retrying");
                            }
                            Err(err) => return Err(Arc::new(err)),
                        }
                    }
                }
                .boxed()
                .shared();

                slot.inflight = Some(fut.clone());
                slot.snapshot.status = QueryStatus::Loading;
                slot.snapshot.error = None;
                (fut, generation)
            }
        };

        let result = fut.await;

        let mut slots = self.slots.lock().await;
        let Some(slot) = slots.get_mut(&key) else {
            // Entry evicted while the fetch was in flight: hand the
            // result to this caller, leave the store untouched.
            return QuerySnapshot::from_result(result);
        };
        if slot.generation != generation || slot.inflight.is_none() {
            // Superseded, or a coalesced caller already committed
            return slot.snapshot.clone();
        }

        slot.inflight = None;
        match result {
            Ok(data) => {
                slot.snapshot = QuerySnapshot {
                    data: Some(data),
                    error: None,
                    status: QueryStatus::Success,
                    fetched_at: Some(Utc::now()),
                };
            }
            Err(err) => {
                // Prior data stays readable; the failure is surfaced
                slot.snapshot.status = QueryStatus::Error;
                slot.snapshot.error = Some(err);
            }
        }
        slot.snapshot.clone()
    }

    /// Read the current snapshot without touching the fetch machinery.
    pub async fn peek(&self, key: &QueryKey) -> Option<QuerySnapshot<T>> {
        self.slots.lock().await.get(key).map(|slot| slot.snapshot.clone())
    }

    /// Mark one entry stale and discard any in-flight fetch for it.
    pub async fn invalidate(&self, key: &QueryKey) {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.get_mut(key) {
            Self::invalidate_slot(slot, self.stamp());
            debug!(key = %key, "query invalidated");
        }
    }

    /// Invalidate every entry whose key falls under `prefix`. Mutations
    /// use this to drop a whole feature's cached queries at once.
    pub async fn invalidate_prefix(&self, prefix: &QueryKey) {
        let mut slots = self.slots.lock().await;
        for (key, slot) in slots.iter_mut() {
            if key.starts_with(prefix) {
                Self::invalidate_slot(slot, self.stamp());
                debug!(key = %key, "query invalidated");
            }
        }
    }

    fn invalidate_slot(slot: &mut Slot<T>, stamp: u64) {
        slot.generation = stamp;
        slot.inflight = None;
        // Keep any data for stale-while-revalidate reads, but age it out
        slot.snapshot.fetched_at = None;
    }

    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }

    #[cfg(test)]
    pub(crate) async fn force_fetched_at(&self, key: &QueryKey, fetched_at: DateTime<Utc>) {
        if let Some(slot) = self.slots.lock().await.get_mut(key) {
            slot.snapshot.fetched_at = Some(fetched_at);
        }
    }
}
