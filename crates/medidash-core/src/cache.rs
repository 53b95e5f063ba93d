//! Keyed query cache for dashboard resources.
//!
//! Memoizes fetch results per [`ResourceKey`] and serves them while they are
//! younger than the configured stale time.
//!
//! ## Design
//!
//! - **Store**: `DashMap<ResourceKey, Entry>`. One instance per session, shared
//!   through `Arc` and injected into whatever renders resources.
//! - **Single flight**: at most one fetch per key is in flight. Later callers
//!   attach to the pending [`Shared`] future and observe the same outcome.
//! - **Commit**: the in-flight future itself writes its result back, so the
//!   cache is updated exactly once however many callers are waiting. It runs
//!   on a spawned task, so a caller that is dropped mid-fetch (a view going
//!   away, a timeout) does not leave the entry stuck in `Loading`. Success
//!   replaces `data`; failure keeps the previous `data` and records the error.
//! - **Liveness**: each fetch carries an id. A result whose id no longer
//!   matches the entry (removed or cleared meanwhile) is dropped.
//! - **Subscriptions**: every entry owns a `watch` channel carrying its state,
//!   so views react to transitions instead of polling.
//!
//! ## Example
//!
//! ```ignore
//! let cache = Arc::new(QueryCache::new(QueryOptions::default()));
//! let key = ResourceKey::new(Resource::Patients);
//! let state = cache.query(key, move || async move { client.patients(None).await }).await;
//! if let Some(patients) = state.data { /* render */ }
//! ```

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::client::ResourceKey;
use crate::error::FetchError;

/// Default freshness window (5 minutes).
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(300);

type Payload = Arc<dyn Any + Send + Sync>;
type FetchOutcome = Result<Payload, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// Cache behavior shared by every key.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// How long a successful result is served without touching the network.
    pub stale_time: Duration,
    /// Whether regaining focus marks everything stale. Off for this dashboard.
    pub refetch_on_focus: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            refetch_on_focus: false,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    #[must_use]
    pub fn with_refetch_on_focus(mut self, enabled: bool) -> Self {
        self.refetch_on_focus = enabled;
        self
    }
}

/// Per-entry fetch status.
///
/// `Idle -> Loading -> {Success, Error}`; both terminal states go back to
/// `Loading` on a refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Type-erased state carried by an entry's watch channel.
#[derive(Clone)]
struct Snapshot {
    data: Option<Payload>,
    status: FetchStatus,
    updated_at: Option<Instant>,
    error: Option<FetchError>,
    invalidated: bool,
}

impl Snapshot {
    fn idle() -> Self {
        Self {
            data: None,
            status: FetchStatus::Idle,
            updated_at: None,
            error: None,
            invalidated: false,
        }
    }

    fn is_stale(&self, now: Instant, stale_time: Duration) -> bool {
        self.invalidated
            || self
                .updated_at
                .is_none_or(|at| now.duration_since(at) >= stale_time)
    }

    fn typed<T: Send + Sync + 'static>(
        &self,
        key: &ResourceKey,
        stale_time: Duration,
    ) -> QueryState<T> {
        let is_stale = self.is_stale(Instant::now(), stale_time);
        let data = match self.data.clone().map(|p| p.downcast::<T>()) {
            None => None,
            Some(Ok(data)) => Some(data),
            Some(Err(_)) => {
                return QueryState {
                    data: None,
                    status: FetchStatus::Error,
                    error: Some(FetchError::TypeMismatch {
                        key: key.to_string(),
                    }),
                    updated_at: self.updated_at,
                    is_stale,
                };
            }
        };

        QueryState {
            data,
            status: self.status,
            error: self.error.clone(),
            updated_at: self.updated_at,
            is_stale,
        }
    }
}

struct Entry {
    state: watch::Sender<Snapshot>,
    in_flight: Option<(u64, SharedFetch)>,
}

impl Entry {
    fn new() -> Self {
        let (state, _) = watch::channel(Snapshot::idle());
        Self {
            state,
            in_flight: None,
        }
    }
}

/// What a consumer sees for one key.
#[derive(Debug)]
pub struct QueryState<T> {
    /// Last successful payload; survives later failures.
    pub data: Option<Arc<T>>,
    pub status: FetchStatus,
    pub error: Option<FetchError>,
    pub updated_at: Option<Instant>,
    pub is_stale: bool,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            status: self.status,
            error: self.error.clone(),
            updated_at: self.updated_at,
            is_stale: self.is_stale,
        }
    }
}

impl<T> QueryState<T> {
    /// First load: fetching with nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading && self.data.is_none()
    }

    /// Any fetch in flight, including background refetches.
    pub fn is_fetching(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == FetchStatus::Error
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    /// Human-readable error for inline display.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Default)]
struct CacheStatistics {
    hits: AtomicU64,
    misses: AtomicU64,
    deduplicated: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    dropped: AtomicU64,
}

impl CacheStatistics {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Served from a fresh entry, no network call.
    pub hits: u64,
    /// Started a network call.
    pub misses: u64,
    /// Attached to a fetch already in flight.
    pub deduplicated: u64,
    pub successes: u64,
    pub failures: u64,
    /// Results discarded because their entry went away.
    pub dropped: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses + self.deduplicated;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

enum Acquired {
    Fresh(Snapshot),
    Pending(SharedFetch),
}

/// Process-wide keyed store of fetch results.
pub struct QueryCache {
    entries: Arc<DashMap<ResourceKey, Entry>>,
    options: QueryOptions,
    next_fetch_id: AtomicU64,
    stats: Arc<CacheStatistics>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("size", &self.entries.len())
            .field("options", &self.options)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl QueryCache {
    pub fn new(options: QueryOptions) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            options,
            next_fetch_id: AtomicU64::new(1),
            stats: Arc::new(CacheStatistics::default()),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Returns the cached state for `key`, fetching with `fetch` when the entry
    /// is missing, stale or failed.
    ///
    /// `fetch` is only invoked when this call starts a new request; it must not
    /// touch the cache synchronously.
    pub async fn query<T, F, Fut>(&self, key: ResourceKey, fetch: F) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        self.run(key, fetch, false).await
    }

    /// Like [`query`](Self::query) but ignores freshness. Still attaches to a
    /// fetch already in flight instead of starting a second one.
    pub async fn refetch<T, F, Fut>(&self, key: ResourceKey, fetch: F) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        self.run(key, fetch, true).await
    }

    async fn run<T, F, Fut>(&self, key: ResourceKey, fetch: F, force: bool) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let pending = match self.acquire(key, fetch, force) {
            Acquired::Fresh(snapshot) => return snapshot.typed(&key, self.options.stale_time),
            Acquired::Pending(pending) => pending,
        };

        let outcome = pending.await;

        match self.snapshot(&key) {
            Some(snapshot) => snapshot.typed(&key, self.options.stale_time),
            // Entry removed while we waited: report the outcome uncached.
            None => {
                let mut snapshot = Snapshot::idle();
                match outcome {
                    Ok(payload) => {
                        snapshot.data = Some(payload);
                        snapshot.status = FetchStatus::Success;
                        snapshot.updated_at = Some(Instant::now());
                    }
                    Err(e) => {
                        snapshot.status = FetchStatus::Error;
                        snapshot.error = Some(e);
                    }
                }
                snapshot.typed(&key, self.options.stale_time)
            }
        }
    }

    fn acquire<T, F, Fut>(&self, key: ResourceKey, fetch: F, force: bool) -> Acquired
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let now = Instant::now();
        let mut entry = self.entries.entry(key).or_insert_with(Entry::new);

        if !force {
            let current = entry.state.borrow();
            if current.status == FetchStatus::Success
                && !current.is_stale(now, self.options.stale_time)
            {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = %key, "Query cache hit");
                return Acquired::Fresh(current.clone());
            }
        }

        if let Some((fetch_id, pending)) = &entry.in_flight {
            self.stats.deduplicated.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, fetch_id, "Attaching to in-flight fetch");
            return Acquired::Pending(pending.clone());
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let fetch_id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, fetch_id, force, "Starting fetch");

        let request = fetch();
        let entries = Arc::clone(&self.entries);
        let stats = Arc::clone(&self.stats);
        let pending = async move {
            let outcome: FetchOutcome = request.await.map(|data| Arc::new(data) as Payload);
            commit(&entries, &stats, key, fetch_id, &outcome);
            outcome
        }
        .boxed()
        .shared();

        entry.in_flight = Some((fetch_id, pending.clone()));
        entry.state.send_modify(|s| s.status = FetchStatus::Loading);
        drop(entry);

        // Driven by its own task so the commit happens even if every caller
        // stops awaiting.
        tokio::spawn(pending.clone());

        Acquired::Pending(pending)
    }

    fn snapshot(&self, key: &ResourceKey) -> Option<Snapshot> {
        self.entries
            .get(key)
            .map(|entry| entry.state.borrow().clone())
    }

    /// Current state without fetching. Unknown keys read as idle.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &ResourceKey) -> QueryState<T> {
        self.snapshot(key)
            .unwrap_or_else(Snapshot::idle)
            .typed(key, self.options.stale_time)
    }

    /// Follows state transitions of `key`, creating an idle entry if needed.
    pub fn subscribe<T: Send + Sync + 'static>(&self, key: ResourceKey) -> Subscription<T> {
        let receiver = self
            .entries
            .entry(key)
            .or_insert_with(Entry::new)
            .state
            .subscribe();

        Subscription {
            key,
            receiver,
            stale_time: self.options.stale_time,
            _marker: PhantomData,
        }
    }

    /// Marks `key` stale; its data stays visible until a refetch replaces it.
    pub fn invalidate(&self, key: &ResourceKey) -> bool {
        match self.entries.get(key) {
            Some(entry) => {
                entry.state.send_modify(|s| s.invalidated = true);
                tracing::debug!(key = %key, "Invalidated query");
                true
            }
            None => false,
        }
    }

    /// Window-focus hook. Only has an effect with `refetch_on_focus` enabled,
    /// in which case every entry is marked stale. Returns how many were.
    pub fn focus_regained(&self) -> usize {
        if !self.options.refetch_on_focus {
            tracing::trace!("Focus regained; refetch on focus disabled");
            return 0;
        }

        let mut count = 0;
        for entry in self.entries.iter() {
            entry.state.send_modify(|s| s.invalidated = true);
            count += 1;
        }
        tracing::debug!(count, "Focus regained; marked queries stale");
        count
    }

    /// Drops the entry. Subscribers see their channel close and a pending
    /// fetch for it will not be committed.
    pub fn remove(&self, key: &ResourceKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            tracing::debug!(key = %key, "Removed query");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
        tracing::debug!("Cleared query cache");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

/// Writes a finished fetch back into its entry.
fn commit(
    entries: &DashMap<ResourceKey, Entry>,
    stats: &CacheStatistics,
    key: ResourceKey,
    fetch_id: u64,
    outcome: &FetchOutcome,
) {
    let Some(mut entry) = entries.get_mut(&key) else {
        stats.dropped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, fetch_id, "Entry gone; dropping fetch result");
        return;
    };

    if entry.in_flight.as_ref().map(|(id, _)| *id) != Some(fetch_id) {
        stats.dropped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, fetch_id, "Superseded fetch; dropping result");
        return;
    }
    entry.in_flight = None;

    let now = Instant::now();
    match outcome {
        Ok(payload) => {
            stats.successes.fetch_add(1, Ordering::Relaxed);
            entry.state.send_modify(|s| {
                s.data = Some(Arc::clone(payload));
                s.status = FetchStatus::Success;
                s.updated_at = Some(now);
                s.error = None;
                s.invalidated = false;
            });
            tracing::debug!(key = %key, fetch_id, "Fetch committed");
        }
        Err(e) => {
            stats.failures.fetch_add(1, Ordering::Relaxed);
            entry.state.send_modify(|s| {
                s.status = FetchStatus::Error;
                s.error = Some(e.clone());
            });
            tracing::warn!(key = %key, fetch_id, error = %e, "Fetch failed");
        }
    }
}

/// Typed view over one entry's state transitions.
pub struct Subscription<T> {
    key: ResourceKey,
    receiver: watch::Receiver<Snapshot>,
    stale_time: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Latest state, marking it seen.
    pub fn current(&mut self) -> QueryState<T> {
        self.receiver
            .borrow_and_update()
            .typed(&self.key, self.stale_time)
    }

    /// Waits for the next transition. Returns `false` once the entry has been
    /// removed from the cache.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Resource;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    fn key(resource: Resource) -> ResourceKey {
        ResourceKey::new(resource)
    }

    /// Fetch closure that counts invocations and resolves after `delay`.
    fn counted(
        calls: &Arc<AtomicUsize>,
        value: Vec<u32>,
        delay: Duration,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<u32>, FetchError>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            .boxed()
        }
    }

    fn failing(
        calls: &Arc<AtomicUsize>,
        error: FetchError,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<u32>, FetchError>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(error) }.boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_queries_share_one_fetch() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Appointments);

        let (a, b) = tokio::join!(
            cache.query(k, counted(&calls, vec![1, 2, 3], Duration::from_millis(50))),
            cache.query(k, counted(&calls, vec![9], Duration::from_millis(50))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let (a, b) = (a.data.unwrap(), b.data.unwrap());
        assert_eq!(*a, vec![1, 2, 3]);
        assert!(Arc::ptr_eq(&a, &b));

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.deduplicated, 1);
        assert_eq!(stats.successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_served_without_fetch() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Patients);

        let first = cache.query(k, counted(&calls, vec![1], Duration::ZERO)).await;
        assert!(first.is_success());

        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache.query(k, counted(&calls, vec![2], Duration::ZERO)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!second.is_loading());
        assert!(!second.is_stale);
        assert_eq!(*second.data.unwrap(), vec![1]);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_triggers_exactly_one_fetch() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Patients);

        cache.query(k, counted(&calls, vec![1], Duration::ZERO)).await;
        tokio::time::advance(DEFAULT_STALE_TIME).await;
        assert!(cache.peek::<Vec<u32>>(&k).is_stale);

        let refreshed = cache.query(k, counted(&calls, vec![2], Duration::ZERO)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*refreshed.data.unwrap(), vec![2]);
        assert!(!refreshed.is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refetch_keeps_last_good_data() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Metrics);

        cache.query(k, counted(&calls, vec![7], Duration::ZERO)).await;
        let failed = cache
            .refetch(k, failing(&calls, FetchError::status(500, "down")))
            .await;

        assert!(failed.is_error());
        assert_eq!(failed.error, Some(FetchError::status(500, "down")));
        assert_eq!(*failed.data.unwrap(), vec![7]);
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_entry_refetches_on_next_query() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Charts);

        let failed = cache
            .query(k, failing(&calls, FetchError::network("refused")))
            .await;
        assert!(failed.is_error());
        assert!(failed.data.is_none());
        assert_eq!(failed.error_message().as_deref(), Some("Network error: refused"));

        let recovered = cache.query(k, counted(&calls, vec![3], Duration::ZERO)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(recovered.is_success());
        assert!(recovered.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_isolated_per_key() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let (metrics, charts) = tokio::join!(
            cache.query(
                key(Resource::Metrics),
                failing(&calls, FetchError::status(500, ""))
            ),
            cache.query(
                key(Resource::Charts),
                counted(&calls, vec![1], Duration::from_millis(5))
            ),
        );

        assert!(metrics.is_error());
        assert!(charts.is_success());
        assert!(charts.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_observes_transitions() {
        let cache = Arc::new(QueryCache::default());
        let k = key(Resource::Appointments);
        let mut sub = cache.subscribe::<Vec<u32>>(k);
        assert_eq!(sub.current().status, FetchStatus::Idle);

        let (tx, rx) = oneshot::channel::<Vec<u32>>();
        let task = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .query(k, move || async move {
                        rx.await.map_err(|_| FetchError::network("cancelled"))
                    })
                    .await
            })
        };

        assert!(sub.changed().await);
        let loading = sub.current();
        assert!(loading.is_loading());
        assert!(loading.is_fetching());

        tx.send(vec![4, 5]).unwrap();
        assert!(sub.changed().await);
        let done = sub.current();
        assert!(done.is_success());
        assert_eq!(*done.data.unwrap(), vec![4, 5]);

        assert!(task.await.unwrap().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_commits_after_starting_caller_is_dropped() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Appointments);
        let mut sub = cache.subscribe::<Vec<u32>>(k);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            cache.query(k, counted(&calls, vec![8], Duration::from_millis(50))),
        )
        .await;
        assert!(abandoned.is_err());

        let settled = tokio::time::timeout(Duration::from_secs(60), async {
            while sub.changed().await {
                if sub.current().is_success() {
                    return true;
                }
            }
            false
        })
        .await;
        assert!(matches!(settled, Ok(true)));

        let state = cache.peek::<Vec<u32>>(&k);
        assert_eq!(*state.data.unwrap(), vec![8]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_entry_drops_late_result() {
        let cache = Arc::new(QueryCache::default());
        let k = key(Resource::Patients);
        let mut sub = cache.subscribe::<Vec<u32>>(k);

        let (tx, rx) = oneshot::channel::<Vec<u32>>();
        let task = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .query(k, move || async move {
                        rx.await.map_err(|_| FetchError::network("cancelled"))
                    })
                    .await
            })
        };
        assert!(sub.changed().await);

        assert!(cache.remove(&k));
        tx.send(vec![1]).unwrap();

        // Caller still receives its own outcome, the cache stays empty.
        let state = task.await.unwrap();
        assert_eq!(*state.data.unwrap(), vec![1]);
        assert!(cache.is_empty());
        assert_eq!(cache.peek::<Vec<u32>>(&k).status, FetchStatus::Idle);
        assert_eq!(cache.stats().dropped, 1);
        assert!(!sub.changed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch_but_keeps_data() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Patients).with_limit(Some(4));

        cache.query(k, counted(&calls, vec![1], Duration::ZERO)).await;
        assert!(cache.invalidate(&k));
        let peeked = cache.peek::<Vec<u32>>(&k);
        assert!(peeked.is_stale);
        assert_eq!(*peeked.data.unwrap(), vec![1]);

        cache.query(k, counted(&calls, vec![2], Duration::ZERO)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cache.invalidate(&key(Resource::Charts)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_refetch_disabled_by_default() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Metrics);

        cache.query(k, counted(&calls, vec![1], Duration::ZERO)).await;
        assert_eq!(cache.focus_regained(), 0);
        cache.query(k, counted(&calls, vec![2], Duration::ZERO)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_refetch_when_enabled() {
        let cache = QueryCache::new(QueryOptions::default().with_refetch_on_focus(true));
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Metrics);

        cache.query(k, counted(&calls, vec![1], Duration::ZERO)).await;
        assert_eq!(cache.focus_regained(), 1);
        cache.query(k, counted(&calls, vec![2], Duration::ZERO)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_mismatch_is_reported() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(Resource::Charts);

        cache.query(k, counted(&calls, vec![1], Duration::ZERO)).await;
        let wrong = cache.peek::<String>(&k);
        assert!(wrong.is_error());
        assert!(matches!(wrong.error, Some(FetchError::TypeMismatch { .. })));
    }

    #[test]
    fn test_options_and_stats_defaults() {
        let options = QueryOptions::default();
        assert_eq!(options.stale_time, Duration::from_secs(300));
        assert!(!options.refetch_on_focus);

        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    }
}
