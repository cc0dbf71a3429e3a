//! Client-side request cache.
//!
//! Reads are declared as a [`QueryKey`] plus a fetch function. Identical
//! concurrent reads share one in-flight request; successful results are
//! served from memory until invalidated. Writes go through
//! [`QueryCache::mutate`], which invalidates an explicit list of keys once
//! the write succeeds.
//!
//! Per query: `Idle -> Loading -> {Success | Error}`, and back to `Loading`
//! on refetch or on the first read after an invalidation. Invalidation itself
//! never issues a request.

mod key;

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::ApiError;
pub use key::QueryKey;

type QueryValue = Arc<dyn Any + Send + Sync>;
type FetchFuture = BoxFuture<'static, Result<QueryValue, ApiError>>;
type SharedFetch = Shared<FetchFuture>;
type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of one query as a view would observe it.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    /// Last successful result; kept across later failures.
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub is_stale: bool,
}

#[derive(Debug, Clone)]
pub struct QueryCacheConfig {
    /// Extra attempts for retryable read failures.
    pub retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_delay: Duration,
    /// Age after which a result is refetched on next read. `None` keeps
    /// results until they are invalidated.
    pub stale_time: Option<Duration>,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay: Duration::from_millis(500),
            stale_time: None,
        }
    }
}

struct Entry {
    status: QueryStatus,
    data: Option<QueryValue>,
    error: Option<ApiError>,
    updated_at: Option<Instant>,
    stale: bool,
    fetcher: Option<Fetcher>,
    in_flight: Option<SharedFetch>,
    // Id of the fetch allowed to write this entry.
    fetch_id: u64,
}

impl Entry {
    fn new() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
            stale: false,
            fetcher: None,
            in_flight: None,
            fetch_id: 0,
        }
    }

    fn is_stale(&self, stale_time: Option<Duration>) -> bool {
        if self.stale {
            return true;
        }
        match (stale_time, self.updated_at) {
            (Some(ttl), Some(at)) => at.elapsed() >= ttl,
            _ => false,
        }
    }

    fn is_fresh(&self, stale_time: Option<Duration>) -> bool {
        self.status == QueryStatus::Success && self.data.is_some() && !self.is_stale(stale_time)
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    config: QueryCacheConfig,
    next_fetch_id: AtomicU64,
}

impl Inner {
    fn settle(&self, key: &QueryKey, fetch_id: u64, result: &Result<QueryValue, ApiError>) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.fetch_id != fetch_id {
            debug!(%key, "discarding superseded query result");
            return;
        }
        entry.in_flight = None;
        match result {
            Ok(value) => {
                entry.data = Some(Arc::clone(value));
                entry.error = None;
                entry.status = QueryStatus::Success;
                entry.stale = false;
                entry.updated_at = Some(Instant::now());
            }
            Err(e) => {
                entry.error = Some(e.clone());
                entry.status = QueryStatus::Error;
            }
        }
    }
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(QueryCacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: QueryCacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                config,
                next_fetch_id: AtomicU64::new(1),
            }),
        }
    }

    /// Returns the cached result for `key` when it is fresh; otherwise joins
    /// the in-flight request or starts one with `fetcher`. The latest
    /// `fetcher` given for a key is the one [`refetch`](Self::refetch) uses.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let erased: Fetcher = Arc::new(move || {
            let fut = fetcher();
            async move { fut.await.map(|v| Arc::new(v) as QueryValue) }.boxed()
        });

        let pending = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.fetcher = Some(Arc::clone(&erased));
            if entry.is_fresh(self.inner.config.stale_time) {
                if let Some(data) = &entry.data {
                    debug!(%key, "query cache hit");
                    return downcast(&key, data);
                }
            }
            match &entry.in_flight {
                Some(in_flight) => {
                    debug!(%key, "joining in-flight query");
                    in_flight.clone()
                }
                None => self.begin_fetch(&key, entry, erased),
            }
        };

        let value = pending.await?;
        downcast(&key, &value)
    }

    /// Starts a new request for `key` with its registered fetcher, even when
    /// the cached result is fresh. Returns `false` when the key was never
    /// fetched.
    pub async fn refetch(&self, key: &QueryKey) -> Result<bool, ApiError> {
        let pending = {
            let mut entries = self.inner.entries.lock();
            let Some(entry) = entries.get_mut(key) else {
                return Ok(false);
            };
            let Some(fetcher) = entry.fetcher.clone() else {
                return Ok(false);
            };
            entry.stale = true;
            self.begin_fetch(key, entry, fetcher)
        };
        pending.await?;
        Ok(true)
    }

    /// Marks every query whose key starts with `prefix` stale so its next
    /// read refetches. No request is made here. A fetch already in flight for
    /// a matched key is detached: its callers still get its result, but it no
    /// longer writes the entry. Returns the number of queries matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.inner.entries.lock();
        let mut matched = 0;
        for (_, entry) in entries.iter_mut().filter(|(k, _)| k.starts_with(prefix)) {
            matched += 1;
            entry.stale = true;
            if entry.in_flight.take().is_some() {
                entry.fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                entry.status = if entry.error.is_some() {
                    QueryStatus::Error
                } else if entry.data.is_some() {
                    QueryStatus::Success
                } else {
                    QueryStatus::Idle
                };
            }
        }
        debug!(%prefix, matched, "invalidated queries");
        matched
    }

    /// Runs a write. On success every key in `invalidates` is invalidated
    /// before the result is returned; on failure the cache is left as it was.
    pub async fn mutate<T, Fut>(&self, mutation: Fut, invalidates: &[QueryKey]) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match mutation.await {
            Ok(out) => {
                for key in invalidates {
                    self.invalidate(key);
                }
                Ok(out)
            }
            Err(e) => {
                debug!(error = %e, "mutation failed; cache untouched");
                Err(e)
            }
        }
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        self.inner
            .entries
            .lock()
            .get(key)
            .map(|e| e.status)
            .unwrap_or(QueryStatus::Idle)
    }

    pub fn state<T: Clone + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let entries = self.inner.entries.lock();
        match entries.get(key) {
            None => QueryState {
                status: QueryStatus::Idle,
                data: None,
                error: None,
                is_stale: false,
            },
            Some(e) => QueryState {
                status: e.status,
                data: e
                    .data
                    .as_ref()
                    .and_then(|d| (**d).downcast_ref::<T>().cloned()),
                error: e.error.clone(),
                is_stale: e.is_stale(self.inner.config.stale_time),
            },
        }
    }

    /// Drops every query under `prefix`. In-flight requests finish but their
    /// results are discarded.
    pub fn remove(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.inner.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn begin_fetch(&self, key: &QueryKey, entry: &mut Entry, fetcher: Fetcher) -> SharedFetch {
        let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let config = self.inner.config.clone();
        let key = key.clone();

        let fut = async move {
            let result = run_with_retries(&key, &fetcher, &config).await;
            if let Some(inner) = inner.upgrade() {
                inner.settle(&key, fetch_id, &result);
            }
            result
        }
        .boxed()
        .shared();

        entry.fetch_id = fetch_id;
        entry.status = QueryStatus::Loading;
        entry.in_flight = Some(fut.clone());
        fut
    }
}

async fn run_with_retries(
    key: &QueryKey,
    fetcher: &Fetcher,
    config: &QueryCacheConfig,
) -> Result<QueryValue, ApiError> {
    let mut attempt: u32 = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.retries && e.is_retryable() => {
                let delay = config.retry_delay.saturating_mul(1 << attempt.min(16));
                warn!(%key, attempt = attempt + 1, error = %e, "query failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                debug!(%key, error = %e, "query failed");
                return Err(e);
            }
        }
    }
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: &QueryValue) -> Result<T, ApiError> {
    (**value)
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| ApiError::Decode(format!("cached value for {key} has a different type")))
}
