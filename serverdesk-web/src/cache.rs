//! Query cache shared by the pages of one layout mount
//!
//! Values are keyed by a [`QueryKey`] and typed at the call site. Entries go
//! stale after `stale_time` and are then refetched on the next read; the
//! least recently used entry is evicted once `max_entries` is reached.

use serde::{Deserialize, Serialize};
use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Hierarchical cache key, e.g. `["servers", "srv1", "tasks"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Task list of one server
    pub fn tasks(server_id: &str) -> Self {
        Self::new(["servers", server_id, "tasks"])
    }

    /// Everything cached about one server
    pub fn server(server_id: &str) -> Self {
        Self::new(["servers", server_id])
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

/// Query cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryClientConfig {
    /// Seconds a fetched value is served without refetching
    pub stale_time_secs: u64,
    pub max_entries: usize,
    /// Seconds between sweeps of stale entries; 0 disables the sweeper
    pub sweep_interval_secs: u64,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: 60,
            max_entries: 1000,
            sweep_interval_secs: 300,
        }
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    last_accessed: Instant,
}

impl CacheEntry {
    fn is_stale(&self, stale_time: Duration) -> bool {
        self.fetched_at.elapsed() >= stale_time
    }
}

struct Inner {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    config: QueryClientConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Inner {
    fn stale_time(&self) -> Duration {
        Duration::from_secs(self.config.stale_time_secs)
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCacheStats {
    pub total_entries: usize,
    pub stale_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub max_entries: usize,
}

/// Shared query cache. Clones are handles to the same cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl QueryClient {
    pub fn new(config: QueryClientConfig) -> Self {
        let client = Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                config,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        };

        client.start_sweeper();
        client
    }

    /// Return the cached value for `key`, or run `fetcher` and cache its
    /// result. Errors are returned as-is and never cached.
    pub async fn fetch<T, E, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get_fresh::<T>(&key).await {
            self.inner.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Query cache hit: {:?}", key);
            return Ok(value);
        }

        self.inner.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Query cache miss: {:?}", key);

        let value = fetcher().await?;
        self.set(key, value.clone()).await;
        Ok(value)
    }

    async fn get_fresh<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let stale_time = self.inner.stale_time();
        let mut entries = self.inner.entries.write().await;

        let entry = entries.get_mut(key)?;
        if entry.is_stale(stale_time) {
            return None;
        }

        let value = entry.value.downcast_ref::<T>()?.clone();
        entry.last_accessed = Instant::now();
        Some(value)
    }

    /// Store a value, evicting the least recently used entry when full.
    /// A client configured with `max_entries = 0` stores nothing.
    pub async fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        if self.inner.config.max_entries == 0 {
            return;
        }
        let mut entries = self.inner.entries.write().await;

        if entries.len() >= self.inner.config.max_entries && !entries.contains_key(&key) {
            let lru_key = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone());

            if let Some(lru_key) = lru_key {
                entries.remove(&lru_key);
                debug!("Evicted LRU query cache entry: {:?}", lru_key);
            }
        }

        let now = Instant::now();
        entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                fetched_at: now,
                last_accessed: now,
            },
        );
    }

    /// Drop every entry whose key starts with `prefix`
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        debug!("Invalidated {} query cache entries under {:?}", removed, prefix);
        removed
    }

    pub async fn stats(&self) -> QueryCacheStats {
        let stale_time = self.inner.stale_time();
        let entries = self.inner.entries.read().await;

        QueryCacheStats {
            total_entries: entries.len(),
            stale_entries: entries
                .values()
                .filter(|entry| entry.is_stale(stale_time))
                .count(),
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            max_entries: self.inner.config.max_entries,
        }
    }

    /// Whether two handles point at the same cache
    pub fn same_client(&self, other: &QueryClient) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles to this cache
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Periodically drop stale entries. The task holds a weak reference and
    /// exits once the last handle is dropped.
    fn start_sweeper(&self) {
        let period = Duration::from_secs(self.inner.config.sweep_interval_secs);
        if period.is_zero() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No tokio runtime, query cache sweeper disabled");
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    debug!("Query client dropped, stopping sweeper");
                    break;
                };

                let stale_time = inner.stale_time();
                let removed = {
                    let mut entries = inner.entries.write().await;
                    let before = entries.len();
                    entries.retain(|_, entry| !entry.is_stale(stale_time));
                    before - entries.len()
                };
                if removed > 0 {
                    info!("Query cache sweep: removed {} stale entries", removed);
                }

                let stats = QueryClient { inner }.stats().await;
                debug!(
                    total_entries = stats.total_entries,
                    hits = stats.hits,
                    misses = stats.misses,
                    "Query cache stats"
                );
            }
        });
    }
}
