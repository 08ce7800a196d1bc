use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::time::{Duration, Instant};

use super::api::ApiError;

/// How long a cached result is served without touching the network.
pub const FRESH_FOR: Duration = Duration::from_secs(5 * 60);
/// How long an unused entry survives before it is dropped outright.
pub const EVICT_AFTER: Duration = Duration::from_secs(10 * 60);

/// Identity of a cached query. Two list queries with the same normalized
/// filters share one entry; every note detail gets its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    List {
        search: Option<String>,
        status: Option<String>,
        category: Option<String>,
        limit: i64,
        offset: i64,
    },
    Detail(i64),
}

impl QueryKey {
    pub fn is_list(&self) -> bool {
        matches!(self, QueryKey::List { .. })
    }
}

struct Entry<T> {
    value: T,
    fetched_at: Instant,
    last_used: Instant,
    invalidated: bool,
}

struct State<T> {
    entries: HashMap<QueryKey, Entry<T>>,
    inflight: HashMap<QueryKey, broadcast::Sender<Result<T, ApiError>>>,
}

struct Inner<T> {
    fresh_for: Duration,
    evict_after: Duration,
    state: Mutex<State<T>>,
}

/// Query cache with stale-while-revalidate semantics. Cheap to clone; all
/// clones share the same entries.
pub struct QueryCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_windows(FRESH_FOR, EVICT_AFTER)
    }

    pub fn with_windows(fresh_for: Duration, evict_after: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                fresh_for,
                evict_after,
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    inflight: HashMap::new(),
                }),
            }),
        }
    }

    /// Resolves `key`, hitting the network only when it has to:
    ///
    /// - fresh entry: returned as-is, no request;
    /// - stale or invalidated entry: returned immediately while one refresh
    ///   runs in the background;
    /// - no entry, request already in flight: waits for that request;
    /// - no entry, nothing in flight: starts the fetch and waits for it.
    ///
    /// Every network fetch runs on its own task, so dropping a waiting
    /// caller never strands the in-flight entry for later queries.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let mut rx = {
            let mut state = self.inner.state.lock().await;
            let now = Instant::now();
            state
                .entries
                .retain(|_, e| now.duration_since(e.last_used) < self.inner.evict_after);

            let State { entries, inflight } = &mut *state;
            if let Some(entry) = entries.get_mut(&key) {
                entry.last_used = now;
                if !entry.invalidated
                    && now.duration_since(entry.fetched_at) < self.inner.fresh_for
                {
                    return Ok(entry.value.clone());
                }

                // Stale-while-revalidate: hand back what we have and refresh
                // behind the caller's back, unless a refresh is already on
                // the wire.
                let value = entry.value.clone();
                if !inflight.contains_key(&key) {
                    let (tx, _) = broadcast::channel(1);
                    inflight.insert(key.clone(), tx);
                    self.spawn_fetch(key, fetch());
                }
                return Ok(value);
            }

            match inflight.get(&key) {
                Some(tx) => tx.subscribe(),
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    inflight.insert(key.clone(), tx);
                    self.spawn_fetch(key, fetch());
                    rx
                }
            }
        };

        match rx.recv().await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Transport(
                "in-flight request was dropped".to_string(),
            )),
        }
    }

    fn spawn_fetch<Fut>(&self, key: QueryKey, fut: Fut)
    where
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move {
            let result = fut.await;
            cache.complete(key, result).await;
        });
    }

    /// Records a finished fetch and wakes any waiters. Errors are passed
    /// through without disturbing whatever was cached before.
    async fn complete(&self, key: QueryKey, result: Result<T, ApiError>) {
        let mut state = self.inner.state.lock().await;
        if let Ok(value) = &result {
            let now = Instant::now();
            state.entries.insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    fetched_at: now,
                    last_used: now,
                    invalidated: false,
                },
            );
        }
        if let Some(tx) = state.inflight.remove(&key) {
            let _ = tx.send(result);
        }
    }

    /// Marks every list entry stale. The next read of each still returns the
    /// cached page but kicks off a refresh.
    pub async fn invalidate_lists(&self) {
        let mut state = self.inner.state.lock().await;
        for (key, entry) in state.entries.iter_mut() {
            if key.is_list() {
                entry.invalidated = true;
            }
        }
    }

    /// Stores `value` under `key` as if it had just been fetched.
    pub async fn put(&self, key: QueryKey, value: T) {
        let mut state = self.inner.state.lock().await;
        let now = Instant::now();
        state.entries.insert(
            key,
            Entry {
                value,
                fetched_at: now,
                last_used: now,
                invalidated: false,
            },
        );
    }

    pub async fn remove(&self, key: &QueryKey) {
        let mut state = self.inner.state.lock().await;
        state.entries.remove(key);
    }

    /// True when `key` is cached and would be served without a refetch.
    pub async fn is_fresh(&self, key: &QueryKey) -> bool {
        let state = self.inner.state.lock().await;
        match state.entries.get(key) {
            Some(entry) => {
                !entry.invalidated
                    && Instant::now().duration_since(entry.fetched_at) < self.inner.fresh_for
            }
            None => false,
        }
    }

    /// True when `key` has an entry at all, fresh or stale.
    pub async fn contains(&self, key: &QueryKey) -> bool {
        let state = self.inner.state.lock().await;
        state.entries.contains_key(key)
    }
}
