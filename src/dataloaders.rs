//! DataLoader utilities for batch loading.
//!
//! Implements the DataLoader pattern for preventing N+1 query problems:
//! loads requested within one dispatch window are deduplicated and served
//! by a single grouped query, and results are cached for the lifetime of
//! the loader. See: <https://github.com/graphql/dataloader>

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};

/// How long the first `load` of a window waits before dispatching.
const DISPATCH_WINDOW: Duration = Duration::from_millis(1);

/// Errors produced by a batch dispatch.
///
/// A failure is shared by every caller waiting on the batch, so the type
/// is cheaply cloneable. Missing keys are not errors; they resolve to the
/// loader's empty value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The underlying store query failed.
    #[error("batch query failed: {0}")]
    BatchQueryFailure(String),

    /// The batch function returned a result list whose length does not
    /// match the key list it was given.
    #[error("batch loader returned {got} results for {expected} keys")]
    MismatchedBatch { expected: usize, got: usize },
}

/// Batch loader trait for loading multiple items at once.
#[async_trait]
pub trait BatchLoader<K, V>: Send + Sync
where
    K: Send + Sync + Clone + Eq + Hash,
    V: Send + Sync + Clone,
{
    /// Load the values for `keys` in a single grouped query.
    ///
    /// `keys` is already deduplicated. The returned list must have the
    /// same length and order as `keys`; callers rely on positional
    /// correspondence. Keys with no backing documents map to their empty
    /// value (an empty list, or `None` for one-to-one loaders) rather
    /// than an error.
    async fn load_batch(&self, keys: &[K]) -> Result<Vec<V>, LoadError>;
}

enum Slot<V> {
    Pending(Vec<oneshot::Sender<Result<V, LoadError>>>),
    Ready(Result<V, LoadError>),
}

struct Inner<K, V> {
    slots: HashMap<K, Slot<V>>,
    queue: Vec<K>,
    armed: bool,
}

impl<K, V> Inner<K, V> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
            queue: Vec::new(),
            armed: false,
        }
    }
}

/// DataLoader with request-scoped caching and windowed batching.
///
/// `load` calls arriving within one dispatch window are collected and
/// served by a single [`BatchLoader::load_batch`] call. Results are
/// memoized for the lifetime of the loader, so a given key is dispatched
/// to the store at most once; construct a fresh instance per inbound
/// request.
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use lectern::dataloaders::{BatchLoader, DataLoader, LoadError};
///
/// struct TitleLoader;
///
/// #[async_trait]
/// impl BatchLoader<String, Option<String>> for TitleLoader {
///     async fn load_batch(&self, keys: &[String]) -> Result<Vec<Option<String>>, LoadError> {
///         Ok(keys.iter().map(|_| None).collect())
///     }
/// }
///
/// # async fn demo() -> Result<(), LoadError> {
/// let loader = DataLoader::new("titles", TitleLoader);
/// let title = loader.load("l1".to_string()).await?;
/// # Ok(())
/// # }
/// ```
pub struct DataLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    name: &'static str,
    loader: Arc<L>,
    state: Arc<Mutex<Inner<K, V>>>,
    window: Duration,
}

impl<K, V, L> DataLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    /// Create a new DataLoader over a batch loader. `name` tags dispatch
    /// logs.
    pub fn new(name: &'static str, loader: L) -> Self {
        Self {
            name,
            loader: Arc::new(loader),
            state: Arc::new(Mutex::new(Inner::new())),
            window: DISPATCH_WINDOW,
        }
    }

    /// Override the dispatch window.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Load a single value by key.
    ///
    /// The key joins the current window's batch (arming the dispatch
    /// timer if this is the window's first key) unless a cached or
    /// in-flight result for it already exists, in which case that result
    /// is shared.
    pub async fn load(&self, key: K) -> Result<V, LoadError> {
        let receiver = {
            let mut state = self.state.lock().await;
            let Inner {
                slots,
                queue,
                armed,
            } = &mut *state;

            match slots.entry(key.clone()) {
                Entry::Occupied(mut occupied) => match occupied.get_mut() {
                    Slot::Ready(result) => return result.clone(),
                    Slot::Pending(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        rx
                    }
                },
                Entry::Vacant(vacant) => {
                    let (tx, rx) = oneshot::channel();
                    vacant.insert(Slot::Pending(vec![tx]));
                    queue.push(key);
                    if !*armed {
                        *armed = true;
                        self.arm();
                    }
                    rx
                }
            }
        };

        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(LoadError::BatchQueryFailure(
                "batch dispatch terminated".to_string(),
            )),
        }
    }

    /// Load multiple keys, preserving input order.
    ///
    /// All keys join the same dispatch window; duplicate keys resolve to
    /// the same value. A batch failure fails the whole call.
    pub async fn load_many(&self, keys: Vec<K>) -> Result<Vec<V>, LoadError> {
        futures::future::try_join_all(keys.into_iter().map(|key| self.load(key))).await
    }

    /// Seed the cache with a value.
    ///
    /// Existing entries, including in-flight loads, are left untouched.
    pub async fn prime(&self, key: K, value: V) {
        let mut state = self.state.lock().await;
        state
            .slots
            .entry(key)
            .or_insert_with(|| Slot::Ready(Ok(value)));
    }

    /// Drop all cached results. In-flight loads are unaffected.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.slots.retain(|_, slot| matches!(slot, Slot::Pending(_)));
    }

    fn arm(&self) {
        let name = self.name;
        let loader = Arc::clone(&self.loader);
        let state = Arc::clone(&self.state);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            dispatch(name, loader, state).await;
        });
    }
}

impl<K, V, L> Clone for DataLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            loader: self.loader.clone(),
            state: self.state.clone(),
            window: self.window,
        }
    }
}

/// Take the queued keys, run the grouped query, and hand each waiter its
/// share of the outcome.
async fn dispatch<K, V, L>(name: &'static str, loader: Arc<L>, state: Arc<Mutex<Inner<K, V>>>)
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    let keys = {
        let mut state = state.lock().await;
        state.armed = false;
        std::mem::take(&mut state.queue)
    };
    if keys.is_empty() {
        return;
    }

    tracing::debug!(loader = name, batch_size = keys.len(), "dispatching batch");
    let outcome = loader.load_batch(&keys).await;

    let results: Vec<Result<V, LoadError>> = match outcome {
        Ok(values) if values.len() == keys.len() => values.into_iter().map(Ok).collect(),
        Ok(values) => {
            let error = LoadError::MismatchedBatch {
                expected: keys.len(),
                got: values.len(),
            };
            tracing::warn!(loader = name, %error, "batch loader broke its contract");
            keys.iter().map(|_| Err(error.clone())).collect()
        }
        Err(error) => keys.iter().map(|_| Err(error.clone())).collect(),
    };

    let mut state = state.lock().await;
    for (key, result) in keys.into_iter().zip(results) {
        if let Some(Slot::Pending(waiters)) =
            state.slots.insert(key, Slot::Ready(result.clone()))
        {
            for waiter in waiters {
                let _ = waiter.send(result.clone());
            }
        }
    }
}
