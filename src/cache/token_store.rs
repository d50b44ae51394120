use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::sweeper::Sweeper;
use crate::cache::token::{Entry, EntryInfo, Ttl};
use crate::observability::metrics::{get_metrics, LOOKUP_HIT, LOOKUP_MISS};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

enum Lifecycle {
    Idle,
    Running(Sweeper),
    Destroyed,
}

pub(crate) struct StoreInner<V> {
    name: String,
    entries: RwLock<HashMap<String, Entry<V>>>,
    sweep_interval: Duration,
    lifecycle: Mutex<Lifecycle>,
}

/// Key -> value store with per-entry TTL and a background expiry sweep.
///
/// The handle is cheap to clone; all clones share the same entries.
/// Entries past their deadline are invisible to readers even before the
/// sweep physically removes them.
pub struct TokenStore<V> {
    inner: Arc<StoreInner<V>>,
}

impl<V> Clone for TokenStore<V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<V> std::fmt::Debug for TokenStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("name", &self.inner.name)
            .field("sweep_interval", &self.inner.sweep_interval)
            .finish()
    }
}

impl<V> TokenStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_interval(name, DEFAULT_SWEEP_INTERVAL)
    }

    pub fn with_interval(name: impl Into<String>, sweep_interval: Duration) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                name: name.into(),
                entries: RwLock::new(HashMap::new()),
                sweep_interval: sweep_interval.max(MIN_SWEEP_INTERVAL),
                lifecycle: Mutex::new(Lifecycle::Idle),
            }),
        }
    }

    /// Start the background sweep. Only the first call has an effect.
    /// Must be called from within a tokio runtime.
    pub fn init(&self) -> &Self {
        let mut lifecycle = self.inner.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        match *lifecycle {
            Lifecycle::Idle => {
                info!(
                    "starting token store '{}', sweep every {:?}",
                    self.inner.name, self.inner.sweep_interval
                );
                let sweeper = Sweeper::spawn(Arc::downgrade(&self.inner), self.inner.sweep_interval);
                *lifecycle = Lifecycle::Running(sweeper);
            }
            Lifecycle::Running(_) => {}
            Lifecycle::Destroyed => {
                warn!("token store '{}' is destroyed, init ignored", self.inner.name);
            }
        }
        self
    }

    /// Stop the sweep and drop every entry. No sweep tick runs after this returns.
    pub async fn destroy(&self) {
        // Flipped under the entries lock so `try_put` sees either a live
        // store or a destroyed one, never an insert in between.
        let previous = {
            let mut entries = self.inner.entries.write().await;
            let previous = {
                let mut lifecycle = self.inner.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::replace(&mut *lifecycle, Lifecycle::Destroyed)
            };
            if !matches!(previous, Lifecycle::Destroyed) {
                entries.clear();
            }
            previous
        };
        match previous {
            Lifecycle::Destroyed => return,
            Lifecycle::Running(sweeper) => sweeper.stop().await,
            Lifecycle::Idle => {}
        }
        get_metrics().await.cache_entries.with_label_values(&[self.inner.name.as_str()]).set(0);
        info!("token store '{}' destroyed", self.inner.name);
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn sweep_interval(&self) -> Duration {
        self.inner.sweep_interval
    }

    pub fn is_active(&self) -> bool {
        matches!(
            *self.inner.lifecycle.lock().unwrap_or_else(PoisonError::into_inner),
            Lifecycle::Running(_)
        )
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(
            *self.inner.lifecycle.lock().unwrap_or_else(PoisonError::into_inner),
            Lifecycle::Destroyed
        )
    }

    /// Insert or overwrite `key`. Returns the key as the caller's handle.
    pub async fn put(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>) -> String {
        let key = key.into();
        let entry = Entry::new(value, ttl.into(), Instant::now());
        self.inner.entries.write().await.insert(key.clone(), entry);
        key
    }

    /// Like `put`, but refuses to write into a destroyed store.
    pub(crate) async fn try_put(&self, key: &str, value: V, ttl: Ttl) -> Option<String> {
        let entry = Entry::new(value, ttl, Instant::now());
        let mut entries = self.inner.entries.write().await;
        if self.is_destroyed() {
            return None;
        }
        entries.insert(key.to_owned(), entry);
        Some(key.to_owned())
    }

    /// Store `value` under a freshly minted opaque token.
    pub async fn issue(&self, value: V, ttl: impl Into<Ttl>) -> String {
        let entry = Entry::new(value, ttl.into(), Instant::now());
        let mut entries = self.inner.entries.write().await;
        let mut token = Uuid::new_v4().simple().to_string();
        while entries.contains_key(&token) {
            token = Uuid::new_v4().simple().to_string();
        }
        entries.insert(token.clone(), entry);
        token
    }

    /// Get value if it exists and is not expired. Does not refresh.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let found = self
            .inner
            .entries
            .read()
            .await
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone());

        let result = if found.is_some() { LOOKUP_HIT } else { LOOKUP_MISS };
        get_metrics()
            .await
            .cache_lookups
            .with_label_values(&[self.inner.name.as_str(), result])
            .inc();
        found
    }

    /// Reset the deadline of a live entry to `now + ttl`.
    pub async fn refresh(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.inner.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.refresh(now);
                true
            }
            _ => false,
        }
    }

    pub async fn inspect(&self, key: &str) -> Option<EntryInfo> {
        let now = Instant::now();
        self.inner
            .entries
            .read()
            .await
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| EntryInfo {
                ttl: entry.ttl,
                remaining: entry.remaining(now),
            })
    }

    pub async fn remove(&self, key: &str) -> bool {
        let now = Instant::now();
        self.inner
            .entries
            .write()
            .await
            .remove(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Snapshot of live keys, in no particular order.
    pub async fn list(&self) -> Vec<String> {
        let now = Instant::now();
        self.inner
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.inner.entries.write().await.clear();
        debug!("token store '{}' cleared", self.inner.name);
    }

    /// Remove every expired entry now. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        self.inner.sweep_expired().await
    }
}

impl<V> StoreInner<V> {
    pub(crate) async fn sweep_expired(&self) -> usize {
        let metrics = get_metrics().await;
        let started = Instant::now();

        let (removed, remaining) = {
            let mut entries = self.entries.write().await;
            let now = Instant::now();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            (before - entries.len(), entries.len())
        };

        let store = self.name.as_str();
        metrics.sweep_duration.with_label_values(&[store]).observe(started.elapsed().as_secs_f64());
        metrics.cache_entries.with_label_values(&[store]).set(remaining as i64);
        if removed > 0 {
            metrics.sweep_removed.with_label_values(&[store]).inc_by(removed as u64);
            debug!("store '{}': swept {} expired, {} left", store, removed, remaining);
        }
        removed
    }
}
