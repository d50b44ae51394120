use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::error::CacheError;
use crate::cache::token::Ttl;
use crate::cache::token_store::{TokenStore, DEFAULT_SWEEP_INTERVAL};
use crate::config::metadata::MetadataStore;
use crate::observability::metrics::get_metrics;

pub const META_VERSION_KEY: &str = "cache.version";
pub const META_LIBRARIES_KEY: &str = "cache.libraries";

/// A registered library: its own store plus the TTL applied by `set`.
struct Library<V> {
    store: TokenStore<V>,
    ttl: Ttl,
}

/// Named libraries of token stores, each with its own default TTL.
///
/// The registry lock is only used to locate a library. It is released
/// before any call into the library's store.
pub struct CacheManager<V> {
    libraries: RwLock<HashMap<String, Library<V>>>,
    sweep_interval: Duration,
}

impl<V> Default for CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    /// Sweep interval used by every store this manager creates.
    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            libraries: RwLock::new(HashMap::new()),
            sweep_interval,
        }
    }

    /// Register `name` with its default TTL. A name can only be registered once.
    pub async fn register_library(&self, name: &str, ttl: impl Into<Ttl>) -> Result<(), CacheError> {
        if name.is_empty() {
            return Err(CacheError::EmptyLibraryName);
        }
        let ttl = ttl.into();

        let count = {
            let mut libraries = self.libraries.write().await;
            if libraries.contains_key(name) {
                return Err(CacheError::LibraryExists(name.to_owned()));
            }
            let store = TokenStore::with_interval(name, self.sweep_interval);
            store.init();
            libraries.insert(name.to_owned(), Library { store, ttl });
            libraries.len()
        };

        get_metrics().await.cache_libraries.set(count as i64);
        info!("library '{}' registered, ttl {}s", name, ttl.as_secs());
        Ok(())
    }

    /// Store `value` under `key` in `library` with the library's TTL.
    pub async fn set(&self, library: &str, key: &str, value: V) -> Result<(), CacheError> {
        if library.is_empty() {
            return Err(CacheError::EmptyLibraryName);
        }
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        let (store, ttl) = self
            .lookup(library)
            .await
            .ok_or_else(|| CacheError::LibraryNotFound(library.to_owned()))?;

        if store.try_put(key, value, ttl).await.is_none() {
            warn!("library '{}' has no live store", library);
            return Err(CacheError::StoreUnavailable(library.to_owned()));
        }
        Ok(())
    }

    pub async fn get(&self, library: &str, key: &str) -> Option<V> {
        let (store, _) = self.lookup(library).await?;
        store.get(key).await
    }

    pub async fn refresh(&self, library: &str, key: &str) -> bool {
        match self.lookup(library).await {
            Some((store, _)) => store.refresh(key).await,
            None => false,
        }
    }

    pub async fn remove(&self, library: &str, key: &str) -> bool {
        match self.lookup(library).await {
            Some((store, _)) => store.remove(key).await,
            None => false,
        }
    }

    /// Live keys of `library`; empty when the library is unknown.
    pub async fn keys(&self, library: &str) -> Vec<String> {
        match self.lookup(library).await {
            Some((store, _)) => store.list().await,
            None => Vec::new(),
        }
    }

    /// Empty the library's store. The registration stays.
    pub async fn clear(&self, library: &str) {
        if let Some((store, _)) = self.lookup(library).await {
            store.clear().await;
        }
    }

    /// Store handle of `library`, for callers needing store-level operations.
    pub async fn store(&self, library: &str) -> Option<TokenStore<V>> {
        self.lookup(library).await.map(|(store, _)| store)
    }

    pub async fn libraries(&self) -> Vec<String> {
        let mut names: Vec<String> = self.libraries.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn library_ttl(&self, library: &str) -> Option<Ttl> {
        self.lookup(library).await.map(|(_, ttl)| ttl)
    }

    /// Unregister `library` and destroy its store.
    pub async fn remove_library(&self, library: &str) -> bool {
        let (removed, count) = {
            let mut libraries = self.libraries.write().await;
            let removed = libraries.remove(library);
            (removed, libraries.len())
        };
        let Some(removed) = removed else {
            return false;
        };
        removed.store.destroy().await;
        get_metrics().await.cache_libraries.set(count as i64);
        info!("library '{}' removed", library);
        true
    }

    /// Destroy every library store. Registrations stay, further `set`
    /// calls report `StoreUnavailable`.
    pub async fn shutdown(&self) {
        let stores: Vec<TokenStore<V>> = self
            .libraries
            .read()
            .await
            .values()
            .map(|library| library.store.clone())
            .collect();
        for store in stores {
            store.destroy().await;
        }
        info!("cache manager shut down");
    }

    /// Write the manager's version and library names through `meta`.
    pub async fn record_metadata(&self, meta: &dyn MetadataStore) -> Result<()> {
        meta.set_value(META_VERSION_KEY, env!("CARGO_PKG_VERSION"))?;
        meta.set_value(META_LIBRARIES_KEY, &self.libraries().await.join(","))?;
        Ok(())
    }

    async fn lookup(&self, library: &str) -> Option<(TokenStore<V>, Ttl)> {
        self.libraries
            .read()
            .await
            .get(library)
            .map(|library| (library.store.clone(), library.ttl))
    }
}
