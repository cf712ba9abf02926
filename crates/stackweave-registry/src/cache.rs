//! Module contract cache using moka.
//!
//! TinyLFU admission, bounded entry count, fixed time-to-live. Entries are
//! shared `Arc<ModuleIO>` values and never mutated in place.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use stackweave_common::config::RegistryConfig;
use stackweave_common::types::{ModuleIO, ModuleKey};

use crate::client::RegistryError;

/// Bounded cache of resolved module contracts, keyed by module identity.
///
/// Cloning is cheap and yields a handle to the same underlying store.
#[derive(Clone)]
pub struct ModuleCache {
    cache: Cache<ModuleKey, Arc<ModuleIO>>,
}

impl ModuleCache {
    /// Creates a cache holding at most `max_entries` contracts for `ttl` each.
    #[must_use]
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Creates a cache sized by the registry configuration.
    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.cache_capacity, config.cache_ttl())
    }

    /// Returns the cached contract for `key`.
    pub fn get(&self, key: &ModuleKey) -> Option<Arc<ModuleIO>> {
        self.cache.get(key)
    }

    /// Stores a contract for `key`.
    pub fn insert(&self, key: ModuleKey, io: Arc<ModuleIO>) {
        self.cache.insert(key, io);
    }

    /// Drops the contract for `key`, forcing the next lookup to fetch.
    pub fn invalidate(&self, key: &ModuleKey) {
        self.cache.invalidate(key);
    }

    /// Drops every contract.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the cached contract or runs `fetch` to produce it.
    ///
    /// Concurrent callers for the same key wait on a single `fetch`. Errors
    /// are returned to every waiter and are not cached.
    pub(crate) fn get_or_fetch<F>(
        &self,
        key: ModuleKey,
        fetch: F,
    ) -> Result<Arc<ModuleIO>, Arc<RegistryError>>
    where
        F: FnOnce() -> Result<Arc<ModuleIO>, RegistryError>,
    {
        self.cache.try_get_with(key, fetch)
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

impl std::fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> ModuleKey {
        ModuleKey {
            namespace: "acme".into(),
            name: name.into(),
            provider: "aws".into(),
        }
    }

    #[test]
    fn insert_and_get() {
        let cache = ModuleCache::new(10, Duration::from_secs(60));
        let io = Arc::new(ModuleIO::default());
        cache.insert(key("vpc"), Arc::clone(&io));
        assert!(cache.get(&key("vpc")).is_some());
        assert!(cache.get(&key("sg")).is_none());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = ModuleCache::new(10, Duration::from_secs(60));
        cache.insert(key("vpc"), Arc::new(ModuleIO::default()));
        cache.invalidate(&key("vpc"));
        assert!(cache.get(&key("vpc")).is_none());
    }

    #[test]
    fn clones_share_storage() {
        let cache = ModuleCache::new(10, Duration::from_secs(60));
        let handle = cache.clone();
        handle.insert(key("db"), Arc::new(ModuleIO::default()));
        assert!(cache.get(&key("db")).is_some());
        cache.clear();
        assert!(handle.get(&key("db")).is_none());
    }

    #[test]
    fn failed_fetch_is_not_cached() {
        let cache = ModuleCache::new(10, Duration::from_secs(60));
        let first = cache.get_or_fetch(key("vpc"), || {
            Err(RegistryError::Unavailable("down".into()))
        });
        assert!(first.is_err());
        let second = cache.get_or_fetch(key("vpc"), || Ok(Arc::new(ModuleIO::default())));
        assert!(second.is_ok());
    }
}
