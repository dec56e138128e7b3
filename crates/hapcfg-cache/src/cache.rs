use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hapcfg_types::{Bind, TransactionId};
use tracing::debug;

use crate::object::ObjectCache;
use crate::scope::CacheScope;
use crate::version::VersionCache;

/// All caches of one client, behind a single on/off toggle.
#[derive(Debug)]
pub struct Cache {
    enabled: Arc<AtomicBool>,
    binds: ObjectCache<Bind>,
    versions: VersionCache,
}

impl Cache {
    pub fn new(enabled: bool) -> Self {
        let flag = Arc::new(AtomicBool::new(enabled));
        Self {
            binds: ObjectCache::new(flag.clone()),
            versions: VersionCache::new(flag.clone()),
            enabled: flag,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Turn the cache on or off. Turning it off also empties it, so entries
    /// from before the switch are never served after it is turned back on.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        if !enabled {
            self.clear();
        }
        debug!(enabled, "cache toggled");
    }

    pub fn binds(&self) -> &ObjectCache<Bind> {
        &self.binds
    }

    pub fn versions(&self) -> &VersionCache {
        &self.versions
    }

    /// Drop every entry of an explicit transaction.
    pub fn invalidate_transaction(&self, id: &TransactionId) {
        let scope = CacheScope::Transaction(id.clone());
        self.binds.invalidate_scope(&scope);
        self.versions.invalidate(&scope);
        debug!(transaction = %id, "transaction cache dropped");
    }

    /// Drop every entry of the committed configuration.
    pub fn invalidate_committed(&self) {
        self.binds.invalidate_scope(&CacheScope::Committed);
        self.versions.invalidate(&CacheScope::Committed);
    }

    pub fn clear(&self) {
        self.binds.clear();
        self.versions.clear();
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hapcfg_types::Version;

    #[test]
    fn disabling_clears() {
        let cache = Cache::new(true);
        cache.binds().set("web", &CacheScope::Committed, Bind::new("a", "h", Some(1)));
        cache.versions().set(&CacheScope::Committed, Version::new(2));

        cache.set_enabled(false);
        assert!(!cache.enabled());
        assert!(cache.binds().is_empty());

        cache.set_enabled(true);
        assert_eq!(cache.binds().get_one("web", "a", &CacheScope::Committed), None);
        assert_eq!(cache.versions().get(&CacheScope::Committed), None);
    }

    #[test]
    fn writes_racing_a_disable_leave_it_empty() {
        let cache = Cache::new(true);
        let stop = AtomicBool::new(false);
        std::thread::scope(|s| {
            s.spawn(|| {
                let mut port = 1;
                while !stop.load(Ordering::Acquire) {
                    cache.binds().set("web", &CacheScope::Committed, Bind::new("a", "h", Some(port)));
                    cache.versions().set(&CacheScope::Committed, Version::new(port));
                    port = port % 65535 + 1;
                }
            });
            let mut stale = 0;
            for _ in 0..500 {
                cache.set_enabled(false);
                if !cache.binds().is_empty() {
                    stale += 1;
                }
                cache.set_enabled(true);
            }
            stop.store(true, Ordering::Release);
            assert_eq!(stale, 0);
        });

        cache.set_enabled(false);
        cache.set_enabled(true);
        assert_eq!(cache.versions().get(&CacheScope::Committed), None);
    }

    #[test]
    fn transaction_invalidation_keeps_committed() {
        let cache = Cache::default();
        let id = TransactionId::generate();
        let txn = CacheScope::Transaction(id.clone());
        cache.binds().set("web", &txn, Bind::new("a", "h", Some(1)));
        cache.binds().set("web", &CacheScope::Committed, Bind::new("a", "h", Some(2)));
        cache.versions().set(&txn, Version::new(1));

        cache.invalidate_transaction(&id);
        assert_eq!(cache.binds().get_one("web", "a", &txn), None);
        assert_eq!(cache.versions().get(&txn), None);
        assert!(cache.binds().get_one("web", "a", &CacheScope::Committed).is_some());

        cache.invalidate_committed();
        assert_eq!(cache.binds().get_one("web", "a", &CacheScope::Committed), None);
    }
}
