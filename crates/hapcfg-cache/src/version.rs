use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use hapcfg_types::Version;

use crate::scope::CacheScope;

/// Last known version of each scope.
#[derive(Debug)]
pub struct VersionCache {
    versions: RwLock<HashMap<CacheScope, Version>>,
    enabled: Arc<AtomicBool>,
}

impl VersionCache {
    pub fn new(enabled: Arc<AtomicBool>) -> Self {
        Self {
            versions: RwLock::new(HashMap::new()),
            enabled,
        }
    }

    pub fn get(&self, scope: &CacheScope) -> Option<Version> {
        if !self.enabled.load(Ordering::Acquire) {
            return None;
        }
        self.versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(scope)
            .copied()
    }

    pub fn set(&self, scope: &CacheScope, version: Version) {
        let mut versions = self.versions.write().unwrap_or_else(PoisonError::into_inner);
        // checked under the lock so a concurrent disable-and-clear wins
        if self.enabled.load(Ordering::Acquire) {
            versions.insert(scope.clone(), version);
        }
    }

    pub fn invalidate(&self, scope: &CacheScope) {
        self.versions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(scope);
    }

    pub fn clear(&self) {
        self.versions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_invalidate() {
        let c = VersionCache::new(Arc::new(AtomicBool::new(true)));
        let scope = CacheScope::Committed;
        assert_eq!(c.get(&scope), None);
        c.set(&scope, Version::new(4));
        assert_eq!(c.get(&scope), Some(Version::new(4)));
        c.invalidate(&scope);
        assert_eq!(c.get(&scope), None);
    }
}
