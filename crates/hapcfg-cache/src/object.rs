use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use hapcfg_types::Bind;

use crate::scope::CacheScope;

/// An object addressable by a name unique within its section.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Bind {
    fn key(&self) -> &str {
        &self.name
    }
}

struct SectionEntry<T> {
    items: HashMap<String, T>,
    list: Option<Vec<T>>,
}

impl<T> Default for SectionEntry<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            list: None,
        }
    }
}

type EntryKey = (CacheScope, String);

/// Cache for one kind of object.
///
/// Values are cloned in and out. All methods are infallible; a poisoned lock
/// is recovered because a cache entry is always safe to rebuild.
pub struct ObjectCache<T> {
    entries: RwLock<HashMap<EntryKey, SectionEntry<T>>>,
    enabled: Arc<AtomicBool>,
}

impl<T: Clone + Keyed> ObjectCache<T> {
    /// Create a cache that follows the shared `enabled` toggle.
    pub fn new(enabled: Arc<AtomicBool>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            enabled,
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// The write lock, taken only while the cache is on. The flag is read
    /// under the lock so nothing lands after a disabling clear.
    fn write_enabled(&self) -> Option<RwLockWriteGuard<'_, HashMap<EntryKey, SectionEntry<T>>>> {
        let entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        self.is_enabled().then_some(entries)
    }

    /// The cached ordered list for a section, if any.
    pub fn get_all(&self, section: &str, scope: &CacheScope) -> Option<Vec<T>> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(scope.clone(), section.to_string()))
            .and_then(|entry| entry.list.clone())
    }

    /// The cached object `name` in a section, if any.
    pub fn get_one(&self, section: &str, name: &str, scope: &CacheScope) -> Option<T> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(scope.clone(), section.to_string()))
            .and_then(|entry| entry.items.get(name).cloned())
    }

    /// Cache one object. The section's list entry is dropped.
    pub fn set(&self, section: &str, scope: &CacheScope, value: T) {
        let Some(mut entries) = self.write_enabled() else {
            return;
        };
        let entry = entries
            .entry((scope.clone(), section.to_string()))
            .or_default();
        entry.list = None;
        entry.items.insert(value.key().to_string(), value);
    }

    /// Cache a section's full list and seed the per-name entries from it.
    pub fn set_all(&self, section: &str, scope: &CacheScope, values: Vec<T>) {
        let Some(mut entries) = self.write_enabled() else {
            return;
        };
        let entry = entries
            .entry((scope.clone(), section.to_string()))
            .or_default();
        entry.items = values
            .iter()
            .map(|value| (value.key().to_string(), value.clone()))
            .collect();
        entry.list = Some(values);
    }

    /// Drop the object `name`. The section's list entry is dropped too.
    pub fn delete(&self, section: &str, name: &str, scope: &CacheScope) {
        if !self.is_enabled() {
            return;
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(&(scope.clone(), section.to_string())) {
            entry.list = None;
            entry.items.remove(name);
        }
    }

    /// Drop the list entry of a section, keeping per-name entries.
    pub fn invalidate_list(&self, section: &str, scope: &CacheScope) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(&(scope.clone(), section.to_string())) {
            entry.list = None;
        }
    }

    /// Drop every entry in `scope`.
    pub fn invalidate_scope(&self, scope: &CacheScope) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|(entry_scope, _), _| entry_scope != scope);
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached sections across all scopes.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> std::fmt::Debug for ObjectCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sections = self
            .entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or_default();
        f.debug_struct("ObjectCache")
            .field("sections", &sections)
            .field("enabled", &self.enabled.load(Ordering::Relaxed))
            .finish()
    }
}
