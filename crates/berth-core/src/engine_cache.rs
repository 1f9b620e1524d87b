//! Engine group and cache.
//!
//! An [`EngineGroup`] creates and runs engines that share platform
//! resources. An [`EngineCache`] maps stable identifiers to running
//! engines so they can be reused across hosts; engines that reach a
//! delegate through either path are owned here, never by the delegate.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::host::HostContext;

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

/// Creates engines that share platform resources.
#[derive(Debug)]
pub struct EngineGroup {
    id: u64,
    spawned: Mutex<Vec<Weak<Engine>>>,
}

impl EngineGroup {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            spawned: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Create and run an engine inside this group.
    pub fn create_and_run_engine(
        &self,
        context: &HostContext,
    ) -> Result<Arc<Engine>, EngineError> {
        let engine = Engine::create_internal(context, Some(self.id))?;
        let mut spawned = self
            .spawned
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        spawned.retain(|weak| weak.strong_count() > 0);
        spawned.push(Arc::downgrade(&engine));
        info!(
            group_id = self.id,
            engine_id = engine.id(),
            live = spawned.len(),
            "engine spawned in group"
        );
        Ok(engine)
    }

    /// Number of group engines still alive.
    #[must_use]
    pub fn live_engines(&self) -> usize {
        let mut spawned = self
            .spawned
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        spawned.retain(|weak| weak.strong_count() > 0);
        spawned.len()
    }
}

impl Default for EngineGroup {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier-keyed registry of running engines, shared across delegates.
#[derive(Debug, Default)]
pub struct EngineCache {
    entries: RwLock<BTreeMap<String, Arc<Engine>>>,
}

impl EngineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an engine under an identifier, replacing any previous entry.
    pub fn put(&self, id: impl Into<String>, engine: Arc<Engine>) {
        let id = id.into();
        debug!(cache_id = %id, engine_id = engine.id(), "engine cached");
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(id, engine);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Engine>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        entries.get(id).map(Arc::clone)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Remove an entry, returning the engine if it was cached.
    pub fn remove(&self, id: &str) -> Option<Arc<Engine>> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.remove(id)
    }

    pub fn clear(&self) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers currently cached, in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_engines_share_the_group_id() {
        let group = EngineGroup::new();
        let context = HostContext::default();
        let a = group.create_and_run_engine(&context).unwrap();
        let b = group.create_and_run_engine(&context).unwrap();
        assert_eq!(a.group_id(), Some(group.id()));
        assert_eq!(b.group_id(), Some(group.id()));
        assert_ne!(a.id(), b.id());
        assert_eq!(group.live_engines(), 2);
    }

    #[test]
    fn group_forgets_dropped_engines() {
        let group = EngineGroup::new();
        let context = HostContext::default();
        let engine = group.create_and_run_engine(&context).unwrap();
        assert_eq!(group.live_engines(), 1);
        drop(engine);
        assert_eq!(group.live_engines(), 0);
    }

    #[test]
    fn cache_round_trip() {
        let cache = EngineCache::new();
        let engine = Engine::create(&HostContext::default()).unwrap();
        assert!(cache.is_empty());

        cache.put("main", Arc::clone(&engine));
        assert!(cache.contains("main"));
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get("main").unwrap(), &engine));

        let removed = cache.remove("main").unwrap();
        assert!(Arc::ptr_eq(&removed, &engine));
        assert!(cache.is_empty());
    }

    #[test]
    fn put_replaces_previous_entry() {
        let cache = EngineCache::new();
        let context = HostContext::default();
        let first = Engine::create(&context).unwrap();
        let second = Engine::create(&context).unwrap();
        cache.put("main", first);
        cache.put("main", Arc::clone(&second));
        assert!(Arc::ptr_eq(&cache.get("main").unwrap(), &second));
        assert_eq!(cache.ids(), vec!["main".to_string()]);
    }

    #[test]
    fn get_missing_id_is_none() {
        let cache = EngineCache::new();
        assert!(cache.get("missing").is_none());
        assert!(cache.remove("missing").is_none());
    }
}
