use crate::resolve::types::{NodePhase, PackageId, VersionNode};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Outcome of [`ResolutionCache::reserve`].
pub enum Reservation {
    /// Another request already owns this identity.
    Existing(Arc<VersionNode>),
    /// Fresh placeholder; the caller must populate it.
    Reserved(Arc<VersionNode>),
}

/// Built nodes keyed by `name#version`. Entries are never evicted.
#[derive(Default)]
pub struct ResolutionCache {
    storage: Mutex<BTreeMap<PackageId, Arc<VersionNode>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &PackageId) -> Option<Arc<VersionNode>> {
        let res = self.storage().get(id).cloned();
        tracing::debug!(
            "Retrieve {} from cache: {}.",
            id,
            if res.is_some() { "hit" } else { "miss" }
        );
        res
    }

    pub fn add(&self, node: Arc<VersionNode>) {
        let id = node.id();
        tracing::debug!("Store {} to cache.", id);
        self.storage().insert(id, node);
    }

    /// Looks up `id` and, on a miss, publishes a reserved node for it in the
    /// same step.
    pub fn reserve(&self, id: PackageId) -> Reservation {
        let mut storage = self.storage();

        if let Some(existing) = storage.get(&id) {
            tracing::debug!("Retrieve {} from cache: hit.", id);
            return Reservation::Existing(Arc::clone(existing));
        }

        tracing::debug!("Store {} to cache.", id);
        let node = Arc::new(VersionNode::reserved(&id.name, &id.version));
        storage.insert(id, Arc::clone(&node));
        Reservation::Reserved(node)
    }

    /// Drops the entry for `id` if it is still a reservation. Populated
    /// nodes are kept.
    pub fn release(&self, id: &PackageId) -> Option<Arc<VersionNode>> {
        let mut storage = self.storage();

        match storage.get(id) {
            Some(node) if node.phase() == NodePhase::Reserved => {
                tracing::debug!("Release unfinished {} from cache.", id);
                storage.remove(id)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.storage().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage().is_empty()
    }

    fn storage(&self) -> MutexGuard<'_, BTreeMap<PackageId, Arc<VersionNode>>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A reserved node on its way to [`NodePhase::Populated`].
///
/// Dropping it before [`PendingNode::complete`] (on error, or when the
/// owning future is cancelled) takes the reservation back out of the cache.
pub(crate) struct PendingNode<'a> {
    cache: &'a ResolutionCache,
    node: Arc<VersionNode>,
}

impl<'a> PendingNode<'a> {
    pub(crate) fn new(cache: &'a ResolutionCache, node: Arc<VersionNode>) -> Self {
        PendingNode { cache, node }
    }

    pub(crate) fn complete(self, deps: Vec<Arc<VersionNode>>) -> Arc<VersionNode> {
        self.node.populate(deps);
        Arc::clone(&self.node)
    }
}

impl Drop for PendingNode<'_> {
    fn drop(&mut self) {
        if self.node.phase() == NodePhase::Reserved {
            self.cache.release(&self.node.id());
        }
    }
}
