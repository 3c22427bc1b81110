//! Caching infrastructure for the result position analyzer

use crate::binding::{BindingContext, BodyResolveMode};
use dashmap::DashMap;
use lambda_hints_syntax::NodeId;

/// Cache key: the node that scopes an analysis plus the resolve mode
pub type FactKey = (NodeId, BodyResolveMode);

/// Concurrent cache of computed binding contexts
#[derive(Debug, Default)]
pub struct FactCache {
    entries: DashMap<FactKey, BindingContext>,
}

impl FactCache {
    /// Create a new cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new cache with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Get cached context
    pub fn get(&self, key: FactKey) -> Option<BindingContext> {
        self.entries.get(&key).map(|entry| entry.clone())
    }

    /// Cache a context
    pub fn insert(&self, key: FactKey, context: BindingContext) {
        self.entries.insert(key, context);
    }

    /// Cached context for `key`, computing and storing it on a miss.
    ///
    /// No shard lock is held while `compute` runs.
    pub fn get_or_compute(
        &self,
        key: FactKey,
        compute: impl FnOnce() -> BindingContext,
    ) -> BindingContext {
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let context = compute();
        self.insert(key, context.clone());
        context
    }

    /// Number of cached contexts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached context
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingSlice;

    #[test]
    fn test_get_or_compute_reuses_entry() {
        let cache = FactCache::with_capacity(4);
        let key = (NodeId::from_raw(7), BodyResolveMode::PartialWithCfa);
        let mut calls = 0;

        let first = cache.get_or_compute(key, || {
            calls += 1;
            let mut context = BindingContext::empty();
            context.record(BindingSlice::UsedAsResultOfLambda, NodeId::from_raw(8), true);
            context
        });
        let second = cache.get_or_compute(key, || {
            calls += 1;
            BindingContext::empty()
        });

        assert_eq!(calls, 1);
        assert!(first.ptr_eq(&second));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(key), None);
    }
}
