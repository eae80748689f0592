//! Resolved hierarchy cache
//!
//! Keyed by hierarchy root. Reads take the shared lock; a miss resolves
//! outside any lock and inserts only if no other thread got there first, so
//! each root is stored at most once.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::registry::TypeRegistry;
use super::resolver::TypeHierarchy;
use crate::observability::{Event, Logger, TranslationMetrics};
use crate::translator::TranslationResult;

#[derive(Debug, Default)]
pub struct HierarchyCache {
    entries: RwLock<HashMap<String, Arc<TypeHierarchy>>>,
}

impl HierarchyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hierarchy containing `document_type`, resolved on first use
    pub fn get_or_resolve(
        &self,
        registry: &TypeRegistry,
        document_type: &str,
        metrics: &TranslationMetrics,
    ) -> TranslationResult<Arc<TypeHierarchy>> {
        let root = registry.root_of(document_type)?;

        if let Some(hit) = self.get(root) {
            metrics.increment_cache_hits();
            return Ok(hit);
        }

        metrics.increment_cache_misses();
        let resolved = Arc::new(TypeHierarchy::resolve_for(registry, document_type)?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let stored = entries
            .entry(root.to_string())
            .or_insert_with(|| {
                let count = resolved.len().to_string();
                Logger::info(Event::HierarchyResolved, &[("root", root), ("types", count.as_str())]);
                Arc::clone(&resolved)
            })
            .clone();
        Ok(stored)
    }

    pub fn get(&self, root: &str) -> Option<Arc<TypeHierarchy>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(root)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached hierarchy
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::registry::TypeDescriptor;
    use std::thread;

    fn registry() -> TypeRegistry {
        TypeRegistry::from_descriptors([
            TypeDescriptor::root("B"),
            TypeDescriptor::derived("C", "B"),
            TypeDescriptor::root("Other"),
        ])
        .unwrap()
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = HierarchyCache::new();
        let metrics = TranslationMetrics::new();
        let registry = registry();

        let first = cache.get_or_resolve(&registry, "C", &metrics).unwrap();
        let second = cache.get_or_resolve(&registry, "B", &metrics).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hierarchy_cache_misses, 1);
        assert_eq!(snapshot.hierarchy_cache_hits, 1);
    }

    #[test]
    fn test_one_entry_per_root() {
        let cache = HierarchyCache::new();
        let metrics = TranslationMetrics::new();
        let registry = registry();

        cache.get_or_resolve(&registry, "C", &metrics).unwrap();
        cache.get_or_resolve(&registry, "Other", &metrics).unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_resolution_stores_once() {
        let cache = Arc::new(HierarchyCache::new());
        let metrics = Arc::new(TranslationMetrics::new());
        let registry = Arc::new(registry());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let metrics = Arc::clone(&metrics);
                let registry = Arc::clone(&registry);
                thread::spawn(move || cache.get_or_resolve(&registry, "C", &metrics).unwrap())
            })
            .collect();

        let resolved: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(cache.len(), 1);
        for hierarchy in &resolved {
            assert!(Arc::ptr_eq(hierarchy, &resolved[0]));
        }
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hierarchy_cache_hits + snapshot.hierarchy_cache_misses, 8);
    }
}
