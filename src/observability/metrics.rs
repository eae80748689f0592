//! Translation counters
//!
//! Counters only, monotonic, reset only when the owning context is created.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every pipeline of a query context.
///
/// Relaxed ordering throughout; counters are independent of one another.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Pipelines translated successfully
    translations: AtomicU64,
    /// Translation failures, including stages rejected on append
    rejections: AtomicU64,
    /// Type filters omitted for lack of server support
    degraded_type_filters: AtomicU64,
    /// Queries handed to an executor
    executions: AtomicU64,
    hierarchy_cache_hits: AtomicU64,
    hierarchy_cache_misses: AtomicU64,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_translations(&self) {
        self.translations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejections(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_degraded_type_filters(&self) {
        self.degraded_type_filters.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_executions(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hits(&self) {
        self.hierarchy_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_misses(&self) {
        self.hierarchy_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            translations: self.translations.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            degraded_type_filters: self.degraded_type_filters.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            hierarchy_cache_hits: self.hierarchy_cache_hits.load(Ordering::Relaxed),
            hierarchy_cache_misses: self.hierarchy_cache_misses.load(Ordering::Relaxed),
        }
    }

    /// Snapshot rendered as a JSON object
    pub fn to_json(&self) -> String {
        let snapshot = self.snapshot();
        serde_json::json!({
            "translations": snapshot.translations,
            "rejections": snapshot.rejections,
            "degraded_type_filters": snapshot.degraded_type_filters,
            "executions": snapshot.executions,
            "hierarchy_cache_hits": snapshot.hierarchy_cache_hits,
            "hierarchy_cache_misses": snapshot.hierarchy_cache_misses,
        })
        .to_string()
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub translations: u64,
    pub rejections: u64,
    pub degraded_type_filters: u64,
    pub executions: u64,
    pub hierarchy_cache_hits: u64,
    pub hierarchy_cache_misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        assert_eq!(TranslationMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let metrics = TranslationMetrics::new();
        metrics.increment_translations();
        metrics.increment_translations();
        metrics.increment_rejections();
        metrics.increment_cache_misses();
        metrics.increment_cache_hits();
        metrics.increment_cache_hits();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.translations, 2);
        assert_eq!(snapshot.rejections, 1);
        assert_eq!(snapshot.hierarchy_cache_misses, 1);
        assert_eq!(snapshot.hierarchy_cache_hits, 2);
        assert_eq!(snapshot.executions, 0);
    }

    #[test]
    fn test_to_json() {
        let metrics = TranslationMetrics::new();
        metrics.increment_executions();
        let parsed: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(parsed["executions"], 1);
        assert_eq!(parsed["translations"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(TranslationMetrics::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let m = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.increment_translations();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().translations, 800);
    }
}
