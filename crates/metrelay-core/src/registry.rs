//! Concurrency-safe name → metric-instance store.
//!
//! The map behind a single reader/writer lock is the only shared mutable
//! state in the core. Reads (`get`, `list`) run concurrently; writes
//! (`register`, `unregister`) are exclusive. No I/O happens under the lock.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::capability::Metric;
use crate::error::{MetrelayError, Result};

/// Registry of live metric instances keyed by normalized name.
#[derive(Default)]
pub struct MetricRegistry {
    metrics: RwLock<HashMap<String, Arc<dyn Metric>>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a metric under `name`. The first writer for a given name wins;
    /// a second insert fails with `AlreadyRegistered`.
    pub fn register(&self, name: &str, metric: Arc<dyn Metric>) -> Result<()> {
        let mut map = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(name) {
            return Err(MetrelayError::AlreadyRegistered(name.to_string()));
        }
        map.insert(name.to_string(), metric);
        Ok(())
    }

    /// Shared handle to the metric registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Metric>> {
        let map = self.metrics.read().unwrap_or_else(PoisonError::into_inner);
        map.get(name)
            .cloned()
            .ok_or_else(|| MetrelayError::NotFound(name.to_string()))
    }

    /// Snapshot of registered names. No ordering guarantee.
    pub fn list(&self) -> Vec<String> {
        let map = self.metrics.read().unwrap_or_else(PoisonError::into_inner);
        map.keys().cloned().collect()
    }

    /// Remove the metric registered under `name`, releasing the instance.
    pub fn unregister(&self, name: &str) -> Result<()> {
        let mut map = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        match map.remove(name) {
            Some(_) => Ok(()),
            None => Err(MetrelayError::NotFound(name.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        let map = self.metrics.read().unwrap_or_else(PoisonError::into_inner);
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::capability::{LabelSet, MetricKind};

    struct StubMetric;

    impl Metric for StubMetric {
        fn inc(&self, _labels: &LabelSet) -> Result<()> {
            Ok(())
        }
        fn dec(&self, _labels: &LabelSet) -> Result<()> {
            Ok(())
        }
        fn add(&self, _value: f64, _labels: &LabelSet) -> Result<()> {
            Ok(())
        }
        fn set(&self, _value: f64, _labels: &LabelSet) -> Result<()> {
            Ok(())
        }
        fn observe(&self, _value: f64, _labels: &LabelSet) -> Result<()> {
            Ok(())
        }
        fn kind(&self) -> MetricKind {
            MetricKind::Counter
        }
    }

    #[test]
    fn register_then_duplicate_fails() {
        let reg = MetricRegistry::new();
        reg.register("a", Arc::new(StubMetric)).unwrap();
        let err = reg.register("a", Arc::new(StubMetric)).unwrap_err();
        assert!(matches!(err, MetrelayError::AlreadyRegistered(_)));
    }

    #[test]
    fn get_after_unregister_fails() {
        let reg = MetricRegistry::new();
        reg.register("a", Arc::new(StubMetric)).unwrap();
        assert!(reg.get("a").is_ok());
        reg.unregister("a").unwrap();
        let err = reg.get("a").err().unwrap();
        assert!(matches!(err, MetrelayError::NotFound(_)));
    }

    #[test]
    fn unregister_absent_fails() {
        let reg = MetricRegistry::new();
        assert!(matches!(
            reg.unregister("nope").unwrap_err(),
            MetrelayError::NotFound(_)
        ));
    }

    #[test]
    fn list_returns_all_names() {
        let reg = MetricRegistry::new();
        for name in ["a", "b", "c"] {
            reg.register(name, Arc::new(StubMetric)).unwrap();
        }
        let mut names = reg.list();
        names.sort();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn concurrent_registration_single_winner() {
        let reg = Arc::new(MetricRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let reg = Arc::clone(&reg);
            handles.push(std::thread::spawn(move || {
                reg.register("contested", Arc::new(StubMetric)).is_ok()
            }));
        }
        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);
        assert_eq!(reg.len(), 1);
    }
}
