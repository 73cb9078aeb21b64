//! Backend capability contracts.
//!
//! Two capability sets tie the framework to a delivery mechanism:
//! [`Metric`] mutates a single named measurement, [`Backend`] constructs
//! typed metric instances and flushes them outward. Variants are selected
//! once at construction and dispatched through `Arc<dyn Backend>` /
//! `Arc<dyn Metric>`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::Result;

/// Label key/value pairs attached to a single mutation.
pub type LabelSet = HashMap<String, String>;

/// The fundamental kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    /// Name used in catalog files and debug output.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "Counter",
            MetricKind::Gauge => "Gauge",
            MetricKind::Histogram => "Histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single live metric instance bound to one backend, one name, one kind.
///
/// Operations that are not meaningful for the concrete kind (`set` on a
/// Counter, `observe` on a Counter or Gauge) fail with `InvalidOperation`;
/// that is a capability gap, not a transient error.
pub trait Metric: Send + Sync {
    /// Increment by 1.
    fn inc(&self, labels: &LabelSet) -> Result<()>;
    /// Decrement by 1.
    fn dec(&self, labels: &LabelSet) -> Result<()>;
    /// Add an arbitrary delta.
    fn add(&self, value: f64, labels: &LabelSet) -> Result<()>;
    /// Set to an absolute value.
    fn set(&self, value: f64, labels: &LabelSet) -> Result<()>;
    /// Record a sample observation.
    fn observe(&self, value: f64, labels: &LabelSet) -> Result<()>;
    /// The kind this instance was created as.
    fn kind(&self) -> MetricKind;
}

/// Constructs typed metric instances and delivers them outward.
pub trait Backend: Send + Sync {
    fn new_counter(
        &self,
        name: &str,
        description: &str,
        label_keys: &[String],
    ) -> Result<Arc<dyn Metric>>;

    fn new_gauge(
        &self,
        name: &str,
        description: &str,
        label_keys: &[String],
    ) -> Result<Arc<dyn Metric>>;

    /// May fail with `BackendNotSupported` when the variant has no histogram
    /// support.
    fn new_histogram(
        &self,
        name: &str,
        description: &str,
        label_keys: &[String],
        buckets: &[f64],
    ) -> Result<Arc<dyn Metric>>;

    /// Flush collected state to a push acceptor. Blocking and bounded; must
    /// never be called while holding the registry lock.
    fn push_to_gateway(&self, gateway_url: &str, job_name: &str) -> Result<()>;
}
