//! Framework orchestration: catalog-driven registration and dispatch.
//!
//! The framework is the only component with business logic. It normalizes
//! names, validates labels against the owning KPI, drives idempotent bulk
//! registration, and delegates mutation and push to the backend.

use std::sync::{Arc, OnceLock};

use crate::capability::{Backend, LabelSet, Metric, MetricKind};
use crate::error::{MetrelayError, Result};
use crate::kpi::{Catalog, Kpi};
use crate::normalize::normalize_metric_name;
use crate::registry::MetricRegistry;

/// Buckets handed to `new_histogram` for catalog entries of Histogram kind.
/// Seconds-scale latency bounds.
const DEFAULT_BUCKETS: [f64; 7] = [0.005, 0.025, 0.1, 0.5, 1.0, 5.0, 10.0];

/// Placeholder label value used by [`MetricsFramework::initialize_defaults`].
fn default_labels(keys: &[String]) -> LabelSet {
    keys.iter()
        .map(|k| (k.clone(), format!("default_{k}")))
        .collect()
}

/// Orchestrator tying the catalog, the registry, and one backend together.
///
/// The catalog is load-once: a second `load_catalog` is rejected rather than
/// replacing the first, so dispatch never observes a definition swap.
pub struct MetricsFramework {
    registry: MetricRegistry,
    backend: Arc<dyn Backend>,
    catalog: OnceLock<Catalog>,
}

impl MetricsFramework {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            registry: MetricRegistry::new(),
            backend,
            catalog: OnceLock::new(),
        }
    }

    /// Store the parsed catalog. Fails with `Catalog` if one is already
    /// loaded; unload is not supported.
    pub fn load_catalog(&self, catalog: Catalog) -> Result<()> {
        let count = catalog.len();
        self.catalog
            .set(catalog)
            .map_err(|_| MetrelayError::Catalog("catalog already loaded".into()))?;
        tracing::info!(kpis = count, "catalog loaded");
        Ok(())
    }

    /// Convenience: read, parse, and store a catalog file.
    pub fn load_catalog_file(&self, path: &str) -> Result<()> {
        self.load_catalog(Catalog::from_file(path)?)
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.get()
    }

    fn catalog_required(&self) -> Result<&Catalog> {
        self.catalog
            .get()
            .ok_or_else(|| MetrelayError::Catalog("catalog not loaded".into()))
    }

    /// Idempotent bulk registration over every catalog entry.
    ///
    /// Names already present are skipped silently. The first backend
    /// construction or registry error aborts the run; entries registered
    /// before the failure stay in place (no rollback). A concurrent run
    /// losing the per-name race is treated as already-satisfied.
    pub fn register_all(&self) -> Result<()> {
        let catalog = self.catalog_required()?;
        for kpi in catalog.iter() {
            let name = kpi.metric_name();
            if self.registry.get(&name).is_ok() {
                tracing::debug!(%name, "already registered, skipping");
                continue;
            }

            let metric = self.new_metric(kpi, &name)?;
            match self.registry.register(&name, metric) {
                Ok(()) => tracing::info!(%name, kind = %kpi.kind, "registered metric"),
                // lost a concurrent race for this name: already satisfied
                Err(MetrelayError::AlreadyRegistered(_)) => {
                    tracing::debug!(%name, "registered concurrently elsewhere");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn new_metric(&self, kpi: &Kpi, name: &str) -> Result<Arc<dyn Metric>> {
        match kpi.kind {
            MetricKind::Counter => {
                self.backend.new_counter(name, &kpi.description, &kpi.object)
            }
            MetricKind::Gauge => self.backend.new_gauge(name, &kpi.description, &kpi.object),
            MetricKind::Histogram => self.backend.new_histogram(
                name,
                &kpi.description,
                &kpi.object,
                &DEFAULT_BUCKETS,
            ),
        }
    }

    /// Every declared label key of the owning KPI must be present; extra
    /// keys are permitted and ignored.
    fn validate_labels(&self, metric_name: &str, labels: &LabelSet) -> Result<()> {
        let catalog = self.catalog_required()?;
        let kpi = catalog.find(metric_name).ok_or_else(|| {
            MetrelayError::Catalog(format!("no KPI definition for metric: {metric_name}"))
        })?;
        for required in &kpi.object {
            if !labels.contains_key(required) {
                return Err(MetrelayError::MissingLabel(required.clone()));
            }
        }
        Ok(())
    }

    fn resolve(&self, name: &str, labels: &LabelSet) -> Result<Arc<dyn Metric>> {
        let metric_name = normalize_metric_name(name);
        let metric = self.registry.get(&metric_name)?;
        self.validate_labels(&metric_name, labels)?;
        Ok(metric)
    }

    /// Increment the named metric by 1.
    pub fn increment(&self, name: &str, labels: &LabelSet) -> Result<()> {
        self.resolve(name, labels)?.inc(labels)
    }

    /// Decrement the named metric by 1.
    pub fn decrement(&self, name: &str, labels: &LabelSet) -> Result<()> {
        self.resolve(name, labels)?.dec(labels)
    }

    /// Add `value` to the named metric.
    pub fn add_to(&self, name: &str, value: f64, labels: &LabelSet) -> Result<()> {
        self.resolve(name, labels)?.add(value, labels)
    }

    /// Set the named metric to `value`.
    pub fn set(&self, name: &str, value: f64, labels: &LabelSet) -> Result<()> {
        self.resolve(name, labels)?.set(value, labels)
    }

    /// Shared handle to a registered metric, by display or normalized name.
    pub fn get_metric(&self, name: &str) -> Result<Arc<dyn Metric>> {
        self.registry.get(&normalize_metric_name(name))
    }

    /// Snapshot of registered metric names.
    pub fn list_metrics(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Remove a registered metric, releasing its instance.
    pub fn unregister_metric(&self, name: &str) -> Result<()> {
        self.registry.unregister(&normalize_metric_name(name))
    }

    /// Apply a zero-value mutation to every catalog entry so each series
    /// exists before the first real measurement. Entries of a kind the
    /// initializer does not handle are skipped with a diagnostic.
    pub fn initialize_defaults(&self) -> Result<()> {
        let catalog = self.catalog_required()?;
        for kpi in catalog.iter() {
            let labels = default_labels(&kpi.object);
            match kpi.kind {
                MetricKind::Counter => self.add_to(&kpi.display_name, 0.0, &labels)?,
                MetricKind::Gauge => self.set(&kpi.display_name, 0.0, &labels)?,
                MetricKind::Histogram => {
                    tracing::warn!(
                        name = %kpi.metric_name(),
                        kind = %kpi.kind,
                        "skipping default initialization for unsupported kind"
                    );
                }
            }
        }
        Ok(())
    }

    /// Flush collected metrics to a push acceptor. A failure here is an
    /// explicit error to the caller but leaves registry and catalog intact.
    pub fn push_metrics(&self, gateway_url: &str, job_name: &str) -> Result<()> {
        self.backend.push_to_gateway(gateway_url, job_name)
    }

    /// Initialize defaults, then push.
    pub fn push_with_defaults(&self, gateway_url: &str, job_name: &str) -> Result<()> {
        self.initialize_defaults()?;
        self.push_metrics(gateway_url, job_name)
    }
}
