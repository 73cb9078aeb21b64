//! Shared application state for the metrelay service.

use std::sync::Arc;

use metrelay_core::error::Result;
use metrelay_core::MetricsFramework;
use metrelay_backends::build_backend;

use crate::config::ServiceConfig;

#[derive(Clone)]
pub struct AppState {
    framework: Arc<MetricsFramework>,
}

impl AppState {
    /// Build the backend, load the catalog, and register every KPI.
    /// Returns Result so main can handle startup errors gracefully.
    pub fn new(cfg: &ServiceConfig) -> Result<Self> {
        let kind = cfg.metrics.backend_kind()?;
        let backend = build_backend(kind, &cfg.metrics.namespace)?;

        let framework = Arc::new(MetricsFramework::new(backend));
        framework.load_catalog_file(&cfg.metrics.catalog)?;
        framework.register_all()?;

        tracing::info!(
            backend = kind.as_str(),
            metrics = framework.list_metrics().len(),
            "metrics framework ready"
        );

        Ok(Self { framework })
    }

    pub fn framework(&self) -> Arc<MetricsFramework> {
        Arc::clone(&self.framework)
    }
}
