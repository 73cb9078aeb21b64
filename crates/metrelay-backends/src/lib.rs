//! Concrete backend variants for the metrelay framework.
//!
//! Two variants satisfy the core capability contracts: a pull-style
//! Prometheus collector (in-process state, explicit Pushgateway flush) and a
//! push-style DogStatsD client (one datagram per mutation). Selection is an
//! explicit [`BackendKind`]; unknown kinds fail immediately instead of
//! compiling out a branch.

use std::str::FromStr;
use std::sync::Arc;

use metrelay_core::capability::Backend;
use metrelay_core::error::{MetrelayError, Result};

pub mod datadog;
pub mod prometheus;

pub use self::datadog::DatadogBackend;
pub use self::prometheus::PrometheusBackend;

/// Enumerated backend choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Prometheus,
    Datadog,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Prometheus => "prometheus",
            BackendKind::Datadog => "datadog",
        }
    }
}

impl FromStr for BackendKind {
    type Err = MetrelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prometheus" => Ok(BackendKind::Prometheus),
            "datadog" => Ok(BackendKind::Datadog),
            other => Err(MetrelayError::BackendNotSupported(other.to_string())),
        }
    }
}

/// Construct the selected backend variant.
///
/// `namespace` prefixes every series on the push-style variant; the
/// pull-style variant scopes series through its private registry instead.
pub fn build_backend(kind: BackendKind, namespace: &str) -> Result<Arc<dyn Backend>> {
    match kind {
        BackendKind::Prometheus => Ok(Arc::new(PrometheusBackend::new())),
        BackendKind::Datadog => Ok(Arc::new(DatadogBackend::new(namespace)?)),
    }
}
