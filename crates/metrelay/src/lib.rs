//! Top-level facade crate for metrelay.
//!
//! Re-exports the core framework and the backend variants so embedders can
//! depend on a single crate.

pub mod core {
    pub use metrelay_core::*;
}

pub mod backends {
    pub use metrelay_backends::*;
}

pub use metrelay_backends::{build_backend, BackendKind};
pub use metrelay_core::{Catalog, LabelSet, MetricKind, MetricsFramework, MetrelayError};
