//! metrelay core: backend-agnostic metric registration and dispatch.
//!
//! This crate defines the capability contracts ([`capability::Backend`],
//! [`capability::Metric`]), the KPI catalog model, the concurrency-safe
//! registry, and the orchestrating [`framework::MetricsFramework`]. It
//! intentionally carries no transport or runtime dependencies so it can be
//! reused behind any delivery surface (HTTP service, FFI, embedding).
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `MetrelayError`/`Result` so host
//! processes do not crash on malformed catalogs or bad mutations.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod capability;
pub mod error;
pub mod framework;
pub mod kpi;
pub mod normalize;
pub mod registry;

pub use capability::{Backend, LabelSet, Metric, MetricKind};
pub use error::{ErrorCode, MetrelayError, Result};
pub use framework::MetricsFramework;
pub use kpi::{Catalog, Kpi};
pub use normalize::normalize_metric_name;
pub use registry::MetricRegistry;
