//! Shared error type across metrelay crates.

use thiserror::Error;

/// Stable error codes surfaced to external callers (HTTP bodies, logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A metric with that name is already registered.
    AlreadyRegistered,
    /// No metric registered under that name.
    NotFound,
    /// Operation not valid for the metric's kind.
    InvalidOperation,
    /// A label key required by the KPI definition is absent.
    MissingLabel,
    /// A supplied label failed validation.
    InvalidLabel,
    /// The backend variant has no support for the requested capability.
    BackendNotSupported,
    /// Network delivery to a collector or gateway failed.
    Transport,
    /// Backend-internal failure (construction or mutation).
    Backend,
    /// Catalog load, validation, or lookup failed.
    Catalog,
    /// Malformed external input.
    BadRequest,
}

impl ErrorCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::AlreadyRegistered => "ALREADY_REGISTERED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InvalidOperation => "INVALID_OPERATION",
            ErrorCode::MissingLabel => "MISSING_LABEL",
            ErrorCode::InvalidLabel => "INVALID_LABEL",
            ErrorCode::BackendNotSupported => "BACKEND_NOT_SUPPORTED",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Backend => "BACKEND",
            ErrorCode::Catalog => "CATALOG",
            ErrorCode::BadRequest => "BAD_REQUEST",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetrelayError>;

/// Unified error type used by the core, the backends, and the surfaces.
#[derive(Debug, Error)]
pub enum MetrelayError {
    #[error("metric already registered: {0}")]
    AlreadyRegistered(String),
    #[error("metric not found: {0}")]
    NotFound(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("missing required label: {0}")]
    MissingLabel(String),
    #[error("invalid label: {0}")]
    InvalidLabel(String),
    #[error("backend not supported: {0}")]
    BackendNotSupported(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("backend: {0}")]
    Backend(String),
    #[error("catalog: {0}")]
    Catalog(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl MetrelayError {
    /// Map internal error to a stable external-facing code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MetrelayError::AlreadyRegistered(_) => ErrorCode::AlreadyRegistered,
            MetrelayError::NotFound(_) => ErrorCode::NotFound,
            MetrelayError::InvalidOperation(_) => ErrorCode::InvalidOperation,
            MetrelayError::MissingLabel(_) => ErrorCode::MissingLabel,
            MetrelayError::InvalidLabel(_) => ErrorCode::InvalidLabel,
            MetrelayError::BackendNotSupported(_) => ErrorCode::BackendNotSupported,
            MetrelayError::Transport(_) => ErrorCode::Transport,
            MetrelayError::Backend(_) => ErrorCode::Backend,
            MetrelayError::Catalog(_) => ErrorCode::Catalog,
            MetrelayError::BadRequest(_) => ErrorCode::BadRequest,
        }
    }
}
