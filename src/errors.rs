use std::sync::Arc;

use thiserror::Error;

use crate::{token::Token, types::DynError};

/// The node was torn down; no further registration, resolution or scope
/// creation is permitted on it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("container has been disposed")]
pub struct DisposedError;

/// Errors when resolving a service.
///
/// Clone is required because resolution results are memoized as shared
/// futures, so every concurrent caller observes the same outcome.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error(transparent)]
    Disposed(#[from] DisposedError),

    /// Resolution reached the root without finding an entry
    #[error("no service registered for '{0}'")]
    NotRegistered(Token),

    /// The entry metadata names a lifetime the engine does not recognize
    #[error("unknown lifetime '{0}' in service metadata")]
    UnknownScope(Arc<str>),

    /// The factory for the service failed
    #[error("factory for '{token}' failed: {error}")]
    Factory {
        token: Token,
        error: Arc<DynError>,
    },

    /// The service resolved, but not to the requested type
    #[error("failed to downcast '{token}', required: '{required}' actual: '{actual}'")]
    Downcast {
        token: Token,
        required: &'static str,
        actual: &'static str,
    },
}

/// A single instance that failed to release during teardown
#[derive(Error, Debug, Clone)]
#[error("'{token}' failed to dispose: {error}")]
pub struct DisposeFailure {
    pub token: Token,
    pub error: Arc<DynError>,
}

/// Teardown ran to completion, but some instances failed to release.
///
/// The cascade is never aborted by a failing instance: every child scope and
/// every sibling instance is still disposed, and the failures are collected
/// here.
#[derive(Error, Debug, Clone)]
#[error("disposal completed with {} failure(s)", .failures.len())]
pub struct DisposeError {
    pub failures: Vec<DisposeFailure>,
}
