use pom_core::{BuildError, DocumentId};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the project cache.
///
/// `Cancelled` is a distinct terminal state, not a failure: it is never
/// logged as severe and never recorded as a problem.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Every waiter on the build was released before it completed.
    #[error("build cancelled")]
    Cancelled,

    /// The build failed in a way that leaves nothing to cache; the error is
    /// shared by all waiters of the task.
    #[error("{0}")]
    Build(Arc<BuildError>),

    /// The document provider knows nothing about this identity.
    #[error("no document available for {0}")]
    MissingDocument(DocumentId),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
