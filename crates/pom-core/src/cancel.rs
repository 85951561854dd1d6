use crate::error::BuildError;
use tokio_util::sync::CancellationToken;

/// Cooperative cancellation token threaded through every collaborator call.
///
/// The scheduler cancels a task's token once every waiter on its future has
/// been released; builder implementations call [`checkpoint`](Self::checkpoint)
/// between expensive phases (parent resolution, dependency resolution,
/// plugin resolution) so an abandoned build aborts instead of completing a
/// stale cache update.
///
/// # Examples
///
/// ```
/// use pom_core::{BuildError, CancelToken};
///
/// fn phase(cancel: &CancelToken) -> Result<(), BuildError> {
///     cancel.checkpoint()?;
///     Ok(())
/// }
///
/// let token = CancelToken::new();
/// assert!(phase(&token).is_ok());
/// token.cancel();
/// assert!(matches!(phase(&token), Err(BuildError::Cancelled)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Returns `Err(BuildError::Cancelled)` once the token has been
    /// cancelled, so builders can propagate with `?`.
    pub fn checkpoint(&self) -> Result<(), BuildError> {
        if self.inner.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        Ok(())
    }
}
