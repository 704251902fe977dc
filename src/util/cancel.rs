use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::application::repos::RepoError;

/// Run `work` unless `cancel` fires first.
///
/// Work that loses the race is dropped, so callers observe either the complete
/// result or [`RepoError::Canceled`], never a partial one.
pub async fn cancellable<F, R>(cancel: &CancellationToken, work: F) -> Result<R, RepoError>
where
    F: Future<Output = Result<R, RepoError>>,
{
    if cancel.is_cancelled() {
        return Err(RepoError::Canceled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RepoError::Canceled),
        result = work => result,
    }
}
