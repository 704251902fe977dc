//! Materialisation boundary between composed queries and the store.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::application::repos::RepoError;
use crate::domain::Entity;
use crate::util::cancel::cancellable;

use super::builder::Queryable;

/// Runs a [`Queryable`] against its source.
///
/// Cancellation yields [`RepoError::Canceled`], never a truncated list.
#[async_trait]
pub trait QueryableWrapper<T: Entity>: Send + Sync {
    async fn to_list(
        &self,
        query: &Queryable<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, RepoError>;

    /// Rows matching the query's filter across all pages.
    async fn count(&self, query: &Queryable<T>, cancel: &CancellationToken)
    -> Result<u64, RepoError>;
}

/// Delegates to the query's own source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceQueryableWrapper;

#[async_trait]
impl<T: Entity> QueryableWrapper<T> for SourceQueryableWrapper {
    async fn to_list(
        &self,
        query: &Queryable<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, RepoError> {
        cancellable(cancel, query.source().load(query.plan())).await
    }

    async fn count(
        &self,
        query: &Queryable<T>,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        cancellable(cancel, query.source().count(query.plan())).await
    }
}
