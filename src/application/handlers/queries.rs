use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::application::error::HandlerError;
use crate::application::pagination::PaginatedListModel;
use crate::application::query::{QueryBuilder, QueryParameters};
use crate::domain::Entity;

use super::{EntityContext, RequestHandler, canceled_as};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetByIdQuery {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetAllQuery;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetFilteredQuery {
    pub parameters: QueryParameters,
}

/// Point lookup: cached collection first, then the store. A store hit is not
/// written back to the cache.
pub struct GetByIdHandler<T: Entity> {
    context: EntityContext<T>,
}

impl<T: Entity> GetByIdHandler<T> {
    pub fn new(context: EntityContext<T>) -> Self {
        Self { context }
    }
}

impl<T: Entity> Clone for GetByIdHandler<T> {
    fn clone(&self) -> Self {
        Self::new(self.context.clone())
    }
}

#[async_trait]
impl<T: Entity> RequestHandler<GetByIdQuery> for GetByIdHandler<T> {
    type Output = Option<T>;

    #[instrument(skip_all, fields(entity = T::NAME, id = query.id))]
    async fn handle(
        &self,
        query: GetByIdQuery,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, HandlerError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let cached = self.context.cache.get_by_id::<T>(T::CACHE_KEY, query.id).await;
        if let Some(hit) = cached {
            debug!("served from cached collection");
            return Ok(Some(hit));
        }

        let found = self.context.repository.get_by_id(query.id, cancel).await;
        canceled_as(found, None)
    }
}

/// Full collection through the cache.
pub struct GetAllHandler<T: Entity> {
    context: EntityContext<T>,
}

impl<T: Entity> GetAllHandler<T> {
    pub fn new(context: EntityContext<T>) -> Self {
        Self { context }
    }
}

impl<T: Entity> Clone for GetAllHandler<T> {
    fn clone(&self) -> Self {
        Self::new(self.context.clone())
    }
}

#[async_trait]
impl<T: Entity> RequestHandler<GetAllQuery> for GetAllHandler<T> {
    type Output = Arc<Vec<T>>;

    #[instrument(skip_all, fields(entity = T::NAME))]
    async fn handle(
        &self,
        _query: GetAllQuery,
        cancel: &CancellationToken,
    ) -> Result<Arc<Vec<T>>, HandlerError> {
        if cancel.is_cancelled() {
            return Ok(Arc::default());
        }

        let repository = self.context.repository.clone();
        let cache = &self.context.cache;
        let items = cache
            .get_or_create(
                T::CACHE_KEY,
                move |token| async move { repository.get_list(&token).await },
                cancel,
                cache.policy(),
            )
            .await;
        canceled_as(items, Arc::default())
    }
}

/// Filter, sort and page against the store. Never reads or writes the cache.
pub struct GetFilteredHandler<T: Entity> {
    context: EntityContext<T>,
}

impl<T: Entity> GetFilteredHandler<T> {
    pub fn new(context: EntityContext<T>) -> Self {
        Self { context }
    }
}

impl<T: Entity> Clone for GetFilteredHandler<T> {
    fn clone(&self) -> Self {
        Self::new(self.context.clone())
    }
}

#[async_trait]
impl<T: Entity> RequestHandler<GetFilteredQuery> for GetFilteredHandler<T> {
    type Output = PaginatedListModel<T>;

    #[instrument(skip_all, fields(entity = T::NAME))]
    async fn handle(
        &self,
        query: GetFilteredQuery,
        cancel: &CancellationToken,
    ) -> Result<PaginatedListModel<T>, HandlerError> {
        let paging = query.parameters.paging();
        if cancel.is_cancelled() {
            return Ok(PaginatedListModel::empty(paging));
        }

        let built = QueryBuilder::new(self.context.repository.get_queryable())
            .execute(&query.parameters);
        debug!(plan = ?built.plan(), "filtered query built");

        let wrapper = &self.context.wrapper;
        let Some(total) = canceled_as(wrapper.count(&built, cancel).await.map(Some), None)? else {
            return Ok(PaginatedListModel::empty(paging));
        };
        let Some(items) = canceled_as(wrapper.to_list(&built, cancel).await.map(Some), None)?
        else {
            return Ok(PaginatedListModel::empty(paging));
        };

        Ok(PaginatedListModel::new(items, total, paging))
    }
}
