//! Generic CRUD handlers.
//!
//! Every handler works for any [`Entity`]: it composes the entity's
//! [`Repository`], the shared [`CacheService`] and, for filtered reads, the
//! query engine.
//!
//! - Writes stage changes, save them and evict the entity's cache key when
//!   at least one row changed. A failed write never evicts.
//! - `GetAll` is served from the cache; `GetById` scans the cache and falls
//!   back to the store without populating it; `GetFiltered` always hits the
//!   store.
//! - Create and edit run a [`Validator`] first (accept-all unless built with
//!   [`EntityHandlers::with_validators`]); delete rejects unknown ids.
//! - A canceled token produces the handler's empty result (0 rows, `None`,
//!   an empty list or page) instead of an error.

mod commands;
mod queries;
mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::error::HandlerError;
use crate::application::query::{QueryableWrapper, SourceQueryableWrapper};
use crate::application::repos::{RepoError, Repository};
use crate::cache::CacheService;
use crate::domain::Entity;

pub use commands::{
    CreateCommand, CreateHandler, DeleteCommand, DeleteHandler, EditCommand, EditHandler,
};
pub use queries::{
    GetAllHandler, GetAllQuery, GetByIdHandler, GetByIdQuery, GetFilteredHandler,
    GetFilteredQuery,
};
pub use validation::{
    AcceptAll, EntityExistsValidator, FieldError, Validated, ValidationErrors, Validator,
};

/// A handler for requests of type `R`.
#[async_trait]
pub trait RequestHandler<R: Send + 'static>: Send + Sync {
    type Output: Send;

    async fn handle(&self, request: R, cancel: &CancellationToken)
    -> Result<Self::Output, HandlerError>;
}

/// Collaborators shared by the handlers of one entity type.
pub struct EntityContext<T: Entity> {
    repository: Arc<dyn Repository<T>>,
    cache: CacheService,
    wrapper: Arc<dyn QueryableWrapper<T>>,
}

impl<T: Entity> EntityContext<T> {
    pub fn new(repository: Arc<dyn Repository<T>>, cache: CacheService) -> Self {
        Self {
            repository,
            cache,
            wrapper: Arc::new(SourceQueryableWrapper),
        }
    }

    /// Replace the materialisation boundary used by filtered reads.
    pub fn with_wrapper(mut self, wrapper: Arc<dyn QueryableWrapper<T>>) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn repository(&self) -> &Arc<dyn Repository<T>> {
        &self.repository
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    async fn invalidate(&self, saved: u64) {
        self.cache.remove(T::CACHE_KEY).await;
        info!(
            entity = T::NAME,
            key = %T::CACHE_KEY,
            saved,
            "cache invalidated after write"
        );
    }
}

impl<T: Entity> Clone for EntityContext<T> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            cache: self.cache.clone(),
            wrapper: self.wrapper.clone(),
        }
    }
}

/// Map cancellation to `empty`; every other store error stays an error.
fn canceled_as<V>(result: Result<V, RepoError>, empty: V) -> Result<V, HandlerError> {
    match result {
        Ok(value) => Ok(value),
        Err(RepoError::Canceled) => Ok(empty),
        Err(err) => Err(err.into()),
    }
}

/// Shared validator for requests of type `R`.
pub type DynValidator<R> = Arc<dyn Validator<R>>;

/// The six handlers of one entity type, wired to the same context.
pub struct EntityHandlers<T: Entity> {
    pub create: Validated<CreateHandler<T>, DynValidator<CreateCommand<T>>>,
    pub edit: Validated<EditHandler<T>, DynValidator<EditCommand<T>>>,
    pub delete: Validated<DeleteHandler<T>, EntityExistsValidator<T>>,
    pub get_by_id: GetByIdHandler<T>,
    pub get_all: GetAllHandler<T>,
    pub get_filtered: GetFilteredHandler<T>,
}

impl<T: Entity> EntityHandlers<T> {
    /// Handlers whose create and edit accept every request.
    pub fn new(context: EntityContext<T>) -> Self {
        Self::with_validators(context, Arc::new(AcceptAll), Arc::new(AcceptAll))
    }

    /// Handlers that run `create` and `edit` before the matching write.
    pub fn with_validators(
        context: EntityContext<T>,
        create: DynValidator<CreateCommand<T>>,
        edit: DynValidator<EditCommand<T>>,
    ) -> Self {
        let exists = EntityExistsValidator::new(context.repository.clone());
        Self {
            create: Validated::new(CreateHandler::new(context.clone()), create),
            edit: Validated::new(EditHandler::new(context.clone()), edit),
            delete: Validated::new(DeleteHandler::new(context.clone()), exists),
            get_by_id: GetByIdHandler::new(context.clone()),
            get_all: GetAllHandler::new(context.clone()),
            get_filtered: GetFilteredHandler::new(context),
        }
    }
}

impl<T: Entity> Clone for EntityHandlers<T> {
    fn clone(&self) -> Self {
        Self {
            create: self.create.clone(),
            edit: self.edit.clone(),
            delete: self.delete.clone(),
            get_by_id: self.get_by_id.clone(),
            get_all: self.get_all.clone(),
            get_filtered: self.get_filtered.clone(),
        }
    }
}

#[cfg(test)]
mod tests;
