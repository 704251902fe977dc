use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::application::error::HandlerError;
use crate::application::repos::PendingChanges;
use crate::domain::Entity;

use super::{EntityContext, RequestHandler, canceled_as};

#[derive(Debug, Clone)]
pub struct CreateCommand<T> {
    pub entity: T,
}

#[derive(Debug, Clone)]
pub struct EditCommand<T> {
    pub id: i64,
    pub entity: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteCommand {
    pub id: i64,
}

/// Persists a new entity. Returns the number of saved rows; 0 means nothing
/// was written.
pub struct CreateHandler<T: Entity> {
    context: EntityContext<T>,
}

impl<T: Entity> CreateHandler<T> {
    pub fn new(context: EntityContext<T>) -> Self {
        Self { context }
    }
}

impl<T: Entity> Clone for CreateHandler<T> {
    fn clone(&self) -> Self {
        Self::new(self.context.clone())
    }
}

#[async_trait]
impl<T: Entity> RequestHandler<CreateCommand<T>> for CreateHandler<T> {
    type Output = u64;

    #[instrument(skip_all, fields(entity = T::NAME))]
    async fn handle(
        &self,
        command: CreateCommand<T>,
        cancel: &CancellationToken,
    ) -> Result<u64, HandlerError> {
        if cancel.is_cancelled() {
            debug!("create skipped: request canceled");
            return Ok(0);
        }

        let mut changes = PendingChanges::new();
        changes.add(command.entity);
        let saved = save(&self.context, changes, cancel).await?;
        info!(saved, "entity created");
        Ok(saved)
    }
}

/// Replaces the stored entity with `id`. Unknown ids are
/// [`HandlerError::NotFound`].
pub struct EditHandler<T: Entity> {
    context: EntityContext<T>,
}

impl<T: Entity> EditHandler<T> {
    pub fn new(context: EntityContext<T>) -> Self {
        Self { context }
    }
}

impl<T: Entity> Clone for EditHandler<T> {
    fn clone(&self) -> Self {
        Self::new(self.context.clone())
    }
}

#[async_trait]
impl<T: Entity> RequestHandler<EditCommand<T>> for EditHandler<T> {
    type Output = u64;

    #[instrument(skip_all, fields(entity = T::NAME, id = command.id))]
    async fn handle(
        &self,
        command: EditCommand<T>,
        cancel: &CancellationToken,
    ) -> Result<u64, HandlerError> {
        let EditCommand { id, mut entity } = command;
        if cancel.is_cancelled() {
            debug!("edit skipped: request canceled");
            return Ok(0);
        }

        let existing = self.context.repository.get_by_id(id, cancel).await;
        let Some(_) = canceled_as(existing, None)? else {
            if cancel.is_cancelled() {
                return Ok(0);
            }
            return Err(HandlerError::not_found(T::NAME, id));
        };

        entity.set_id(id);
        let mut changes = PendingChanges::new();
        changes.update(entity);
        let saved = save(&self.context, changes, cancel).await?;
        info!(saved, "entity updated");
        Ok(saved)
    }
}

/// Removes the entity with `id`. Usually wrapped in
/// [`super::Validated`] with [`super::EntityExistsValidator`] so unknown ids
/// are rejected before this runs.
pub struct DeleteHandler<T: Entity> {
    context: EntityContext<T>,
}

impl<T: Entity> DeleteHandler<T> {
    pub fn new(context: EntityContext<T>) -> Self {
        Self { context }
    }
}

impl<T: Entity> Clone for DeleteHandler<T> {
    fn clone(&self) -> Self {
        Self::new(self.context.clone())
    }
}

#[async_trait]
impl<T: Entity> RequestHandler<DeleteCommand> for DeleteHandler<T> {
    type Output = u64;

    #[instrument(skip_all, fields(entity = T::NAME, id = command.id))]
    async fn handle(
        &self,
        command: DeleteCommand,
        cancel: &CancellationToken,
    ) -> Result<u64, HandlerError> {
        if cancel.is_cancelled() {
            debug!("delete skipped: request canceled");
            return Ok(0);
        }

        let existing = self.context.repository.get_by_id(command.id, cancel).await;
        let Some(existing) = canceled_as(existing, None)? else {
            if cancel.is_cancelled() {
                return Ok(0);
            }
            return Err(HandlerError::not_found(T::NAME, command.id));
        };

        let mut changes = PendingChanges::new();
        changes.delete(&existing);
        let saved = save(&self.context, changes, cancel).await?;
        info!(saved, "entity deleted");
        Ok(saved)
    }
}

/// Save `changes` and evict the cache key if anything was written.
async fn save<T: Entity>(
    context: &EntityContext<T>,
    changes: PendingChanges<T>,
    cancel: &CancellationToken,
) -> Result<u64, HandlerError> {
    let result = context.repository.save_changes(changes, cancel).await;
    if let Err(err) = &result {
        if !err.is_canceled() {
            warn!(entity = T::NAME, error = %err, "save failed; cache left intact");
        }
    }

    let saved = canceled_as(result, 0)?;
    if saved > 0 {
        context.invalidate(saved).await;
    }
    Ok(saved)
}
