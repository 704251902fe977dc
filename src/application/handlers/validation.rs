//! Validation seam run before a handler.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::error::HandlerError;
use crate::application::repos::{RepoError, Repository};
use crate::domain::Entity;

use super::{DeleteCommand, RequestHandler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Structured rejection of a request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Error)]
#[error("validation failed: {}", summary(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Checks a request before its handler runs.
///
/// Failures other than a rejection (a store error while looking something up)
/// are reported as the corresponding [`HandlerError`].
#[async_trait]
pub trait Validator<R: Sync>: Send + Sync {
    async fn validate(&self, request: &R, cancel: &CancellationToken) -> Result<(), HandlerError>;
}

#[async_trait]
impl<R: Sync, V: Validator<R> + ?Sized> Validator<R> for Arc<V> {
    async fn validate(&self, request: &R, cancel: &CancellationToken) -> Result<(), HandlerError> {
        (**self).validate(request, cancel).await
    }
}

/// Accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl<R: Sync> Validator<R> for AcceptAll {
    async fn validate(
        &self,
        _request: &R,
        _cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Rejects deletes of ids the store does not hold.
pub struct EntityExistsValidator<T: Entity> {
    repository: Arc<dyn Repository<T>>,
}

impl<T: Entity> EntityExistsValidator<T> {
    pub fn new(repository: Arc<dyn Repository<T>>) -> Self {
        Self { repository }
    }
}

impl<T: Entity> Clone for EntityExistsValidator<T> {
    fn clone(&self) -> Self {
        Self::new(self.repository.clone())
    }
}

#[async_trait]
impl<T: Entity> Validator<DeleteCommand> for EntityExistsValidator<T> {
    async fn validate(
        &self,
        request: &DeleteCommand,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        match self.repository.get_by_id(request.id, cancel).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(ValidationErrors::single(
                "id",
                format!("{} `{}` does not exist", T::NAME, request.id),
            )
            .into()),
            // the handler observes the same token and reports its empty result
            Err(RepoError::Canceled) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Runs `validator` and, if it accepts, `handler`.
pub struct Validated<H, V> {
    handler: H,
    validator: V,
}

impl<H, V> Validated<H, V> {
    pub fn new(handler: H, validator: V) -> Self {
        Self { handler, validator }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: Clone, V: Clone> Clone for Validated<H, V> {
    fn clone(&self) -> Self {
        Self::new(self.handler.clone(), self.validator.clone())
    }
}

impl<H, V> fmt::Debug for Validated<H, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validated")
            .field("handler", &std::any::type_name::<H>())
            .field("validator", &std::any::type_name::<V>())
            .finish()
    }
}

#[async_trait]
impl<R, H, V> RequestHandler<R> for Validated<H, V>
where
    R: Send + Sync + 'static,
    H: RequestHandler<R>,
    V: Validator<R>,
{
    type Output = H::Output;

    async fn handle(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<H::Output, HandlerError> {
        if let Err(err) = self.validator.validate(&request, cancel).await {
            debug!(error = %err, "request rejected before handler");
            return Err(err);
        }
        self.handler.handle(request, cancel).await
    }
}

