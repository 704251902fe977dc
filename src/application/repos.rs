//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::application::query::{QueryPlan, Queryable};
use crate::domain::Entity;

#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error("operation canceled")]
    Canceled,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, RepoError::Canceled)
    }
}

/// One staged write.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    Insert(T),
    Update(T),
    Delete(i64),
}

/// Writes staged by a handler and applied together by [`Repository::save_changes`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChanges<T> {
    changes: Vec<Change<T>>,
}

impl<T> Default for PendingChanges<T> {
    fn default() -> Self {
        Self {
            changes: Vec::new(),
        }
    }
}

impl<T: Entity> PendingChanges<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an insert. The store assigns the identity.
    pub fn add(&mut self, entity: T) {
        self.changes.push(Change::Insert(entity));
    }

    pub fn update(&mut self, entity: T) {
        self.changes.push(Change::Update(entity));
    }

    pub fn delete(&mut self, entity: &T) {
        self.changes.push(Change::Delete(entity.id()));
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change<T>> {
        self.changes.iter()
    }

    pub fn into_inner(self) -> Vec<Change<T>> {
        self.changes
    }
}

/// Store-specific evaluation of a composed query plan.
#[async_trait]
pub trait QuerySource<T: Entity>: Send + Sync {
    /// Rows matching the plan's filter, ignoring sort and paging.
    async fn count(&self, plan: &QueryPlan<T>) -> Result<u64, RepoError>;

    /// Rows matching the plan: filtered, then sorted, then paged.
    async fn load(&self, plan: &QueryPlan<T>) -> Result<Vec<T>, RepoError>;
}

/// Persistence operations every entity type supports.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn get_by_id(&self, id: i64, cancel: &CancellationToken)
    -> Result<Option<T>, RepoError>;

    /// Full collection in identity order.
    async fn get_list(&self, cancel: &CancellationToken) -> Result<Vec<T>, RepoError>;

    /// Apply every staged change atomically, returning the number of affected rows.
    async fn save_changes(
        &self,
        changes: PendingChanges<T>,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError>;

    /// Unfiltered query over the whole collection, ready for composition.
    fn get_queryable(&self) -> Queryable<T>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Grade;

    fn grade(id: i64) -> Grade {
        Grade {
            id,
            name: format!("Grade {id}"),
            short_name: format!("G{id}"),
        }
    }

    #[test]
    fn pending_changes_keep_staging_order() {
        let mut changes = PendingChanges::new();
        changes.add(grade(0));
        changes.update(grade(2));
        changes.delete(&grade(3));

        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes.into_inner(),
            vec![
                Change::Insert(grade(0)),
                Change::Update(grade(2)),
                Change::Delete(3)
            ]
        );
    }

    #[test]
    fn only_cancellation_reports_canceled() {
        assert!(RepoError::Canceled.is_canceled());
        assert!(!RepoError::Timeout.is_canceled());
        assert!(!RepoError::NotFound.is_canceled());
    }
}
