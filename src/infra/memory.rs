//! In-process store used for tests and for running without a database.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::query::{QueryPlan, Queryable};
use crate::application::repos::{Change, PendingChanges, QuerySource, RepoError, Repository};
use crate::domain::Entity;
use crate::util::lock::RecoverLock;

const SOURCE: &str = "infra::memory";

struct MemoryStore<T> {
    rows: RwLock<Vec<T>>,
    next_id: AtomicI64,
}

impl<T: Entity> MemoryStore<T> {
    fn check(cancel: &CancellationToken) -> Result<(), RepoError> {
        if cancel.is_cancelled() {
            Err(RepoError::Canceled)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<T: Entity> QuerySource<T> for MemoryStore<T> {
    async fn count(&self, plan: &QueryPlan<T>) -> Result<u64, RepoError> {
        let rows = self.rows.read_recovered(SOURCE, "count");
        Ok(plan.count_matching(rows.iter()))
    }

    async fn load(&self, plan: &QueryPlan<T>) -> Result<Vec<T>, RepoError> {
        let snapshot = self.rows.read_recovered(SOURCE, "load").clone();
        Ok(plan.apply(snapshot))
    }
}

/// Rows kept in identity order behind a lock. Clones share the same rows.
pub struct MemoryRepository<T: Entity> {
    store: Arc<MemoryStore<T>>,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Seed with `rows` as stored; new ids continue after the largest one.
    pub fn with_rows(mut rows: Vec<T>) -> Self {
        rows.sort_by_key(|row| row.id());
        let next_id = rows.iter().map(|row| row.id()).max().unwrap_or(0) + 1;
        Self {
            store: Arc::new(MemoryStore {
                rows: RwLock::new(rows),
                next_id: AtomicI64::new(next_id),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.store.rows.read_recovered(SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every row in identity order.
    pub fn snapshot(&self) -> Vec<T> {
        self.store.rows.read_recovered(SOURCE, "snapshot").clone()
    }
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Clone for MemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn get_by_id(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, RepoError> {
        MemoryStore::<T>::check(cancel)?;
        let rows = self.store.rows.read_recovered(SOURCE, "get_by_id");
        Ok(rows.iter().find(|row| row.id() == id).cloned())
    }

    async fn get_list(&self, cancel: &CancellationToken) -> Result<Vec<T>, RepoError> {
        MemoryStore::<T>::check(cancel)?;
        Ok(self.snapshot())
    }

    async fn save_changes(
        &self,
        changes: PendingChanges<T>,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        MemoryStore::<T>::check(cancel)?;
        if changes.is_empty() {
            return Ok(0);
        }

        let mut rows = self.store.rows.write_recovered(SOURCE, "save_changes");
        let mut staged = rows.clone();
        let mut next_id = self.store.next_id.load(Ordering::SeqCst);
        let mut affected = 0_u64;

        for change in changes.into_inner() {
            match change {
                Change::Insert(mut entity) => {
                    entity.set_id(next_id);
                    next_id += 1;
                    staged.push(entity);
                }
                Change::Update(entity) => {
                    let slot = staged
                        .iter_mut()
                        .find(|row| row.id() == entity.id())
                        .ok_or(RepoError::NotFound)?;
                    *slot = entity;
                }
                Change::Delete(id) => {
                    let index = staged
                        .iter()
                        .position(|row| row.id() == id)
                        .ok_or(RepoError::NotFound)?;
                    staged.remove(index);
                }
            }
            affected += 1;
        }

        *rows = staged;
        self.store.next_id.store(next_id, Ordering::SeqCst);
        debug!(entity = T::NAME, affected, "memory store saved changes");
        Ok(affected)
    }

    fn get_queryable(&self) -> Queryable<T> {
        Queryable::new(self.store.clone())
    }
}
