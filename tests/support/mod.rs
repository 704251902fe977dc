#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use facilities_registry::{
    application::{
        query::Queryable,
        repos::{PendingChanges, RepoError, Repository},
    },
    domain::entities::Housing,
    infra::memory::MemoryRepository,
    util::cancel::cancellable,
};
use tokio_util::sync::CancellationToken;

pub fn housing(id: i64, name: &str) -> Housing {
    Housing {
        id,
        name: name.to_string(),
        short_name: format!("H{id}"),
        address: None,
        floors: None,
    }
}

pub fn three_housings() -> MemoryRepository<Housing> {
    MemoryRepository::with_rows(vec![
        housing(1, "Name 1"),
        housing(2, "Name 2"),
        housing(3, "Name 3"),
    ])
}

/// Housing store that takes `delay` before every list load and save.
pub struct SlowHousings {
    pub inner: MemoryRepository<Housing>,
    pub delay: Duration,
    pub list_loads: Arc<AtomicUsize>,
}

impl SlowHousings {
    pub fn new(inner: MemoryRepository<Housing>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            list_loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn loads(&self) -> usize {
        self.list_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository<Housing> for SlowHousings {
    async fn get_by_id(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<Housing>, RepoError> {
        self.inner.get_by_id(id, cancel).await
    }

    async fn get_list(&self, cancel: &CancellationToken) -> Result<Vec<Housing>, RepoError> {
        self.list_loads.fetch_add(1, Ordering::SeqCst);
        cancellable(cancel, async {
            tokio::time::sleep(self.delay).await;
            self.inner.get_list(cancel).await
        })
        .await
    }

    async fn save_changes(
        &self,
        changes: PendingChanges<Housing>,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        cancellable(cancel, async {
            tokio::time::sleep(self.delay).await;
            self.inner.save_changes(changes, cancel).await
        })
        .await
    }

    fn get_queryable(&self) -> Queryable<Housing> {
        self.inner.get_queryable()
    }
}
