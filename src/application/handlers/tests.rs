use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::application::pagination::PaginatedListModel;
use crate::application::query::{QueryParameters, Queryable};
use crate::application::repos::PendingChanges;
use crate::domain::entities::Housing;
use crate::infra::memory::MemoryRepository;

#[derive(Default)]
struct Calls {
    get_by_id: AtomicUsize,
    get_list: AtomicUsize,
    save: AtomicUsize,
}

struct CountingRepository {
    inner: MemoryRepository<Housing>,
    calls: Arc<Calls>,
    fail_saves: bool,
}

#[async_trait]
impl Repository<Housing> for CountingRepository {
    async fn get_by_id(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<Housing>, RepoError> {
        self.calls.get_by_id.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id, cancel).await
    }

    async fn get_list(&self, cancel: &CancellationToken) -> Result<Vec<Housing>, RepoError> {
        self.calls.get_list.fetch_add(1, Ordering::SeqCst);
        self.inner.get_list(cancel).await
    }

    async fn save_changes(
        &self,
        changes: PendingChanges<Housing>,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        self.calls.save.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(RepoError::Timeout);
        }
        self.inner.save_changes(changes, cancel).await
    }

    fn get_queryable(&self) -> Queryable<Housing> {
        self.inner.get_queryable()
    }
}

fn housing(id: i64, name: &str) -> Housing {
    Housing {
        id,
        name: name.to_string(),
        short_name: format!("H{id}"),
        address: None,
        floors: None,
    }
}

struct Fixture {
    handlers: EntityHandlers<Housing>,
    store: MemoryRepository<Housing>,
    cache: CacheService,
    calls: Arc<Calls>,
}

fn fixture_with(fail_saves: bool) -> Fixture {
    fixture_wired(fail_saves, EntityHandlers::new)
}

fn fixture_wired(
    fail_saves: bool,
    wire: impl FnOnce(EntityContext<Housing>) -> EntityHandlers<Housing>,
) -> Fixture {
    let store = MemoryRepository::with_rows(vec![
        housing(1, "Name 1"),
        housing(2, "Name 2"),
        housing(3, "Name 3"),
    ]);
    let calls = Arc::new(Calls::default());
    let repository = Arc::new(CountingRepository {
        inner: store.clone(),
        calls: calls.clone(),
        fail_saves,
    });
    let cache = CacheService::default();
    Fixture {
        handlers: wire(EntityContext::new(repository, cache.clone())),
        store,
        cache,
        calls,
    }
}

fn fixture() -> Fixture {
    fixture_with(false)
}

fn live() -> CancellationToken {
    CancellationToken::new()
}

fn canceled() -> CancellationToken {
    let token = CancellationToken::new();
    token.cancel();
    token
}

#[tokio::test]
async fn create_invalidates_so_next_get_all_sees_the_row() {
    let f = fixture();
    let before = f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");
    assert_eq!(before.len(), 3);

    let saved = f
        .handlers
        .create
        .handle(
            CreateCommand {
                entity: housing(0, "Name 4"),
            },
            &live(),
        )
        .await
        .expect("created");
    assert_eq!(saved, 1);

    let after = f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");
    assert_eq!(after.len(), 4);
    assert_eq!(after[3].id, 4);
    assert_eq!(f.calls.get_list.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn get_all_is_stale_until_invalidated() {
    let f = fixture();
    f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");

    // write behind the handlers' back: nothing evicts the cached collection
    let mut changes = PendingChanges::new();
    changes.add(housing(0, "Name 4"));
    f.store.save_changes(changes, &live()).await.expect("saved");

    let cached = f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");
    assert_eq!(cached.len(), 3);
    assert_eq!(f.calls.get_list.load(Ordering::SeqCst), 1);

    f.cache.remove(Housing::CACHE_KEY).await;
    let fresh = f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");
    assert_eq!(fresh.len(), 4);
}

#[tokio::test]
async fn get_by_id_prefers_cache_and_falls_back_to_store() {
    let f = fixture();

    let cold = f
        .handlers
        .get_by_id
        .handle(GetByIdQuery { id: 2 }, &live())
        .await
        .expect("looked up");
    assert_eq!(cold.map(|h| h.name), Some("Name 2".to_string()));
    assert_eq!(f.calls.get_by_id.load(Ordering::SeqCst), 1);
    // the fallback does not populate the cache
    assert_eq!(f.cache.get_by_id::<Housing>(Housing::CACHE_KEY, 2).await, None);

    f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");
    let warm = f
        .handlers
        .get_by_id
        .handle(GetByIdQuery { id: 3 }, &live())
        .await
        .expect("looked up");
    assert_eq!(warm.map(|h| h.id), Some(3));
    assert_eq!(f.calls.get_by_id.load(Ordering::SeqCst), 1);

    let missing = f
        .handlers
        .get_by_id
        .handle(GetByIdQuery { id: 99 }, &live())
        .await
        .expect("looked up");
    assert_eq!(missing, None);
}

#[tokio::test]
async fn edit_replaces_row_and_keeps_requested_id() {
    let f = fixture();
    f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");

    let saved = f
        .handlers
        .edit
        .handle(
            EditCommand {
                id: 2,
                entity: housing(77, "Renamed"),
            },
            &live(),
        )
        .await
        .expect("edited");
    assert_eq!(saved, 1);

    let row = f
        .handlers
        .get_by_id
        .handle(GetByIdQuery { id: 2 }, &live())
        .await
        .expect("looked up")
        .expect("present");
    assert_eq!(row.name, "Renamed");
    assert!(f.store.snapshot().iter().all(|h| h.id != 77));
}

#[tokio::test]
async fn edit_of_unknown_id_is_not_found_and_keeps_cache() {
    let f = fixture();
    f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");

    let result = f
        .handlers
        .edit
        .handle(
            EditCommand {
                id: 42,
                entity: housing(42, "Ghost"),
            },
            &live(),
        )
        .await;

    assert!(matches!(
        result,
        Err(HandlerError::NotFound {
            entity: "housing",
            id: 42
        })
    ));
    assert!(f.cache.get_by_id::<Housing>(Housing::CACHE_KEY, 1).await.is_some());
    assert_eq!(f.calls.save.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_save_surfaces_error_and_keeps_cache() {
    let f = fixture_with(true);
    f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");

    let result = f
        .handlers
        .create
        .handle(
            CreateCommand {
                entity: housing(0, "Name 4"),
            },
            &live(),
        )
        .await;

    assert!(matches!(result, Err(HandlerError::Repo(RepoError::Timeout))));
    assert!(f.cache.get_by_id::<Housing>(Housing::CACHE_KEY, 1).await.is_some());
}

#[tokio::test]
async fn delete_of_unknown_id_is_rejected_before_the_handler() {
    let f = fixture();

    let result = f.handlers.delete.handle(DeleteCommand { id: 9 }, &live()).await;

    let errors = match result {
        Err(HandlerError::Validation(errors)) => errors,
        other => panic!("expected validation failure, got {other:?}"),
    };
    assert_eq!(errors.errors[0].field, "id");
    assert_eq!(f.calls.save.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delete_removes_row_and_invalidates() {
    let f = fixture();
    f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");

    let deleted = f
        .handlers
        .delete
        .handle(DeleteCommand { id: 1 }, &live())
        .await
        .expect("deleted");
    assert_eq!(deleted, 1);
    assert_eq!(f.cache.get_by_id::<Housing>(Housing::CACHE_KEY, 2).await, None);

    let remaining = f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");
    assert_eq!(remaining.iter().map(|h| h.id).collect::<Vec<_>>(), vec![2, 3]);
}

#[tokio::test]
async fn canceled_requests_return_empty_results() {
    let f = fixture();
    let token = canceled();

    let created = f
        .handlers
        .create
        .handle(
            CreateCommand {
                entity: housing(0, "Name 4"),
            },
            &token,
        )
        .await
        .expect("no error");
    let edited = f
        .handlers
        .edit
        .handle(
            EditCommand {
                id: 1,
                entity: housing(1, "x"),
            },
            &token,
        )
        .await
        .expect("no error");
    let deleted = f
        .handlers
        .delete
        .handle(DeleteCommand { id: 1 }, &token)
        .await
        .expect("no error");
    let found = f
        .handlers
        .get_by_id
        .handle(GetByIdQuery { id: 1 }, &token)
        .await
        .expect("no error");
    let all = f.handlers.get_all.handle(GetAllQuery, &token).await.expect("no error");
    let page = f
        .handlers
        .get_filtered
        .handle(GetFilteredQuery::default(), &token)
        .await
        .expect("no error");

    assert_eq!((created, edited, deleted), (0, 0, 0));
    assert_eq!(found, None);
    assert!(all.is_empty());
    assert!(page.items().is_empty());
    assert_eq!(page.total_count(), 0);
    assert_eq!(f.store.len(), 3);
    assert_eq!(f.calls.save.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn filtered_reads_bypass_the_cache() {
    let f = fixture();
    let query = GetFilteredQuery {
        parameters: QueryParameters::new().page(2, 2),
    };

    let page = f
        .handlers
        .get_filtered
        .handle(query, &live())
        .await
        .expect("filtered");

    assert_eq!(page.items().iter().map(|h| h.id).collect::<Vec<_>>(), vec![3]);
    assert_eq!(page.total_pages(), 2);
    assert!(page.has_previous());
    assert!(!page.has_next());
    assert_eq!(f.calls.get_list.load(Ordering::SeqCst), 0);
    assert_eq!(f.cache.get_by_id::<Housing>(Housing::CACHE_KEY, 3).await, None);
}

struct RejectBlankNames;

#[async_trait]
impl Validator<CreateCommand<Housing>> for RejectBlankNames {
    async fn validate(
        &self,
        request: &CreateCommand<Housing>,
        _cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        if request.entity.name.trim().is_empty() {
            return Err(ValidationErrors::single("name", "must not be blank").into());
        }
        Ok(())
    }
}

#[tokio::test]
async fn rejected_create_never_saves_and_keeps_cache() {
    let f = fixture_wired(false, |context| {
        EntityHandlers::with_validators(context, Arc::new(RejectBlankNames), Arc::new(AcceptAll))
    });
    f.handlers.get_all.handle(GetAllQuery, &live()).await.expect("listed");

    let result = f
        .handlers
        .create
        .handle(
            CreateCommand {
                entity: housing(0, "  "),
            },
            &live(),
        )
        .await;

    let errors = match result {
        Err(HandlerError::Validation(errors)) => errors,
        other => panic!("expected validation failure, got {other:?}"),
    };
    assert_eq!(errors.errors[0].field, "name");
    assert_eq!(f.calls.save.load(Ordering::SeqCst), 0);
    assert!(f.cache.get_by_id::<Housing>(Housing::CACHE_KEY, 1).await.is_some());

    let saved = f
        .handlers
        .create
        .handle(
            CreateCommand {
                entity: housing(0, "Name 4"),
            },
            &live(),
        )
        .await
        .expect("created");
    assert_eq!(saved, 1);
}

/// Counts normally, then reports the listing as canceled.
struct CanceledListWrapper;

#[async_trait]
impl QueryableWrapper<Housing> for CanceledListWrapper {
    async fn to_list(
        &self,
        _query: &Queryable<Housing>,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Housing>, RepoError> {
        Err(RepoError::Canceled)
    }

    async fn count(
        &self,
        _query: &Queryable<Housing>,
        _cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        Ok(3)
    }
}

#[tokio::test]
async fn cancellation_between_count_and_list_yields_empty_page() {
    let f = fixture_wired(false, |context| {
        EntityHandlers::new(context.with_wrapper(Arc::new(CanceledListWrapper)))
    });
    let parameters = QueryParameters::new().page(1, 2);
    let paging = parameters.paging();

    let page = f
        .handlers
        .get_filtered
        .handle(GetFilteredQuery { parameters }, &live())
        .await
        .expect("no error");

    assert_eq!(page, PaginatedListModel::empty(paging));
    assert_eq!(page.total_count(), 0);
}

#[test]
fn validation_errors_render_every_field() {
    let mut errors = ValidationErrors::new();
    errors.push("name", "must not be empty");
    errors.push("id", "unknown");
    assert_eq!(
        errors.to_string(),
        "validation failed: name: must not be empty; id: unknown"
    );
    assert!(ValidationErrors::new().into_result().is_ok());
}
