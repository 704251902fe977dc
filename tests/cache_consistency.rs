//! Cache-aside behaviour of the list handlers: staleness until a write
//! evicts, expiry, and optional reload deduplication.

mod support;

use std::sync::Arc;
use std::time::Duration;

use facilities_registry::{
    application::{
        handlers::{
            CreateCommand, DeleteCommand, EditCommand, EntityContext, EntityHandlers,
            GetAllQuery, GetByIdQuery, RequestHandler,
        },
        repos::{PendingChanges, Repository},
    },
    cache::{CacheConfig, CacheService, ExpirationPolicy, MemoryCache},
    domain::entities::Housing,
    infra::memory::MemoryRepository,
};
use tokio_util::sync::CancellationToken;

use support::{SlowHousings, housing, three_housings};

fn handlers(store: &MemoryRepository<Housing>, cache: CacheService) -> EntityHandlers<Housing> {
    EntityHandlers::new(EntityContext::new(Arc::new(store.clone()), cache))
}

async fn names(handlers: &EntityHandlers<Housing>) -> Vec<String> {
    handlers
        .get_all
        .handle(GetAllQuery, &CancellationToken::new())
        .await
        .expect("list succeeds")
        .iter()
        .map(|h| h.name.clone())
        .collect()
}

async fn write_behind_cache(store: &MemoryRepository<Housing>, name: &str) {
    let mut changes = PendingChanges::new();
    changes.add(housing(0, name));
    store
        .save_changes(changes, &CancellationToken::new())
        .await
        .expect("direct write succeeds");
}

#[tokio::test]
async fn list_is_stale_until_a_handler_write_evicts_it() {
    let store = three_housings();
    let handlers = handlers(&store, CacheService::default());
    let cancel = CancellationToken::new();

    assert_eq!(names(&handlers).await.len(), 3);

    write_behind_cache(&store, "Behind").await;
    assert_eq!(names(&handlers).await.len(), 3);

    let saved = handlers
        .create
        .handle(
            CreateCommand {
                entity: housing(0, "Fresh"),
            },
            &cancel,
        )
        .await
        .expect("create succeeds");
    assert_eq!(saved, 1);

    let after = names(&handlers).await;
    assert_eq!(after.len(), 5);
    assert!(after.contains(&"Behind".to_string()));
    assert!(after.contains(&"Fresh".to_string()));
}

#[tokio::test]
async fn edits_and_deletes_are_visible_on_the_next_list() {
    let store = three_housings();
    let handlers = handlers(&store, CacheService::default());
    let cancel = CancellationToken::new();
    names(&handlers).await;

    handlers
        .edit
        .handle(
            EditCommand {
                id: 2,
                entity: housing(2, "Renamed"),
            },
            &cancel,
        )
        .await
        .expect("edit succeeds");
    assert_eq!(names(&handlers).await, vec!["Name 1", "Renamed", "Name 3"]);

    handlers
        .delete
        .handle(DeleteCommand { id: 1 }, &cancel)
        .await
        .expect("delete succeeds");
    assert_eq!(names(&handlers).await, vec!["Renamed", "Name 3"]);
}

#[tokio::test]
async fn get_by_id_reads_through_the_cached_collection() {
    let store = three_housings();
    let handlers = handlers(&store, CacheService::default());
    let cancel = CancellationToken::new();
    names(&handlers).await;

    write_behind_cache(&store, "Behind").await;

    // Id 4 is only in the store; the cached collection still answers for 1..3.
    let cached = handlers
        .get_by_id
        .handle(GetByIdQuery { id: 1 }, &cancel)
        .await
        .expect("lookup succeeds");
    assert_eq!(cached.map(|h| h.name), Some("Name 1".to_string()));

    let fallback = handlers
        .get_by_id
        .handle(GetByIdQuery { id: 4 }, &cancel)
        .await
        .expect("lookup succeeds");
    assert_eq!(fallback.map(|h| h.name), Some("Behind".to_string()));

    // The fallback does not write through.
    assert_eq!(names(&handlers).await.len(), 3);
}

// Expiry runs on the cache's own clock, so these sleep for real.
#[tokio::test]
async fn idle_entries_expire_after_the_sliding_window() {
    let store = three_housings();
    let policy = ExpirationPolicy::new(Duration::from_secs(60), Duration::from_millis(400));
    let handlers = handlers(
        &store,
        CacheService::new(Arc::new(MemoryCache::new()), policy),
    );
    names(&handlers).await;
    write_behind_cache(&store, "Behind").await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(names(&handlers).await.len(), 3);

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(names(&handlers).await.len(), 4);
}

#[tokio::test]
async fn frequently_read_entries_still_expire_absolutely() {
    let store = three_housings();
    let policy = ExpirationPolicy::new(Duration::from_millis(1_200), Duration::from_millis(600));
    let handlers = handlers(
        &store,
        CacheService::new(Arc::new(MemoryCache::new()), policy),
    );
    names(&handlers).await;
    write_behind_cache(&store, "Behind").await;

    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(names(&handlers).await.len(), 3);
    }

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(names(&handlers).await.len(), 4);
}

async fn concurrent_cold_lists(single_flight: bool) -> usize {
    let repository = Arc::new(SlowHousings::new(
        three_housings(),
        Duration::from_millis(100),
    ));
    let cache = CacheService::from_config(&CacheConfig {
        single_flight,
        ..Default::default()
    });
    let handlers = EntityHandlers::new(EntityContext::new(repository.clone(), cache));
    let cancel = CancellationToken::new();

    let (a, b, c) = tokio::join!(
        handlers.get_all.handle(GetAllQuery, &cancel),
        handlers.get_all.handle(GetAllQuery, &cancel),
        handlers.get_all.handle(GetAllQuery, &cancel),
    );
    for result in [a, b, c] {
        assert_eq!(result.expect("list succeeds").len(), 3);
    }
    repository.loads()
}

#[tokio::test(start_paused = true)]
async fn cold_misses_stampede_by_default() {
    assert_eq!(concurrent_cold_lists(false).await, 3);
}

#[tokio::test(start_paused = true)]
async fn single_flight_deduplicates_cold_misses() {
    assert_eq!(concurrent_cold_lists(true).await, 1);
}
