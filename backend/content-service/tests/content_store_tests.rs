//! Cache-aside behaviour of the content store over in-memory adapters

use blog_cache::{BlogCache, CacheKey, InMemoryCacheStore};
use content_service::db::InMemoryContentRepository;
use content_service::{ContentDraft, ContentError, ContentStore};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    store: ContentStore,
    repo: Arc<InMemoryContentRepository>,
    cache: Arc<InMemoryCacheStore>,
}

fn fixture_with_ttl(ttl: Option<Duration>) -> Fixture {
    let repo = Arc::new(InMemoryContentRepository::new());
    let cache = Arc::new(InMemoryCacheStore::new());
    let store = ContentStore::new(repo.clone(), BlogCache::new(cache.clone()), ttl);
    Fixture { store, repo, cache }
}

fn fixture() -> Fixture {
    fixture_with_ttl(None)
}

fn draft(title: &str) -> ContentDraft {
    ContentDraft {
        title: title.to_string(),
        body: String::new(),
    }
}

#[tokio::test]
async fn test_repeated_list_hits_store_once() {
    let f = fixture();
    f.store.create(draft("A"), "admin").await.unwrap();

    let first = f.store.list().await.unwrap();
    let second = f.store.list().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(f.repo.list_calls(), 1);
}

#[tokio::test]
async fn test_repeated_get_hits_store_once() {
    let f = fixture();
    let item = f.store.create(draft("A"), "admin").await.unwrap();

    assert_eq!(f.store.get(item.id).await.unwrap(), item);
    assert_eq!(f.store.get(item.id).await.unwrap(), item);
    assert_eq!(f.repo.find_calls(), 1);
}

#[tokio::test]
async fn test_create_is_visible_in_next_list() {
    let f = fixture();
    assert!(f.store.list().await.unwrap().is_empty());

    let item = f.store.create(draft("A"), "admin").await.unwrap();
    let listed = f.store.list().await.unwrap();
    assert_eq!(listed, vec![item]);
}

#[tokio::test]
async fn test_update_is_visible_through_get_and_list() {
    let f = fixture();
    let item = f.store.create(draft("A"), "admin").await.unwrap();

    let listed = f.store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "A");
    // Warm the item key as well so the update has to invalidate it
    assert_eq!(f.store.get(item.id).await.unwrap().title, "A");

    f.store.update(item.id, draft("B"), "admin").await.unwrap();

    assert_eq!(f.store.get(item.id).await.unwrap().title, "B");
    let listed = f.store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "B");
}

#[tokio::test]
async fn test_delete_removes_from_get_and_list() {
    let f = fixture();
    let item = f.store.create(draft("A"), "admin").await.unwrap();
    f.store.get(item.id).await.unwrap();
    f.store.list().await.unwrap();

    f.store.delete(item.id, "admin").await.unwrap();

    assert!(matches!(
        f.store.get(item.id).await,
        Err(ContentError::NotFound(_))
    ));
    assert!(f.store.list().await.unwrap().is_empty());
    assert!(!f.cache.contains_key(&CacheKey::content_item(item.id)));
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let f = fixture();
    f.store.create(draft("first"), "admin").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    f.store.create(draft("second"), "admin").await.unwrap();

    let titles: Vec<String> = f
        .store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.title)
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
}

#[tokio::test]
async fn test_cache_outage_does_not_fail_reads_or_writes() {
    let f = fixture();
    f.cache.set_available(false);

    let item = f.store.create(draft("A"), "admin").await.unwrap();
    assert_eq!(f.store.list().await.unwrap().len(), 1);
    assert_eq!(f.store.get(item.id).await.unwrap().title, "A");
    f.store.update(item.id, draft("B"), "admin").await.unwrap();
    f.store.delete(item.id, "admin").await.unwrap();

    // Every read went to the store
    assert_eq!(f.repo.list_calls(), 1);
}

#[tokio::test]
async fn test_store_fault_propagates() {
    let f = fixture();
    f.repo.set_available(false);

    assert!(matches!(
        f.store.list().await,
        Err(ContentError::Database(_))
    ));
    assert!(matches!(
        f.store.create(draft("A"), "admin").await,
        Err(ContentError::Database(_))
    ));
    assert_eq!(f.cache.del_count(), 0);
}

#[tokio::test]
async fn test_configured_ttl_still_serves_from_cache() {
    let f = fixture_with_ttl(Some(Duration::from_secs(60)));
    f.store.create(draft("A"), "admin").await.unwrap();

    f.store.list().await.unwrap();
    f.store.list().await.unwrap();
    assert!(f.cache.contains_key(&CacheKey::content_list()));
    assert_eq!(f.repo.list_calls(), 1);
}
