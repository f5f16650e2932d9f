use super::*;
use crate::kv::MemoryKv;
use crate::store::types::{ContentStatus, Platform};

fn keys() -> KeyLayout {
    KeyLayout::new("c")
}

fn draft(id: &str, platforms: &[Platform]) -> ContentItem {
    ContentItem::new(id, ContentStatus::Draft).with_platforms(platforms.iter().copied())
}

async fn ids_under(store: &ContentStore<MemoryKv>, key: &str) -> Vec<String> {
    store.get_ids(key).await
}

#[test]
fn test_plan_for_new_item() {
    let keys = keys();
    let item = draft("1", &[Platform::Instagram]);
    let plan = SavePlan::for_save(&keys, None, &item);

    assert_eq!(
        plan.adds(),
        &[
            "c".to_string(),
            "c_idx_status_draft".to_string(),
            "c_idx_platform_instagram".to_string()
        ]
    );
    assert!(plan.removes().is_empty());
}

#[test]
fn test_plan_status_and_platform_change() {
    let keys = keys();
    let previous = draft("1", &[Platform::Instagram, Platform::Tiktok]);
    let mut next = previous.clone();
    next.status = ContentStatus::Scheduled;
    next.platforms = vec![Platform::Tiktok, Platform::Youtube];

    let plan = SavePlan::for_save(&keys, Some(&previous), &next);
    assert_eq!(
        plan.removes(),
        &[
            "c_idx_status_draft".to_string(),
            "c_idx_platform_instagram".to_string()
        ]
    );
    assert!(plan.adds().contains(&"c_idx_status_scheduled".to_string()));
    assert!(plan.adds().contains(&"c_idx_platform_youtube".to_string()));
    assert_eq!(plan.read_keys().len(), plan.adds().len() + plan.removes().len());
}

#[test]
fn test_plan_unchanged_item_changes_no_list() {
    let keys = keys();
    let item = draft("1", &[Platform::Facebook]);
    let plan = SavePlan::for_save(&keys, Some(&item), &item);
    assert!(plan.removes().is_empty());

    let loaded = plan
        .read_keys()
        .into_iter()
        .map(|key| (key, vec!["1".to_string()]));
    let mut batch = IndexBatch::from_lists(loaded);
    plan.apply(&mut batch, "1");
    assert!(batch.changed_keys().is_empty());
}

#[test]
fn test_plan_for_delete_covers_memberships() {
    let keys = keys();
    let item = ContentItem::new("9", ContentStatus::Failed).with_platforms([Platform::Twitter]);
    let plan = SavePlan::for_delete(&keys, &item);
    assert!(plan.adds().is_empty());
    assert_eq!(
        plan.removes(),
        &[
            "c".to_string(),
            "c_idx_status_failed".to_string(),
            "c_idx_platform_twitter".to_string()
        ]
    );
}

#[test]
fn test_validate_id_rejects_blank() {
    assert!(validate_id("abc").is_ok());
    assert!(matches!(validate_id("  "), Err(StoreError::InvalidItem(_))));
}

#[tokio::test]
async fn test_save_indexes_new_item() {
    let store = ContentStore::new(MemoryKv::new());
    store
        .save(draft("1", &[Platform::Instagram, Platform::Instagram]))
        .await
        .unwrap();

    assert_eq!(ids_under(&store, "content").await, vec!["1"]);
    assert_eq!(ids_under(&store, "content_idx_status_draft").await, vec!["1"]);
    assert_eq!(
        ids_under(&store, "content_idx_platform_instagram").await,
        vec!["1"]
    );
    let stored = store.get_by_id("1").await.unwrap();
    assert_eq!(stored.platforms, vec![Platform::Instagram]);
}

#[tokio::test]
async fn test_save_moves_between_lists() {
    let store = ContentStore::new(MemoryKv::new());
    store.save(draft("1", &[Platform::Instagram])).await.unwrap();

    let mut changed = store.get_by_id("1").await.unwrap();
    changed.status = ContentStatus::Published;
    changed.platforms = vec![Platform::Linkedin];
    store.save(changed).await.unwrap();

    assert!(ids_under(&store, "content_idx_status_draft").await.is_empty());
    assert_eq!(
        ids_under(&store, "content_idx_status_published").await,
        vec!["1"]
    );
    assert!(ids_under(&store, "content_idx_platform_instagram")
        .await
        .is_empty());
    assert_eq!(
        ids_under(&store, "content_idx_platform_linkedin").await,
        vec!["1"]
    );
    assert_eq!(ids_under(&store, "content").await, vec!["1"]);
}

#[tokio::test]
async fn test_save_puts_newest_first() {
    let store = ContentStore::new(MemoryKv::new());
    for id in ["a", "b", "c"] {
        store.save(draft(id, &[])).await.unwrap();
    }
    store.save(draft("a", &[])).await.unwrap();
    assert_eq!(ids_under(&store, "content").await, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_save_rejects_blank_id() {
    let store = ContentStore::new(MemoryKv::new());
    let result = store.save(draft("", &[])).await;
    assert!(matches!(result, Err(StoreError::InvalidItem(_))));
    assert!(store.kv().is_empty().await);
}

#[tokio::test]
async fn test_delete_scrubs_every_list() {
    let store = ContentStore::new(MemoryKv::new());
    store.save(draft("1", &[Platform::Tiktok])).await.unwrap();
    store.save(draft("2", &[Platform::Tiktok])).await.unwrap();

    assert!(store.delete("1").await.unwrap());

    assert_eq!(ids_under(&store, "content").await, vec!["2"]);
    assert_eq!(ids_under(&store, "content_idx_status_draft").await, vec!["2"]);
    assert_eq!(
        ids_under(&store, "content_idx_platform_tiktok").await,
        vec!["2"]
    );
    assert!(store.get_by_id("1").await.is_none());
    assert_eq!(store.kv().get("content_item_1").await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_unknown_id_drops_dangling_entry() {
    let kv = MemoryKv::with_entries([("content", r#"["ghost","2"]"#)]);
    let store = ContentStore::new(kv);

    assert!(!store.delete("ghost").await.unwrap());
    assert_eq!(ids_under(&store, "content").await, vec!["2"]);
}

#[tokio::test]
async fn test_delete_unreadable_record_scrubs_all_indexes() {
    let kv = MemoryKv::with_entries([
        ("content", r#"["x"]"#),
        ("content_idx_status_scheduled", r#"["x"]"#),
        ("content_idx_platform_pinterest", r#"["x"]"#),
        ("content_item_x", "{not json"),
    ]);
    let store = ContentStore::new(kv);

    assert!(store.delete("x").await.unwrap());
    assert!(ids_under(&store, "content").await.is_empty());
    assert!(ids_under(&store, "content_idx_status_scheduled")
        .await
        .is_empty());
    assert!(ids_under(&store, "content_idx_platform_pinterest")
        .await
        .is_empty());
    assert_eq!(store.kv().get("content_item_x").await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_many_keeps_order_of_rest() {
    let store = ContentStore::new(MemoryKv::new());
    for id in ["a", "b", "c", "d"] {
        store.save(draft(id, &[Platform::Threads])).await.unwrap();
    }

    let removed = store
        .delete_many(&["b".to_string(), "d".to_string(), "zzz".to_string()])
        .await
        .unwrap();

    assert_eq!(removed, 2);
    assert_eq!(ids_under(&store, "content").await, vec!["c", "a"]);
    assert_eq!(
        ids_under(&store, "content_idx_platform_threads").await,
        vec!["c", "a"]
    );
    assert!(store.get_by_id("b").await.is_none());
    assert!(store.get_by_id("a").await.is_some());
}

#[tokio::test]
async fn test_delete_many_empty_is_noop() {
    let store = ContentStore::new(MemoryKv::new());
    assert_eq!(store.delete_many(&[]).await.unwrap(), 0);
    assert!(store.kv().is_empty().await);
}

#[tokio::test]
async fn test_rebuild_drops_dangling_and_fixes_lists() {
    let store = ContentStore::new(MemoryKv::new());
    store.save(draft("1", &[Platform::Youtube])).await.unwrap();
    store
        .save(ContentItem::new("2", ContentStatus::Published))
        .await
        .unwrap();

    // Damage the indexes by hand.
    let kv = store.kv();
    kv.set("content", r#"["ghost","2","1"]"#.to_string())
        .await
        .unwrap();
    kv.set("content_idx_status_draft", "[]".to_string())
        .await
        .unwrap();
    kv.set("content_idx_status_failed", r#"["2"]"#.to_string())
        .await
        .unwrap();

    let report = store.rebuild_indexes().await.unwrap();
    assert_eq!(
        report,
        RebuildReport {
            items: 2,
            dangling_removed: 1,
            migrated: false,
        }
    );
    assert_eq!(ids_under(&store, "content").await, vec!["2", "1"]);
    assert_eq!(ids_under(&store, "content_idx_status_draft").await, vec!["1"]);
    assert!(ids_under(&store, "content_idx_status_failed").await.is_empty());
    assert_eq!(
        ids_under(&store, "content_idx_platform_youtube").await,
        vec!["1"]
    );
}

#[tokio::test]
async fn test_rebuild_empty_store() {
    let store = ContentStore::new(MemoryKv::new());
    let report = store.rebuild_indexes().await.unwrap();
    assert_eq!(report.items, 0);
    assert_eq!(store.kv().get("content").await.unwrap(), Some("[]".to_string()));
}
