//! Integration tests for bookmarks persisted through SQLite.
//!
//! Each test creates its own in-memory database. Reloading from the same
//! database stands in for restarting the application.

use chrono::{TimeZone, Utc};
use gazette::article::{Article, Category, CategorySet};
use gazette::providers::ProviderKind;
use gazette::storage::{Bookmarks, Database, KeyValueStore, BOOKMARKS_KEY};
use pretty_assertions::assert_eq;
use std::sync::Arc;

async fn test_db() -> Arc<Database> {
    Arc::new(Database::open(":memory:").await.unwrap())
}

fn test_article(slug: &str) -> Article {
    Article {
        id: Article::new_id(),
        title: format!("Article about {slug}"),
        source: "The Guardian".to_string(),
        author: "Staff reporter".to_string(),
        published_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        summary: "A short summary".to_string(),
        content: "<p>Body</p>".to_string(),
        image_url: Category::Science.default_image().to_string(),
        url: format!("https://example.com/{slug}"),
        categories: CategorySet::with_requested(Some(Category::Science), Category::World),
        trending: true,
        api_source: Some(ProviderKind::Guardian),
    }
}

#[tokio::test]
async fn test_bookmark_survives_reload_unchanged() {
    let db = test_db().await;
    let article = test_article("glaciers");

    let bookmarks = Bookmarks::load(db.clone()).await.unwrap();
    assert!(bookmarks.add(article.clone()).await.unwrap());

    let reloaded = Bookmarks::load(db.clone()).await.unwrap();
    assert_eq!(reloaded.list().await, vec![article.clone()]);
    assert!(reloaded.is_bookmarked(&article.id).await);
}

#[tokio::test]
async fn test_add_is_idempotent_and_remove_persists() {
    let db = test_db().await;
    let first = test_article("one");
    let second = test_article("two");

    let bookmarks = Bookmarks::load(db.clone()).await.unwrap();
    assert!(bookmarks.add(first.clone()).await.unwrap());
    assert!(!bookmarks.add(first.clone()).await.unwrap());
    assert!(bookmarks.add(second.clone()).await.unwrap());
    assert!(bookmarks.remove(&first.id).await.unwrap());
    assert!(!bookmarks.remove(&first.id).await.unwrap());

    let reloaded = Bookmarks::load(db.clone()).await.unwrap();
    assert_eq!(reloaded.list().await, vec![second]);
}

#[tokio::test]
async fn test_persisted_value_uses_camel_case_fields() {
    let db = test_db().await;
    let bookmarks = Bookmarks::load(db.clone()).await.unwrap();
    bookmarks.add(test_article("format")).await.unwrap();

    let raw = db.get(BOOKMARKS_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &value[0];
    assert_eq!(entry["publishedAt"], "2024-05-01T12:30:00Z");
    assert_eq!(entry["imageUrl"], Category::Science.default_image());
    assert_eq!(entry["categories"], serde_json::json!(["science", "world"]));
    assert_eq!(entry["apiSource"], "guardian");
}

#[tokio::test]
async fn test_malformed_value_loads_empty() {
    let db = test_db().await;
    db.set(BOOKMARKS_KEY, "not json at all").await.unwrap();

    let bookmarks = Bookmarks::load(db.clone()).await.unwrap();
    assert!(bookmarks.list().await.is_empty());
}
