use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::kv::KeyValueStore;
use crate::article::Article;

pub const BOOKMARKS_KEY: &str = "bookmarks";

/// User-curated set of articles, keyed by id.
///
/// Held in memory and written back as a whole JSON array after every
/// mutation. Insertion order is preserved.
pub struct Bookmarks {
    store: Arc<dyn KeyValueStore>,
    items: Mutex<Vec<Article>>,
}

impl Bookmarks {
    /// Load the persisted set. A missing or malformed value yields an empty set.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let raw = store
            .get(BOOKMARKS_KEY)
            .await
            .context("Failed to read bookmarks")?;

        let items = match raw {
            None => Vec::new(),
            Some(json) => match serde_json::from_str::<Vec<Article>>(&json) {
                Ok(items) => dedupe(items),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed bookmark data");
                    Vec::new()
                }
            },
        };

        tracing::debug!(count = items.len(), "Loaded bookmarks");
        Ok(Self {
            store,
            items: Mutex::new(items),
        })
    }

    /// Add an article. Returns `false` if one with the same id was already present.
    ///
    /// The in-memory set only changes once the write succeeds.
    pub async fn add(&self, article: Article) -> Result<bool> {
        let mut items = self.items.lock().await;
        if items.iter().any(|a| a.id == article.id) {
            return Ok(false);
        }
        let mut candidate = items.clone();
        candidate.push(article);
        self.persist(&candidate).await?;
        *items = candidate;
        Ok(true)
    }

    /// Remove by id. Returns `false` if nothing matched.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut items = self.items.lock().await;
        if !items.iter().any(|a| a.id == id) {
            return Ok(false);
        }
        let candidate: Vec<Article> = items.iter().filter(|a| a.id != id).cloned().collect();
        self.persist(&candidate).await?;
        *items = candidate;
        Ok(true)
    }

    pub async fn is_bookmarked(&self, id: &str) -> bool {
        self.items.lock().await.iter().any(|a| a.id == id)
    }

    pub async fn get(&self, id: &str) -> Option<Article> {
        self.items.lock().await.iter().find(|a| a.id == id).cloned()
    }

    pub async fn list(&self) -> Vec<Article> {
        self.items.lock().await.clone()
    }

    async fn persist(&self, items: &[Article]) -> Result<()> {
        let json = serde_json::to_string(items).context("Failed to encode bookmarks")?;
        self.store
            .set(BOOKMARKS_KEY, &json)
            .await
            .context("Failed to save bookmarks")
    }
}

fn dedupe(items: Vec<Article>) -> Vec<Article> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|a| seen.insert(a.id.clone()))
        .collect()
}
