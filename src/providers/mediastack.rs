use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;

use super::http::{build_url, get_json, Draft, ProviderError, ProviderSettings};
use super::{recover, NewsProvider, ProviderKind};
use crate::article::{Article, Category, CategorySet};
use crate::sampling::Sampler;

pub const DEFAULT_BASE_URL: &str = "https://api.mediastack.com/v1";

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    data: Vec<Record>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Record {
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<String>,
    image: Option<String>,
    category: Option<String>,
    published_at: Option<String>,
}

// ============================================================================
// Category mapping
// ============================================================================

/// Canonical category to the MediaStack `categories` parameter.
fn to_source_category(category: Category) -> Option<&'static str> {
    match category {
        Category::Politics | Category::World => Some("general"),
        Category::Business => Some("business"),
        Category::Entertainment => Some("entertainment"),
        Category::Health => Some("health"),
        Category::Science => Some("science"),
        Category::Sports => Some("sports"),
        Category::Technology => Some("technology"),
        Category::Journal => None,
    }
}

/// MediaStack category name to canonical; unknown names land in `world`.
fn from_source_category(name: Option<&str>) -> Category {
    match name.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("business") => Category::Business,
        Some("entertainment") => Category::Entertainment,
        Some("health") => Category::Health,
        Some("science") => Category::Science,
        Some("sports") => Category::Sports,
        Some("technology") => Category::Technology,
        _ => Category::World,
    }
}

// ============================================================================
// Provider
// ============================================================================

pub struct MediaStackProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    sampler: Arc<Sampler>,
}

impl MediaStackProvider {
    pub fn new(client: reqwest::Client, settings: ProviderSettings, sampler: Arc<Sampler>) -> Self {
        Self {
            client,
            settings,
            sampler,
        }
    }

    async fn request(
        &self,
        requested: Option<Category>,
        extra: &[(&str, &str)],
        limit: usize,
    ) -> Result<Vec<Article>, ProviderError> {
        let key = self
            .settings
            .api_key
            .as_ref()
            .ok_or(ProviderError::MissingApiKey)?;
        let limit_str = limit.to_string();

        let mut params = vec![
            ("access_key", key.expose_secret()),
            ("languages", "en"),
            ("limit", limit_str.as_str()),
            ("sort", "published_desc"),
        ];
        params.extend_from_slice(extra);

        let url = build_url(&self.settings.base_url, "news", &params)?;
        let body: NewsResponse = get_json(&self.client, url, self.settings.timeout).await?;

        if let Some(err) = body.error {
            return Err(ProviderError::Api(
                err.message
                    .or(err.code)
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(body
            .data
            .into_iter()
            .filter_map(|r| {
                let derived = from_source_category(r.category.as_deref());
                Draft {
                    title: r.title,
                    source: r.source,
                    author: r.author,
                    published_at: r.published_at,
                    summary: r.description,
                    content: None,
                    image_url: r.image,
                    url: r.url,
                }
                .into_article(
                    CategorySet::with_requested(requested, derived),
                    "MediaStack",
                    &self.sampler,
                )
            })
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl NewsProvider for MediaStackProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::MediaStack
    }

    async fn fetch_by_category(&self, category: Option<Category>, limit: usize) -> Vec<Article> {
        if limit == 0 {
            return Vec::new();
        }
        let result = match category {
            Some(c) => match to_source_category(c) {
                Some(source) => self.request(Some(c), &[("categories", source)], limit).await,
                None => {
                    tracing::debug!(category = %c, "MediaStack has no such category");
                    Ok(Vec::new())
                }
            },
            None => self.request(None, &[], limit).await,
        };
        recover(self.kind(), "fetch", result)
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<Article> {
        if limit == 0 || query.trim().is_empty() {
            return Vec::new();
        }
        let result = self.request(None, &[("keywords", query.trim())], limit).await;
        recover(self.kind(), "search", result)
    }
}
