use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;

use super::http::{build_url, get_json, Draft, ProviderError, ProviderSettings};
use super::{recover, NewsProvider, ProviderKind};
use crate::article::{Article, Category, CategorySet};
use crate::sampling::Sampler;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Record>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    source: Option<SourceRef>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceRef {
    name: Option<String>,
}

/// NewsAPI has no politics or world headline category; both use `general`.
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

/// Articles carry no category of their own, so it is guessed from the source name.
fn category_from_source(source_name: Option<&str>) -> Category {
    match source_name {
        Some(name) if name.to_lowercase().contains("sport") => Category::Sports,
        _ => Category::World,
    }
}

pub struct NewsApiProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    sampler: Arc<Sampler>,
}

impl NewsApiProvider {
    pub fn new(client: reqwest::Client, settings: ProviderSettings, sampler: Arc<Sampler>) -> Self {
        Self {
            client,
            settings,
            sampler,
        }
    }

    async fn request(
        &self,
        endpoint: &str,
        requested: Option<Category>,
        extra: &[(&str, &str)],
        limit: usize,
    ) -> Result<Vec<Article>, ProviderError> {
        let key = self
            .settings
            .api_key
            .as_ref()
            .ok_or(ProviderError::MissingApiKey)?;
        let page_size = limit.min(100).to_string();

        let mut params = vec![
            ("apiKey", key.expose_secret()),
            ("pageSize", page_size.as_str()),
            ("language", "en"),
        ];
        params.extend_from_slice(extra);

        let url = build_url(&self.settings.base_url, endpoint, &params)?;
        let body: NewsApiResponse = get_json(&self.client, url, self.settings.timeout).await?;

        if body.status != "ok" {
            return Err(ProviderError::Api(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        Ok(body
            .articles
            .into_iter()
            .filter_map(|r| {
                let source = r.source.and_then(|s| s.name);
                let derived = category_from_source(source.as_deref());
                Draft {
                    title: r.title,
                    source,
                    author: r.author,
                    published_at: r.published_at,
                    summary: r.description,
                    content: r.content,
                    image_url: r.url_to_image,
                    url: r.url,
                }
                .into_article(
                    CategorySet::with_requested(requested, derived),
                    "NewsAPI",
                    &self.sampler,
                )
            })
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::NewsApi
    }

    async fn fetch_by_category(&self, category: Option<Category>, limit: usize) -> Vec<Article> {
        if limit == 0 {
            return Vec::new();
        }
        let result = match category {
            Some(c) => match to_source_category(c) {
                Some(source) => {
                    self.request("top-headlines", Some(c), &[("category", source)], limit)
                        .await
                }
                None => {
                    tracing::debug!(category = %c, "NewsAPI has no such category");
                    Ok(Vec::new())
                }
            },
            None => self.request("top-headlines", None, &[], limit).await,
        };
        recover(self.kind(), "fetch", result)
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<Article> {
        if limit == 0 || query.trim().is_empty() {
            return Vec::new();
        }
        let result = self
            .request("everything", None, &[("q", query.trim())], limit)
            .await;
        recover(self.kind(), "search", result)
    }
}
