use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;

use super::http::{build_url, get_json, Draft, ProviderError, ProviderSettings};
use super::{recover, NewsProvider, ProviderKind};
use crate::article::{Article, Category, CategorySet};
use crate::sampling::Sampler;
use crate::util::strip_html_tags;

pub const DEFAULT_BASE_URL: &str = "https://content.guardianapis.com";

/// The Guardian accepts this developer key for low-volume use.
const PUBLIC_TEST_KEY: &str = "test";
const SHOW_FIELDS: &str = "headline,trailText,byline,thumbnail,body";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    results: Vec<Record>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    section_id: Option<String>,
    web_publication_date: Option<String>,
    web_title: Option<String>,
    web_url: Option<String>,
    #[serde(default)]
    fields: Fields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fields {
    headline: Option<String>,
    trail_text: Option<String>,
    byline: Option<String>,
    thumbnail: Option<String>,
    body: Option<String>,
}

/// Canonical category to a Guardian section id.
fn to_section(category: Category) -> Option<&'static str> {
    match category {
        Category::Sports => Some("sport"),
        Category::Health => Some("lifeandstyle"),
        Category::Entertainment => Some("culture"),
        Category::Politics => Some("politics"),
        Category::Technology => Some("technology"),
        Category::Business => Some("business"),
        Category::Science => Some("science"),
        Category::World => Some("world"),
        Category::Journal => None,
    }
}

fn from_section(section_id: Option<&str>) -> Category {
    match section_id.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("business") | Some("money") => Category::Business,
        Some("politics") => Category::Politics,
        Some("technology") => Category::Technology,
        Some("sport") | Some("football") => Category::Sports,
        Some("science") | Some("environment") => Category::Science,
        Some("lifeandstyle") | Some("society") => Category::Health,
        Some("culture") | Some("film") | Some("music") | Some("books") | Some("tv-and-radio") => {
            Category::Entertainment
        }
        _ => Category::World,
    }
}

pub struct GuardianProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    sampler: Arc<Sampler>,
}

impl GuardianProvider {
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
            .map(|k| k.expose_secret())
            .unwrap_or(PUBLIC_TEST_KEY);
        let page_size = limit.min(50).to_string();

        let mut params = vec![
            ("api-key", key),
            ("page-size", page_size.as_str()),
            ("show-fields", SHOW_FIELDS),
        ];
        params.extend_from_slice(extra);

        let url = build_url(&self.settings.base_url, "search", &params)?;
        let envelope: Envelope = get_json(&self.client, url, self.settings.timeout).await?;
        let body = envelope.response;

        if body.status != "ok" {
            return Err(ProviderError::Api(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        Ok(body
            .results
            .into_iter()
            .filter_map(|r| {
                let derived = from_section(r.section_id.as_deref());
                let fields = r.fields;
                Draft {
                    title: fields.headline.or(r.web_title),
                    source: Some("The Guardian".to_string()),
                    author: fields.byline,
                    published_at: r.web_publication_date,
                    summary: fields.trail_text.map(|t| strip_html_tags(&t)),
                    content: fields.body,
                    image_url: fields.thumbnail,
                    url: r.web_url,
                }
                .into_article(
                    CategorySet::with_requested(requested, derived),
                    "The Guardian",
                    &self.sampler,
                )
            })
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl NewsProvider for GuardianProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Guardian
    }

    async fn fetch_by_category(&self, category: Option<Category>, limit: usize) -> Vec<Article> {
        if limit == 0 {
            return Vec::new();
        }
        let result = match category {
            Some(c) => match to_section(c) {
                Some(section) => self.request(Some(c), &[("section", section)], limit).await,
                None => {
                    tracing::debug!(category = %c, "Guardian has no such section");
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
        let result = self.request(None, &[("q", query.trim())], limit).await;
        recover(self.kind(), "search", result)
    }
}
