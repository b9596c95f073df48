//! Multi-provider aggregation.
//!
//! Category and search requests walk the providers in priority order and stop
//! at the first non-empty answer. Trending requests ask every provider at once
//! and merge. Neither path fails: a provider that has nothing to offer is
//! skipped, and if all of them come back empty the caller gets an empty list.
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::article::{Article, Category};
use crate::providers::{NewsProvider, ProviderKind};
use crate::sampling::Sampler;

pub struct Aggregator {
    providers: Vec<Arc<dyn NewsProvider>>,
    /// Most recent non-empty answer per provider.
    latest: RwLock<HashMap<ProviderKind, Vec<Article>>>,
    sampler: Arc<Sampler>,
}

impl Aggregator {
    /// `providers` are consulted in the order given.
    pub fn new(providers: Vec<Arc<dyn NewsProvider>>, sampler: Arc<Sampler>) -> Self {
        Self {
            providers,
            latest: RwLock::new(HashMap::new()),
            sampler,
        }
    }

    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    pub fn sampler(&self) -> &Arc<Sampler> {
        &self.sampler
    }

    /// First provider with a non-empty answer wins; later providers are not called.
    pub async fn fetch_from_all_sources(
        &self,
        category: Option<Category>,
        limit_per_source: usize,
    ) -> Vec<Article> {
        for provider in &self.providers {
            let kind = provider.kind();
            let articles = provider.fetch_by_category(category, limit_per_source).await;
            if articles.is_empty() {
                tracing::debug!(provider = %kind, category = ?category, "No articles, trying next provider");
                continue;
            }

            let articles = tag(articles, kind);
            self.remember(kind, &articles);
            tracing::info!(provider = %kind, category = ?category, count = articles.len(), "Fetched articles");
            return articles;
        }

        tracing::warn!(category = ?category, "All providers returned no articles");
        Vec::new()
    }

    /// Keyword search with the same fallback order as category fetches.
    pub async fn search_all_sources(&self, query: &str, limit_per_source: usize) -> Vec<Article> {
        for provider in &self.providers {
            let kind = provider.kind();
            let articles = provider.search(query, limit_per_source).await;
            if !articles.is_empty() {
                tracing::info!(provider = %kind, count = articles.len(), "Search answered");
                return tag(articles, kind);
            }
        }

        tracing::warn!(query = %query, "No provider returned search results");
        Vec::new()
    }

    /// Ask every provider concurrently, keep trending articles, and pad with a
    /// random sample of the rest when there are fewer than `limit`.
    ///
    /// Result order is random.
    pub async fn fetch_trending_from_all_sources(&self, limit: usize) -> Vec<Article> {
        if limit == 0 {
            return Vec::new();
        }

        let fetches = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            async move {
                let kind = provider.kind();
                (kind, provider.fetch_by_category(None, limit.saturating_mul(2)).await)
            }
        });
        let answers = join_all(fetches).await;

        let mut seen_urls = HashSet::new();
        let mut trending = Vec::new();
        let mut rest = Vec::new();
        for (kind, articles) in answers {
            if articles.is_empty() {
                tracing::debug!(provider = %kind, "No articles for trending");
                continue;
            }
            let articles = tag(articles, kind);
            self.remember(kind, &articles);
            for article in articles {
                if !seen_urls.insert(article.url.clone()) {
                    continue;
                }
                if article.trending {
                    trending.push(article);
                } else {
                    rest.push(article);
                }
            }
        }

        if trending.is_empty() && rest.is_empty() {
            tracing::warn!("All providers returned no articles for trending");
            return Vec::new();
        }

        let mut selected = trending;
        if selected.len() < limit {
            let missing = limit - selected.len();
            selected.extend(self.sampler.sample(rest, missing));
        }
        self.sampler.shuffle(&mut selected);
        selected.truncate(limit);
        selected
    }

    /// Cached results per provider, without refetching.
    pub fn latest_by_source(&self) -> HashMap<ProviderKind, Vec<Article>> {
        self.latest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// All cached results concatenated in provider priority order.
    pub fn all_latest(&self) -> Vec<Article> {
        let latest = self.latest.read().unwrap_or_else(|e| e.into_inner());
        self.providers
            .iter()
            .filter_map(|p| latest.get(&p.kind()))
            .flatten()
            .cloned()
            .collect()
    }

    fn remember(&self, kind: ProviderKind, articles: &[Article]) {
        self.latest
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind, articles.to_vec());
    }
}

fn tag(mut articles: Vec<Article>, kind: ProviderKind) -> Vec<Article> {
    for article in &mut articles {
        article.api_source = Some(kind);
    }
    articles
}
