//! Query surface consumed by front ends.
//!
//! [`NewsService`] ties the aggregator, the journal cache and the poller
//! together and keeps the merged "latest" list (news followed by journal
//! entries) that lookups and related-article selection read from.
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::aggregator::Aggregator;
use crate::article::{Article, Category};
use crate::clock::SystemClock;
use crate::config::Config;
use crate::events::{Listeners, Subscription};
use crate::journal::{CuratedQuotes, JournalCache, QuotableSource, QuoteSource};
use crate::poller::Poller;
use crate::providers::{
    CatalogueProvider, GuardianProvider, MediaStackProvider, NewsApiProvider, NewsProvider,
    ProviderKind,
};
use crate::sampling::Sampler;
use crate::storage::KeyValueStore;

/// Articles requested per provider for feeds.
pub const FEED_LIMIT: usize = 20;
/// Articles requested per provider for searches.
pub const SEARCH_LIMIT: usize = 10;
pub const TRENDING_LIMIT: usize = 5;
pub const RELATED_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Trending,
}

/// Feed view options. `category: None` means all categories.
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    pub category: Option<Category>,
    pub sort: SortOrder,
    pub query: Option<String>,
}

pub struct NewsService {
    aggregator: Arc<Aggregator>,
    journal: Arc<JournalCache>,
    poller: Poller,
    sampler: Arc<Sampler>,
    latest: Arc<RwLock<Vec<Article>>>,
    news_updates: Arc<Listeners<Vec<Article>>>,
    /// Poller updates feeding the merged list.
    _bridge: Subscription,
}

impl NewsService {
    pub fn new(aggregator: Arc<Aggregator>, journal: Arc<JournalCache>, poller: Poller) -> Self {
        let sampler = Arc::clone(aggregator.sampler());
        let latest = Arc::new(RwLock::new(Vec::new()));
        let news_updates = Arc::new(Listeners::new());

        // New journal entries replace the journal half of the merged list.
        let bridge = {
            let aggregator = Arc::clone(&aggregator);
            let latest = Arc::clone(&latest);
            let news_updates = Arc::clone(&news_updates);
            poller.subscribe_to_updates(move |entries: &Vec<Article>| {
                let mut merged = aggregator.all_latest();
                merged.extend(entries.iter().cloned());
                *latest.write().unwrap_or_else(|e| e.into_inner()) = merged.clone();
                news_updates.notify(&merged);
            })
        };

        Self {
            aggregator,
            journal,
            poller,
            sampler,
            latest,
            news_updates,
            _bridge: bridge,
        }
    }

    /// Wire up providers, quotes and polling as `config` describes.
    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let sampler = Arc::new(Sampler::from_entropy());
        let priority = config.priority();

        let (providers, quotes): (Vec<Arc<dyn NewsProvider>>, Arc<dyn QuoteSource>) =
            if config.offline {
                let providers = priority
                    .iter()
                    .map(|&kind| -> Arc<dyn NewsProvider> {
                        Arc::new(
                            CatalogueProvider::new(kind, Arc::clone(&sampler))
                                .with_delay(config.offline_delay()),
                        )
                    })
                    .collect();
                (providers, Arc::new(CuratedQuotes))
            } else {
                let client = reqwest::Client::builder()
                    .pool_max_idle_per_host(4)
                    .pool_idle_timeout(Duration::from_secs(30))
                    .tcp_keepalive(Duration::from_secs(60))
                    .build()
                    .context("Failed to build HTTP client")?;

                let providers = priority
                    .iter()
                    .map(|&kind| -> Arc<dyn NewsProvider> {
                        let settings = config.provider_settings(kind);
                        let client = client.clone();
                        let sampler = Arc::clone(&sampler);
                        match kind {
                            ProviderKind::MediaStack => {
                                Arc::new(MediaStackProvider::new(client, settings, sampler))
                            }
                            ProviderKind::NewsApi => {
                                Arc::new(NewsApiProvider::new(client, settings, sampler))
                            }
                            ProviderKind::Guardian => {
                                Arc::new(GuardianProvider::new(client, settings, sampler))
                            }
                        }
                    })
                    .collect();

                let quotes: Arc<dyn QuoteSource> = if config.quotes.remote {
                    Arc::new(
                        QuotableSource::new(client, config.quotes.base_url.clone())
                            .with_timeout(config.request_timeout()),
                    )
                } else {
                    Arc::new(CuratedQuotes)
                };
                (providers, quotes)
            };

        tracing::info!(
            offline = config.offline,
            providers = ?priority,
            "Assembled news service"
        );

        let aggregator = Arc::new(Aggregator::new(providers, Arc::clone(&sampler)));
        let journal = Arc::new(JournalCache::new(
            store,
            quotes,
            Arc::new(SystemClock),
            sampler,
        ));
        let poller = Poller::with_min_check_interval(Arc::clone(&journal), config.min_check_interval());
        Ok(Self::new(aggregator, journal, poller))
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn journal(&self) -> &JournalCache {
        &self.journal
    }

    /// News followed by today's journal entries.
    ///
    /// Served from the merged list when one exists, unless `force_refresh`.
    /// Forcing refetches the news only; the day's journal stays as cached.
    pub async fn fetch_all_articles(&self, force_refresh: bool) -> Vec<Article> {
        if !force_refresh {
            let latest = self.latest_snapshot();
            if !latest.is_empty() {
                return latest;
            }
        }

        let journal = self.journal.get_daily_entries(false).await;
        let mut merged = self.aggregator.fetch_from_all_sources(None, FEED_LIMIT).await;
        merged.extend(journal);
        *self.latest.write().unwrap_or_else(|e| e.into_inner()) = merged.clone();
        merged
    }

    pub async fn fetch_articles_by_category(&self, category: Category) -> Vec<Article> {
        if category == Category::Journal {
            return self.journal.get_daily_entries(false).await;
        }
        self.aggregator
            .fetch_from_all_sources(Some(category), FEED_LIMIT)
            .await
    }

    /// Trending news from every provider, then trending journal entries.
    pub async fn fetch_trending_articles(&self, limit: usize) -> Vec<Article> {
        let journal = self.journal.get_daily_entries(false).await;
        let mut trending = self.aggregator.fetch_trending_from_all_sources(limit).await;
        trending.extend(journal.into_iter().filter(|a| a.trending));
        trending
    }

    /// Provider search results, then journal entries whose title or summary matches.
    pub async fn search_all_articles(&self, query: &str) -> Vec<Article> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let journal = self.journal.get_daily_entries(false).await;
        let mut results = self.aggregator.search_all_sources(query, SEARCH_LIMIT).await;
        results.extend(journal.into_iter().filter(|a| a.matches_query(query)));
        results
    }

    /// Look in the merged list, the per-provider cache, then the journal.
    pub async fn fetch_article_by_id(&self, id: &str) -> Option<Article> {
        if let Some(found) = self.latest_snapshot().into_iter().find(|a| a.id == id) {
            return Some(found);
        }
        if let Some(found) = self.aggregator.all_latest().into_iter().find(|a| a.id == id) {
            return Some(found);
        }
        self.journal.get_entry_by_id(id).await
    }

    /// Up to `limit` other articles sharing `category`, in random order.
    pub async fn fetch_related_articles(
        &self,
        article_id: &str,
        category: Category,
        limit: usize,
    ) -> Vec<Article> {
        if category == Category::Journal {
            let others: Vec<Article> = self
                .journal
                .get_daily_entries(false)
                .await
                .into_iter()
                .filter(|a| a.id != article_id)
                .collect();
            return self.sampler.sample(others, limit);
        }

        let latest = self.latest_snapshot();
        if latest.len() > limit.saturating_add(1) {
            let related: Vec<Article> = latest
                .into_iter()
                .filter(|a| {
                    a.id != article_id
                        && a.has_category(category)
                        && a.primary_category() != Category::Journal
                })
                .collect();
            if related.len() >= limit {
                return self.sampler.sample(related, limit);
            }
        }

        let fetched: Vec<Article> = self
            .aggregator
            .fetch_from_all_sources(Some(category), limit.saturating_add(1))
            .await
            .into_iter()
            .filter(|a| a.id != article_id)
            .collect();
        self.sampler.sample(fetched, limit)
    }

    /// Narrow and order a feed the way a feed view presents it.
    ///
    /// A query keeps only articles that the search also returns (matched by id
    /// or url). Trending keeps trending articles, except across all categories
    /// where the trending feed replaces the list. Newest sorts by publication
    /// time, most recent first.
    pub async fn apply_filter(&self, articles: Vec<Article>, filter: &FeedFilter) -> Vec<Article> {
        let mut result: Vec<Article> = match filter.category {
            Some(c) => articles.into_iter().filter(|a| a.has_category(c)).collect(),
            None => articles,
        };

        if let Some(query) = filter.query.as_deref().filter(|q| !q.trim().is_empty()) {
            let hits = self.search_all_articles(query).await;
            let ids: HashSet<&str> = hits.iter().map(|a| a.id.as_str()).collect();
            let urls: HashSet<&str> = hits.iter().map(|a| a.url.as_str()).collect();
            result.retain(|a| ids.contains(a.id.as_str()) || urls.contains(a.url.as_str()));
        }

        match filter.sort {
            SortOrder::Trending if filter.category.is_none() => {
                self.fetch_trending_articles(TRENDING_LIMIT).await
            }
            SortOrder::Trending => {
                result.retain(|a| a.trending);
                result
            }
            SortOrder::Newest => {
                result.sort_by(|a, b| b.published_at.cmp(&a.published_at));
                result
            }
        }
    }

    // ========================================================================
    // Polling
    // ========================================================================

    pub fn start_polling(&self, interval: Duration) {
        self.poller.start_polling(interval);
    }

    pub fn stop_polling(&self) {
        self.poller.stop_polling();
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_polling()
    }

    pub async fn check_for_new_content(&self) -> bool {
        self.poller.check_for_new_content().await
    }

    /// New journal entries as they are detected.
    pub fn subscribe_to_updates<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Vec<Article>) + Send + Sync + 'static,
    {
        self.poller.subscribe_to_updates(listener)
    }

    /// The full merged list (cached news plus new journal entries) after each update.
    pub fn subscribe_to_news_updates<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Vec<Article>) + Send + Sync + 'static,
    {
        self.news_updates.subscribe(listener)
    }

    pub fn subscribe_to_checking_status<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.poller.subscribe_to_checking_status(listener)
    }

    fn latest_snapshot(&self) -> Vec<Article> {
        self.latest.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::CategorySet;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::sync::Mutex;

    fn article(n: i64, category: Category, trending: bool) -> Article {
        Article {
            id: Article::new_id(),
            title: format!("Story {n}"),
            source: "Wire".to_string(),
            author: "Wire".to_string(),
            published_at: Utc::now() - ChronoDuration::hours(n),
            summary: format!("Summary number {n}"),
            content: String::new(),
            image_url: category.default_image().to_string(),
            url: format!("https://example.com/{n}"),
            categories: CategorySet::single(category),
            trending,
            api_source: None,
        }
    }

    fn service(articles: Vec<Article>) -> NewsService {
        let sampler = Arc::new(Sampler::seeded(21));
        let providers: Vec<Arc<dyn NewsProvider>> = vec![Arc::new(
            CatalogueProvider::with_articles(ProviderKind::MediaStack, articles),
        )];
        let aggregator = Arc::new(Aggregator::new(providers, Arc::clone(&sampler)));
        let journal = Arc::new(JournalCache::new(
            Arc::new(MemoryStore::new()),
            Arc::new(CuratedQuotes),
            Arc::new(ManualClock::new("2024-05-01T09:00:00Z".parse().unwrap())),
            sampler,
        ));
        let poller = Poller::with_min_check_interval(Arc::clone(&journal), Duration::ZERO);
        NewsService::new(aggregator, journal, poller)
    }

    fn library() -> Vec<Article> {
        vec![
            article(1, Category::Technology, true),
            article(2, Category::Technology, false),
            article(3, Category::Technology, false),
            article(4, Category::Science, false),
            article(5, Category::Business, true),
        ]
    }

    #[tokio::test]
    async fn test_offline_config_assembles_catalogue() {
        let config = Config {
            offline: true,
            provider_priority: vec![ProviderKind::Guardian],
            ..Default::default()
        };
        let service = NewsService::from_config(&config, Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(service.aggregator().provider_kinds(), vec![ProviderKind::Guardian]);

        let all = service.fetch_all_articles(false).await;
        assert!(all.iter().any(|a| a.api_source == Some(ProviderKind::Guardian)));
        assert!(all.iter().any(|a| a.has_category(Category::Journal)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_delay_is_applied_to_catalogue() {
        let config = Config {
            offline: true,
            offline_delay_ms: 1_500,
            provider_priority: vec![ProviderKind::NewsApi],
            ..Default::default()
        };
        let service = NewsService::from_config(&config, Arc::new(MemoryStore::new())).unwrap();

        let started = tokio::time::Instant::now();
        let articles = service.fetch_articles_by_category(Category::Health).await;
        assert!(!articles.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(1_500));
    }

    #[tokio::test]
    async fn test_all_articles_is_news_then_journal_and_cached() {
        let service = service(library());
        let all = service.fetch_all_articles(false).await;
        assert_eq!(all.len(), 5 + crate::journal::BATCH_SIZE);
        assert!(all[..5].iter().all(|a| a.api_source == Some(ProviderKind::MediaStack)));
        assert!(all[5..].iter().all(|a| a.has_category(Category::Journal)));

        let again = service.fetch_all_articles(false).await;
        assert_eq!(again, all);
    }

    #[tokio::test]
    async fn test_forced_news_refresh_keeps_todays_journal() {
        let service = service(library());
        let before = service.journal().get_daily_entries(false).await;

        let all = service.fetch_all_articles(true).await;
        let after = service.journal().get_daily_entries(false).await;

        assert_eq!(before, after);
        assert_eq!(all[5..], before[..]);
    }

    #[tokio::test]
    async fn test_related_with_huge_limit_does_not_overflow() {
        let service = service(library());
        let all = service.fetch_all_articles(false).await;
        let related = service
            .fetch_related_articles(&all[0].id, Category::Technology, usize::MAX)
            .await;
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|a| a.id != all[0].id));
    }

    #[tokio::test]
    async fn test_journal_category_reads_cache() {
        let service = service(library());
        let journal = service.fetch_articles_by_category(Category::Journal).await;
        assert_eq!(journal, service.journal().get_daily_entries(false).await);
    }

    #[tokio::test]
    async fn test_article_by_id_checks_every_layer() {
        let service = service(library());
        let all = service.fetch_all_articles(false).await;

        let news = &all[0];
        assert_eq!(service.fetch_article_by_id(&news.id).await.as_ref(), Some(news));
        let entry = all.last().unwrap();
        assert_eq!(service.fetch_article_by_id(&entry.id).await.as_ref(), Some(entry));
        assert!(service.fetch_article_by_id("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_related_excludes_self_and_journal() {
        let service = service(library());
        let all = service.fetch_all_articles(false).await;
        let current = &all[0];

        let related = service
            .fetch_related_articles(&current.id, Category::Technology, 2)
            .await;
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|a| a.id != current.id));
        assert!(related.iter().all(|a| a.has_category(Category::Technology)));
    }

    #[tokio::test]
    async fn test_related_journal_entries() {
        let service = service(library());
        let entries = service.journal().get_daily_entries(false).await;
        let related = service
            .fetch_related_articles(&entries[0].id, Category::Journal, RELATED_LIMIT)
            .await;
        assert_eq!(related.len(), RELATED_LIMIT);
        assert!(related.iter().all(|a| a.id != entries[0].id));
    }

    #[tokio::test]
    async fn test_filter_newest_sorts_descending() {
        let service = service(library());
        let mut input = library();
        input.reverse();

        let sorted = service.apply_filter(input, &FeedFilter::default()).await;
        let titles: Vec<_> = sorted.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["Story 1", "Story 2", "Story 3", "Story 4", "Story 5"]);
    }

    #[tokio::test]
    async fn test_filter_trending_within_category() {
        let service = service(library());
        let filter = FeedFilter {
            category: Some(Category::Technology),
            sort: SortOrder::Trending,
            query: None,
        };
        let out = service.apply_filter(library(), &filter).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Story 1");
    }

    #[tokio::test]
    async fn test_filter_query_keeps_search_hits() {
        let service = service(library());
        let filter = FeedFilter {
            query: Some("number 4".to_string()),
            ..Default::default()
        };
        let out = service.apply_filter(library(), &filter).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Story 4");
    }

    #[tokio::test]
    async fn test_poller_updates_feed_merged_stream() {
        let service = service(library());
        service.fetch_all_articles(false).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = service.subscribe_to_news_updates(move |merged| {
            s.lock().unwrap().push(merged.len());
        });

        assert!(service.check_for_new_content().await);
        assert_eq!(*seen.lock().unwrap(), vec![5 + crate::journal::BATCH_SIZE]);

        // The merged list now carries the new journal entries
        let all = service.fetch_all_articles(false).await;
        let cached = service.journal().cached_entries().await;
        assert_eq!(all[5..], cached[..]);
    }
}
