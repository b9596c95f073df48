//! Offline stand-in for the HTTP providers.
//!
//! Each instance answers from a fixed library of headlines, optionally after a
//! simulated network delay, so the whole pipeline can run without API keys.
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::http::synthesize_content;
use super::{NewsProvider, ProviderKind};
use crate::article::{Article, Category, CategorySet};
use crate::sampling::Sampler;

struct Seed {
    kind: ProviderKind,
    category: Category,
    source: &'static str,
    title: &'static str,
    summary: &'static str,
}

const fn seed(
    kind: ProviderKind,
    category: Category,
    source: &'static str,
    title: &'static str,
    summary: &'static str,
) -> Seed {
    Seed {
        kind,
        category,
        source,
        title,
        summary,
    }
}

use Category::*;
use ProviderKind::*;

const LIBRARY: &[Seed] = &[
    seed(MediaStack, Technology, "TechWire", "Open-source browser engine reaches 1.0",
        "After six years of development the engine now passes the major conformance suites."),
    seed(MediaStack, Business, "Market Daily", "Regional banks post stronger quarter",
        "Lower deposit costs lifted margins across mid-sized lenders."),
    seed(MediaStack, Science, "Lab Notes", "Telescope captures oldest known galaxy cluster",
        "Astronomers say the cluster formed less than a billion years after the Big Bang."),
    seed(MediaStack, Health, "Clinic Today", "Study links short walks to better sleep",
        "Ten minutes of walking after dinner improved sleep quality in a six-week trial."),
    seed(MediaStack, Entertainment, "Screen Beat", "Indie animation tops weekend box office",
        "A hand-drawn feature outperformed two studio releases."),
    seed(MediaStack, Sports, "Field Report", "Underdogs clinch league title on final day",
        "A stoppage-time winner completed an improbable season."),
    seed(MediaStack, World, "Global Desk", "Coastal cities agree on shared flood plan",
        "Twelve municipalities will pool funding for sea defences."),
    seed(MediaStack, Politics, "Capitol Brief", "Parliament passes digital services bill",
        "The bill sets new transparency rules for large platforms."),
    seed(NewsApi, Technology, "Circuit", "Chipmakers race to expand advanced packaging",
        "Demand for AI accelerators is straining packaging capacity."),
    seed(NewsApi, Politics, "The Ledger", "Coalition talks stall over budget rules",
        "Negotiators remain split on borrowing limits."),
    seed(NewsApi, Health, "Wellness Post", "New guidance on childhood vaccinations",
        "Health officials simplified the recommended schedule."),
    seed(NewsApi, Sports, "Sports Central", "Marathon record falls in cool conditions",
        "The winner shaved eleven seconds off the course record."),
    seed(NewsApi, Business, "Commerce Weekly", "Retailers bet on smaller stores",
        "Chains are trimming floor space while expanding pickup counters."),
    seed(NewsApi, Science, "Discovery Hub", "Deep-sea survey finds new coral species",
        "Researchers catalogued dozens of organisms near hydrothermal vents."),
    seed(Guardian, World, "The Guardian", "Aid convoys reach remote mountain villages",
        "Roads cleared after landslides allowed the first deliveries in weeks."),
    seed(Guardian, Politics, "The Guardian", "Local elections see record turnout",
        "Officials credited extended polling hours and postal voting."),
    seed(Guardian, Entertainment, "The Guardian", "Festival line-up leans on new voices",
        "Half the programme is by first-time directors."),
    seed(Guardian, Technology, "The Guardian", "Regulators question cloud contract terms",
        "Egress fees are at the centre of the inquiry."),
    seed(Guardian, Science, "The Guardian", "Glacier retreat accelerates in the Alps",
        "Summer melt removed a record share of ice volume."),
    seed(Guardian, Health, "The Guardian", "Hospitals trial four-day rota for nurses",
        "Early results show lower sickness absence."),
];

pub struct CatalogueProvider {
    kind: ProviderKind,
    articles: Vec<Article>,
    delay: Duration,
}

impl CatalogueProvider {
    /// Library entries for `kind`, stamped relative to now.
    pub fn new(kind: ProviderKind, sampler: Arc<Sampler>) -> Self {
        let now = Utc::now();
        let articles = LIBRARY
            .iter()
            .filter(|s| s.kind == kind)
            .enumerate()
            .map(|(i, s)| {
                let url = format!(
                    "https://example.com/{}/{}",
                    kind,
                    s.title.to_lowercase().replace(' ', "-")
                );
                Article {
                    id: Article::new_id(),
                    title: s.title.to_string(),
                    source: s.source.to_string(),
                    author: s.source.to_string(),
                    published_at: now - ChronoDuration::hours(i as i64 * 3 + 1),
                    summary: s.summary.to_string(),
                    content: synthesize_content(s.title, s.summary, &url, s.source),
                    image_url: s.category.default_image().to_string(),
                    url,
                    categories: CategorySet::single(s.category),
                    trending: sampler.chance(0.3),
                    api_source: None,
                }
            })
            .collect();

        Self {
            kind,
            articles,
            delay: Duration::ZERO,
        }
    }

    /// Provider answering from exactly `articles`.
    pub fn with_articles(kind: ProviderKind, articles: Vec<Article>) -> Self {
        Self {
            kind,
            articles,
            delay: Duration::ZERO,
        }
    }

    /// Wait this long before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl NewsProvider for CatalogueProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch_by_category(&self, category: Option<Category>, limit: usize) -> Vec<Article> {
        self.simulate_latency().await;
        self.articles
            .iter()
            .filter(|a| category.map_or(true, |c| a.has_category(c)))
            .take(limit)
            .cloned()
            .collect()
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<Article> {
        self.simulate_latency().await;
        if query.trim().is_empty() {
            return Vec::new();
        }
        self.articles
            .iter()
            .filter(|a| a.matches_query(query.trim()))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue(kind: ProviderKind) -> CatalogueProvider {
        CatalogueProvider::new(kind, Arc::new(Sampler::seeded(2)))
    }

    #[test]
    fn test_every_kind_has_articles() {
        for kind in ProviderKind::PRIORITY {
            assert!(!catalogue(kind).is_empty(), "{kind} has no catalogue");
        }
    }

    #[tokio::test]
    async fn test_category_filter_holds() {
        let provider = catalogue(ProviderKind::MediaStack);
        for c in Category::ALL {
            let articles = provider.fetch_by_category(Some(c), 10).await;
            assert!(articles.iter().all(|a| a.has_category(c)));
        }
    }

    #[tokio::test]
    async fn test_limit_and_missing_category() {
        let provider = catalogue(ProviderKind::NewsApi);
        assert_eq!(provider.fetch_by_category(None, 2).await.len(), 2);
        assert!(provider
            .fetch_by_category(Some(Category::Entertainment), 5)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_title_or_summary() {
        let provider = catalogue(ProviderKind::Guardian);
        let hits = provider.search("glacier", 5).await;
        assert_eq!(hits.len(), 1);
        assert!(provider.search("   ", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_delay_is_applied() {
        tokio::time::pause();
        let provider = catalogue(ProviderKind::Guardian).with_delay(Duration::from_secs(1));
        let started = tokio::time::Instant::now();
        provider.fetch_by_category(None, 1).await;
        assert!(started.elapsed() >= Duration::from_secs(1));
    }
}
