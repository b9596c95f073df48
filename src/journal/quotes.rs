//! Seed quotes for journal entries.
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{build_url, get_json, ProviderError, DEFAULT_TIMEOUT};

/// Quotes per generated batch.
pub const BATCH_SIZE: usize = 5;

pub const QUOTABLE_BASE_URL: &str = "https://api.quotable.io";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Quote {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Quote service request failed: {0}")]
    Request(#[from] ProviderError),

    #[error("Quote service returned no quotes")]
    Empty,
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// The batch used to build `date`'s journal.
    async fn daily_quotes(&self, date: NaiveDate) -> Result<Vec<Quote>, QuoteError>;

    /// The newest batch, checked by the poller for changes.
    async fn latest_quotes(&self) -> Result<Vec<Quote>, QuoteError>;
}

// ============================================================================
// Curated library
// ============================================================================

const LIBRARY: &[(&str, &str, &[&str])] = &[
    ("The only limit to our realization of tomorrow is our doubts of today.", "Franklin D. Roosevelt", &["inspiration", "motivation"]),
    ("The journey of a thousand miles begins with one step.", "Lao Tzu", &["wisdom", "journey"]),
    ("Happiness is not something ready-made. It comes from your own actions.", "Dalai Lama", &["happiness", "mindfulness"]),
    ("The best way to predict the future is to create it.", "Peter Drucker", &["future", "creativity"]),
    ("In the middle of difficulty lies opportunity.", "Albert Einstein", &["opportunity", "resilience"]),
    ("Knowing yourself is the beginning of all wisdom.", "Aristotle", &["wisdom", "reflection"]),
    ("Nature does not hurry, yet everything is accomplished.", "Lao Tzu", &["nature", "patience"]),
    ("Do what you can, with what you have, where you are.", "Theodore Roosevelt", &["courage", "action"]),
    ("Simplicity is the ultimate sophistication.", "Leonardo da Vinci", &["simplicity"]),
    ("Gratitude turns what we have into enough.", "Aesop", &["gratitude"]),
    ("Life is like riding a bicycle. To keep your balance you must keep moving.", "Albert Einstein", &["balance", "growth"]),
    ("We are what we repeatedly do. Excellence, then, is not an act, but a habit.", "Will Durant", &["growth", "habit"]),
    ("Alone we can do so little; together we can do so much.", "Helen Keller", &["connection", "community"]),
    ("It does not matter how slowly you go as long as you do not stop.", "Confucius", &["resilience", "persistence"]),
    ("The present moment is filled with joy and happiness. If you are attentive, you will see it.", "Thich Nhat Hanh", &["mindfulness", "present"]),
];

const LATEST: &[(&str, &str, &[&str])] = &[
    ("Success is not final, failure is not fatal: it is the courage to continue that counts.", "Winston Churchill", &["success", "courage"]),
    ("Life is what happens when you're busy making other plans.", "John Lennon", &["life", "planning"]),
    ("The future belongs to those who believe in the beauty of their dreams.", "Eleanor Roosevelt", &["future", "dreams"]),
    ("The purpose of our lives is to be happy.", "Dalai Lama", &["purpose", "happiness"]),
    ("You only live once, but if you do it right, once is enough.", "Mae West", &["life", "living"]),
];

fn to_quote(prefix: &str, index: usize, entry: &(&str, &str, &[&str])) -> Quote {
    let (content, author, tags) = entry;
    Quote {
        id: format!("{prefix}-{index}"),
        content: content.to_string(),
        author: author.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// Built-in quotes; the daily batch rotates through the library by date.
#[derive(Debug, Default, Clone, Copy)]
pub struct CuratedQuotes;

impl CuratedQuotes {
    fn batch_for(date: NaiveDate) -> Vec<Quote> {
        let day = date.num_days_from_ce().unsigned_abs() as usize;
        let start = day * BATCH_SIZE % LIBRARY.len();
        (0..BATCH_SIZE)
            .map(|offset| {
                let index = (start + offset) % LIBRARY.len();
                to_quote("library", index, &LIBRARY[index])
            })
            .collect()
    }
}

#[async_trait]
impl QuoteSource for CuratedQuotes {
    async fn daily_quotes(&self, date: NaiveDate) -> Result<Vec<Quote>, QuoteError> {
        Ok(Self::batch_for(date))
    }

    async fn latest_quotes(&self) -> Result<Vec<Quote>, QuoteError> {
        Ok(LATEST
            .iter()
            .enumerate()
            .map(|(i, entry)| to_quote("latest", i, entry))
            .collect())
    }
}

// ============================================================================
// Remote
// ============================================================================

/// Random quotes from a Quotable-compatible HTTP service.
pub struct QuotableSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl QuotableSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn random_batch(&self) -> Result<Vec<Quote>, QuoteError> {
        let limit = BATCH_SIZE.to_string();
        let url = build_url(&self.base_url, "quotes/random", &[("limit", limit.as_str())])?;
        let quotes: Vec<Quote> = get_json(&self.client, url, self.timeout).await?;
        if quotes.is_empty() {
            return Err(QuoteError::Empty);
        }
        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSource for QuotableSource {
    async fn daily_quotes(&self, _date: NaiveDate) -> Result<Vec<Quote>, QuoteError> {
        self.random_batch().await
    }

    async fn latest_quotes(&self) -> Result<Vec<Quote>, QuoteError> {
        self.random_batch().await
    }
}
