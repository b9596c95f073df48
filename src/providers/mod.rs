//! External article providers.
//!
//! Every provider normalizes its own wire format into [`Article`] and maps its
//! own category vocabulary into [`Category`]. Failures never cross the trait
//! boundary: a provider that cannot answer returns an empty list and logs why.
mod catalogue;
mod guardian;
mod http;
mod mediastack;
mod newsapi;

pub use catalogue::CatalogueProvider;
pub use guardian::{GuardianProvider, DEFAULT_BASE_URL as GUARDIAN_BASE_URL};
pub use http::{ProviderError, ProviderSettings, DEFAULT_TIMEOUT, PLACEHOLDER_SUMMARY};
pub(crate) use http::{build_url, get_json};
pub use mediastack::{MediaStackProvider, DEFAULT_BASE_URL as MEDIASTACK_BASE_URL};
pub use newsapi::{NewsApiProvider, DEFAULT_BASE_URL as NEWSAPI_BASE_URL};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::article::{Article, Category};

/// Identifies which external source an article came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    MediaStack,
    NewsApi,
    Guardian,
}

impl ProviderKind {
    /// Default priority for the fallback chain.
    pub const PRIORITY: [ProviderKind; 3] = [
        ProviderKind::MediaStack,
        ProviderKind::NewsApi,
        ProviderKind::Guardian,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::MediaStack => "mediastack",
            ProviderKind::NewsApi => "newsapi",
            ProviderKind::Guardian => "guardian",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::PRIORITY
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("Unknown provider: {s}"))
    }
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Up to `limit` recent articles, optionally restricted to one category.
    ///
    /// When `category` is given, every returned article carries it.
    async fn fetch_by_category(&self, category: Option<Category>, limit: usize) -> Vec<Article>;

    /// Up to `limit` articles matching a keyword query.
    async fn search(&self, query: &str, limit: usize) -> Vec<Article>;
}

/// Collapse an adapter result into the infallible trait contract.
pub(crate) fn recover(
    kind: ProviderKind,
    operation: &'static str,
    result: Result<Vec<Article>, ProviderError>,
) -> Vec<Article> {
    match result {
        Ok(articles) => {
            tracing::debug!(provider = %kind, operation, count = articles.len(), "Provider answered");
            articles
        }
        Err(e) => {
            tracing::warn!(provider = %kind, operation, error = %e, "Provider request failed");
            Vec::new()
        }
    }
}
