use chrono::{DateTime, Utc};
use futures::StreamExt;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::article::{Article, CategorySet};
use crate::sampling::Sampler;
use crate::util::{non_empty, strip_control_chars};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const PLACEHOLDER_SUMMARY: &str = "No description available";

const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB
const TRENDING_PROBABILITY: f64 = 0.3;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request (including the body read) exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),

    /// Body was not the JSON shape this provider documents
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Provider reported an error inside a successful response
    #[error("Provider error: {0}")]
    Api(String),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),

    #[error("No API key configured")]
    MissingApiKey,
}

/// Connection settings shared by the HTTP-backed providers.
#[derive(Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
}

impl ProviderSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, key: Option<SecretString>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Join `path` onto `base` and append query parameters.
pub(crate) fn build_url(
    base: &str,
    path: &str,
    params: &[(&str, &str)],
) -> Result<Url, ProviderError> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    let mut url = Url::parse(&joined).map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut().extend_pairs(params.iter());
    Ok(url)
}

/// GET `url` and decode the JSON body, bounded by `timeout` and a size cap.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
    timeout: Duration,
) -> Result<T, ProviderError> {
    // Query strings carry API keys; only the path is logged.
    tracing::debug!(host = ?url.host_str(), path = %url.path(), "Provider request");

    let body = tokio::time::timeout(timeout, async {
        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status().as_u16()));
        }
        read_limited_bytes(response, MAX_RESPONSE_SIZE).await
    })
    .await
    .map_err(|_| ProviderError::Timeout(timeout))??;

    Ok(serde_json::from_slice(&body)?)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ProviderError> {
    if let Some(len) = response.content_length() {
        if usize::try_from(len).map_or(true, |len| len > limit) {
            return Err(ProviderError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ProviderError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Minimal HTML body pointing readers at the original article.
pub(crate) fn synthesize_content(title: &str, summary: &str, url: &str, source: &str) -> String {
    format!(
        "<h2>{}</h2><p>{}</p><p>Read the full article at <a href=\"{}\" target=\"_blank\">{}</a></p>",
        html_escape::encode_text(title),
        html_escape::encode_text(summary),
        html_escape::encode_double_quoted_attribute(url),
        html_escape::encode_text(source),
    )
}

/// Parse a provider timestamp, falling back to now.
pub(crate) fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

// ============================================================================
// Normalization
// ============================================================================

/// Provider record fields after source-specific decoding but before the
/// shared fallbacks are applied.
#[derive(Debug, Default)]
pub(crate) struct Draft {
    pub title: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub url: Option<String>,
}

impl Draft {
    /// Apply the shared fallbacks. Records without a url are dropped.
    pub fn into_article(
        self,
        categories: CategorySet,
        fallback_source: &str,
        sampler: &Sampler,
    ) -> Option<Article> {
        let url = non_empty(self.url)?;
        let title = clean(self.title).unwrap_or_else(|| "Untitled".to_string());
        let source = clean(self.source).unwrap_or_else(|| fallback_source.to_string());
        let author = clean(self.author).unwrap_or_else(|| source.clone());
        let summary = clean(self.summary).unwrap_or_else(|| PLACEHOLDER_SUMMARY.to_string());
        let content = non_empty(self.content)
            .unwrap_or_else(|| synthesize_content(&title, &summary, &url, &source));
        let image_url = non_empty(self.image_url)
            .unwrap_or_else(|| categories.primary().default_image().to_string());

        Some(Article {
            id: Article::new_id(),
            title,
            source,
            author,
            published_at: parse_timestamp(self.published_at.as_deref()),
            summary,
            content,
            image_url,
            url,
            categories,
            trending: sampler.chance(TRENDING_PROBABILITY),
            api_source: None,
        })
    }
}

fn clean(value: Option<String>) -> Option<String> {
    non_empty(value).map(|s| strip_control_chars(&s).into_owned())
}
