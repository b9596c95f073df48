//! Daily journal cache.
//!
//! Journal entries are generated from a batch of quotes at most once per
//! calendar day and persisted together with the date they belong to. Reads on
//! the same day return the stored entries unchanged; the first read after the
//! date rolls over regenerates them.
//!
//! Generation never fails from the caller's point of view: if the quote source
//! errors, the last stored entries are served regardless of their date, and
//! failing that a small built-in set.
mod quotes;
mod themes;

pub use quotes::{
    CuratedQuotes, QuotableSource, Quote, QuoteError, QuoteSource, BATCH_SIZE, QUOTABLE_BASE_URL,
};
pub use themes::{
    fallback_entries, find_relevant_theme, quote_to_entry, Theme, JOURNAL_SOURCE, THEMES,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::article::Article;
use crate::clock::Clock;
use crate::sampling::Sampler;
use crate::storage::KeyValueStore;

pub const DAILY_ENTRIES_KEY: &str = "journal.daily_entries";

/// Persisted shape of the daily cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCacheEntry {
    pub date: NaiveDate,
    pub entries: Vec<Article>,
}

pub struct JournalCache {
    store: Arc<dyn KeyValueStore>,
    quotes: Arc<dyn QuoteSource>,
    clock: Arc<dyn Clock>,
    sampler: Arc<Sampler>,
    /// Serializes every read-modify-write of the stored entry.
    regen: Mutex<()>,
}

impl JournalCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        quotes: Arc<dyn QuoteSource>,
        clock: Arc<dyn Clock>,
        sampler: Arc<Sampler>,
    ) -> Self {
        Self {
            store,
            quotes,
            clock,
            sampler,
            regen: Mutex::new(()),
        }
    }

    /// Today's entries, generating them if needed.
    ///
    /// `force_refresh` skips the stored entry for today. The stored entry is
    /// still used as the fallback if regeneration fails.
    pub async fn get_daily_entries(&self, force_refresh: bool) -> Vec<Article> {
        let _guard = self.regen.lock().await;
        let today = self.clock.today();
        let cached = self.read_cache().await;

        if !force_refresh {
            if let Some(entry) = &cached {
                if entry.date == today && !entry.entries.is_empty() {
                    tracing::debug!(date = %today, "Using cached journal entries");
                    return entry.entries.clone();
                }
            }
        }

        match self.generate(today).await {
            Ok(entries) => {
                tracing::info!(date = %today, count = entries.len(), force_refresh, "Generated journal entries");
                self.write_cache(today, &entries).await;
                entries
            }
            Err(e) => {
                tracing::warn!(error = %e, "Journal generation failed");
                match cached {
                    Some(entry) if !entry.entries.is_empty() => {
                        tracing::info!(date = %entry.date, "Serving stale journal entries");
                        entry.entries
                    }
                    _ => {
                        tracing::info!("Serving built-in journal entries");
                        fallback_entries(self.clock.now())
                    }
                }
            }
        }
    }

    /// Look up an entry in the stored cache, regenerating if it is not there.
    pub async fn get_entry_by_id(&self, id: &str) -> Option<Article> {
        if let Some(entry) = self.read_cache().await {
            if let Some(found) = entry.entries.into_iter().find(|a| a.id == id) {
                return Some(found);
            }
        }
        self.get_daily_entries(false)
            .await
            .into_iter()
            .find(|a| a.id == id)
    }

    /// Stored entries without triggering generation.
    pub async fn cached_entries(&self) -> Vec<Article> {
        self.read_cache()
            .await
            .map(|entry| entry.entries)
            .unwrap_or_default()
    }

    /// Fetch the newest quote batch and, if none of it is already cached,
    /// replace the stored entry with it.
    ///
    /// Entries are compared by summary and author since ids are regenerated
    /// every time. Returns the new entries, or `None` when nothing changed.
    pub async fn refresh_if_changed(&self) -> Result<Option<Vec<Article>>, QuoteError> {
        let _guard = self.regen.lock().await;

        let quotes = self.quotes.latest_quotes().await?;
        if quotes.is_empty() {
            return Err(QuoteError::Empty);
        }
        let now = self.clock.now();
        let candidates: Vec<Article> = quotes
            .iter()
            .map(|q| quote_to_entry(q, now, &self.sampler))
            .collect();

        let cached = self.cached_entries().await;
        let overlaps = cached.iter().any(|old| {
            candidates
                .iter()
                .any(|new| new.summary == old.summary && new.author == old.author)
        });
        if !cached.is_empty() && overlaps {
            tracing::debug!("No new journal content");
            return Ok(None);
        }

        tracing::info!(count = candidates.len(), "New journal content detected");
        self.write_cache(self.clock.today(), &candidates).await;
        Ok(Some(candidates))
    }

    async fn generate(&self, date: NaiveDate) -> Result<Vec<Article>, QuoteError> {
        let quotes = self.quotes.daily_quotes(date).await?;
        if quotes.is_empty() {
            return Err(QuoteError::Empty);
        }
        let now = self.clock.now();
        Ok(quotes
            .iter()
            .map(|q| quote_to_entry(q, now, &self.sampler))
            .collect())
    }

    /// Stored entry, or `None` if absent, unreadable or malformed.
    async fn read_cache(&self) -> Option<DailyCacheEntry> {
        let raw = match self.store.get(DAILY_ENTRIES_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read journal cache");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed journal cache");
                None
            }
        }
    }

    async fn write_cache(&self, date: NaiveDate, entries: &[Article]) {
        let entry = DailyCacheEntry {
            date,
            entries: entries.to_vec(),
        };
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode journal cache");
                return;
            }
        };
        if let Err(e) = self.store.set(DAILY_ENTRIES_KEY, &json).await {
            tracing::warn!(error = %e, "Failed to persist journal cache");
        }
    }
}
