//! Background polling for new journal content.
//!
//! One [`Poller`] owns at most one timer task. Each tick runs
//! [`Poller::check_for_new_content`], which is skipped when another check is
//! still running or when the previous check started less than the minimum
//! check interval ago. A check that does run is bracketed by checking-status
//! events `true` then `false`; new content is delivered to update listeners
//! before the closing `false`.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::article::Article;
use crate::events::{Listeners, Subscription};
use crate::journal::JournalCache;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest timer period accepted by [`Poller::start_polling`].
const MIN_POLL_PERIOD: Duration = Duration::from_millis(100);

struct PollerInner {
    journal: Arc<JournalCache>,
    updates: Listeners<Vec<Article>>,
    status: Listeners<bool>,
    in_flight: AtomicBool,
    last_check: Mutex<Option<Instant>>,
    min_check_interval: Duration,
}

/// Clears the in-flight flag and announces the end of a check, even if the
/// check future is dropped part-way.
struct CheckGuard<'a> {
    inner: &'a PollerInner,
}

impl Drop for CheckGuard<'_> {
    fn drop(&mut self) {
        self.inner.in_flight.store(false, Ordering::Release);
        self.inner.status.notify(&false);
    }
}

impl PollerInner {
    async fn check_for_new_content(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Check already in flight, skipping");
            return false;
        }

        if !self.claim_check_slot() {
            self.in_flight.store(false, Ordering::Release);
            tracing::debug!("Checked too recently, skipping");
            return false;
        }

        self.status.notify(&true);
        let _guard = CheckGuard { inner: self };

        match self.journal.refresh_if_changed().await {
            Ok(Some(entries)) => {
                tracing::info!(count = entries.len(), "Publishing new journal entries");
                self.updates.notify(&entries);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Checking for new content failed");
                false
            }
        }
    }

    /// Record this check's start time unless the previous one is too recent.
    fn claim_check_slot(&self) -> bool {
        let mut last = self.last_check.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        if let Some(previous) = *last {
            if now.saturating_duration_since(previous) < self.min_check_interval {
                return false;
            }
        }
        *last = Some(now);
        true
    }
}

pub struct Poller {
    inner: Arc<PollerInner>,
    /// `None` while not polling.
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(journal: Arc<JournalCache>) -> Self {
        Self::with_min_check_interval(journal, MIN_CHECK_INTERVAL)
    }

    pub fn with_min_check_interval(journal: Arc<JournalCache>, min_check_interval: Duration) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                journal,
                updates: Listeners::new(),
                status: Listeners::new(),
                in_flight: AtomicBool::new(false),
                last_check: Mutex::new(None),
                min_check_interval,
            }),
            task: Mutex::new(None),
        }
    }

    /// Start checking every `interval`, beginning immediately.
    ///
    /// Replaces any timer already running. Must be called from within a
    /// tokio runtime.
    pub fn start_polling(&self, interval: Duration) {
        let period = interval.max(MIN_POLL_PERIOD);
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
            tracing::debug!("Replaced running poll timer");
        }

        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                inner.check_for_new_content().await;
            }
        }));
        tracing::info!(interval_secs = period.as_secs_f64(), "Polling started");
    }

    pub fn stop_polling(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
            tracing::info!("Polling stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Run one check now. Returns `true` only if new content was published.
    pub async fn check_for_new_content(&self) -> bool {
        self.inner.check_for_new_content().await
    }

    pub fn subscribe_to_updates<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Vec<Article>) + Send + Sync + 'static,
    {
        self.inner.updates.subscribe(listener)
    }

    pub fn subscribe_to_checking_status<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.inner.status.subscribe(listener)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}
