//! Periodic ingestion.
//!
//! A [`Watcher`] runs every configured crawler on an interval, filters what
//! they return and stores it. Retention pruning runs alongside on its own
//! interval. A [`WatchHandle`] stops the loop from another task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::entry::Crawler;
use crate::error::Result;
use crate::filter::EntryFilter;
use crate::storage::Storage;

/// A cloneable handle used to stop a running watch loop.
#[derive(Debug, Clone, Default)]
pub struct WatchHandle {
    stop_signal: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl WatchHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the loop to stop. A pending sleep is cut short.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    /// Reset the stop signal.
    pub fn reset(&self) {
        self.stop_signal.store(false, Ordering::SeqCst);
    }

    async fn stopped(&self) {
        while !self.should_stop() {
            self.wake.notified().await;
        }
    }
}

/// What one ingestion cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Entries returned by the crawlers.
    pub fetched: usize,
    /// Entries newly stored.
    pub inserted: usize,
    /// Entries already stored.
    pub duplicates: usize,
    /// Entries dropped by the filter.
    pub blocked: usize,
    /// Names of crawlers whose fetch failed.
    pub failed_crawlers: Vec<&'static str>,
}

/// Retention limits applied while watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    /// Drop entries fetched longer ago than this.
    pub max_age: Option<Duration>,
    /// Keep at most this many entries; 0 keeps all.
    pub max_entries: usize,
    /// Time between pruning passes.
    pub interval: Duration,
}

impl Retention {
    /// Retention limits from the storage configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_age: config.max_age(),
            max_entries: config.storage.max_entries,
            interval: config.prune_interval(),
        }
    }

    /// Prune `storage` down to these limits. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete fails.
    pub fn apply(&self, storage: &Storage) -> Result<usize> {
        let mut deleted = 0;
        if let Some(max_age) = self.max_age.and_then(|d| chrono::Duration::from_std(d).ok()) {
            deleted += storage.prune_older_than(max_age)?;
        }
        if self.max_entries > 0 {
            deleted += storage.prune_keep_recent(self.max_entries)?;
        }
        Ok(deleted)
    }
}

/// Runs crawlers on an interval.
pub struct Watcher {
    crawlers: Vec<Box<dyn Crawler>>,
    interval: Duration,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field(
                "crawlers",
                &self.crawlers.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("interval", &self.interval)
            .finish()
    }
}

impl Watcher {
    /// Create a watcher over `crawlers`.
    #[must_use]
    pub fn new(crawlers: Vec<Box<dyn Crawler>>, interval: Duration) -> Self {
        Self { crawlers, interval }
    }

    /// Run every crawler once and store what passes the filter.
    ///
    /// A failing crawler is logged, recorded in the report and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if storing entries fails.
    pub async fn run_cycle(&self, storage: &Storage, filter: &EntryFilter) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        for crawler in &self.crawlers {
            let entries = match crawler.fetch().await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(crawler = crawler.name(), error = %e, "Crawler failed");
                    report.failed_crawlers.push(crawler.name());
                    continue;
                }
            };

            report.fetched += entries.len();
            let (passed, blocked) = filter.apply(entries);
            report.blocked += blocked;

            let stored = storage.insert_many(&passed)?;
            report.inserted += stored.inserted;
            report.duplicates += stored.duplicates;

            info!(
                crawler = crawler.name(),
                inserted = stored.inserted,
                duplicates = stored.duplicates,
                blocked,
                "Crawler finished"
            );
        }

        Ok(report)
    }

    /// Run cycles until `handle` is stopped or Ctrl-C is received.
    ///
    /// Pruning runs after the first cycle and then every
    /// `retention.interval`.
    ///
    /// # Errors
    ///
    /// Returns an error if storing or pruning fails.
    pub async fn run(
        &self,
        storage: &Storage,
        filter: &EntryFilter,
        retention: &Retention,
        handle: &WatchHandle,
    ) -> Result<()> {
        info!(
            crawlers = self.crawlers.len(),
            interval_secs = self.interval.as_secs(),
            "Watch started"
        );
        let mut last_prune: Option<Instant> = None;

        while !handle.should_stop() {
            let report = self.run_cycle(storage, filter).await?;
            info!(
                fetched = report.fetched,
                inserted = report.inserted,
                duplicates = report.duplicates,
                blocked = report.blocked,
                failed = report.failed_crawlers.len(),
                "Cycle complete"
            );

            if last_prune.map_or(true, |t| t.elapsed() >= retention.interval) {
                match retention.apply(storage) {
                    Ok(deleted) if deleted > 0 => info!(deleted, "Retention applied"),
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "Pruning failed");
                        return Err(e);
                    }
                }
                last_prune = Some(Instant::now());
            }

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = handle.stopped() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received");
                    handle.stop();
                }
            }
        }

        info!("Watch stopped");
        Ok(())
    }
}
