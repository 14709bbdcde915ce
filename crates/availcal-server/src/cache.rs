//! Availability cache with TTL (Time-To-Live) support.
//!
//! The cache holds one snapshot of the rental calendar. A read serves the
//! snapshot while it is younger than the TTL and refreshes it from the
//! [`CalendarSource`] otherwise.
//!
//! - A snapshot is only replaced by a fully successful fetch. A failed or
//!   timed-out refresh leaves the previous snapshot and its age untouched and
//!   is reported to the caller.
//! - Snapshots are immutable and published by swapping an `Arc`, so readers
//!   see either the old or the new snapshot, never a mix.
//! - At most one refresh runs at a time. Readers that find the cache stale
//!   while a refresh is in flight wait for it and are then served from the
//!   cache.

use std::sync::Arc;
use std::time::Duration;

use availcal_core::Event;
use availcal_providers::CalendarSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::error::{ServerError, ServerResult};

/// One successfully fetched calendar.
#[derive(Debug)]
pub struct CacheEntry {
    events: Vec<Event>,
    /// Wall-clock time of the fetch.
    updated_at: DateTime<Utc>,
    /// When the fetch started (monotonic clock).
    fetched_at: Instant,
}

impl CacheEntry {
    fn new(events: Vec<Event>, fetched_at: Instant) -> Self {
        Self {
            events,
            updated_at: Utc::now(),
            fetched_at,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Time elapsed since the fetch started.
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Returns true while the entry is younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

/// Where a response's events came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Served from a fresh snapshot, no remote call.
    Cache,
    /// Fetched from the feed for this request.
    Remote,
}

/// Result of a read: the events and where they came from.
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub source: Source,
    pub events: Vec<Event>,
}

impl Availability {
    fn from_entry(source: Source, entry: &CacheEntry) -> Self {
        Self {
            source,
            events: entry.events.clone(),
        }
    }
}

/// TTL cache in front of a single calendar source.
pub struct AvailabilityCache {
    source: Arc<dyn CalendarSource>,
    ttl: Duration,
    fetch_timeout: Duration,
    /// Last successful snapshot, `None` until the first fetch succeeds.
    entry: RwLock<Option<Arc<CacheEntry>>>,
    /// Held for the duration of a refresh.
    refresh: Mutex<()>,
}

impl std::fmt::Debug for AvailabilityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityCache")
            .field("source", &self.source.name())
            .field("ttl", &self.ttl)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl AvailabilityCache {
    /// Creates an empty cache.
    pub fn new(source: Arc<dyn CalendarSource>, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            source,
            ttl,
            fetch_timeout,
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the last successful snapshot, fresh or not.
    pub async fn peek(&self) -> Option<Arc<CacheEntry>> {
        self.entry.read().await.clone()
    }

    /// Returns the current availability.
    ///
    /// Serves the snapshot while it is fresh, otherwise refreshes it from
    /// the source.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Fetch` or `ServerError::FetchTimeout` when the
    /// refresh fails. The stale snapshot is kept but not served.
    pub async fn get_availability(&self) -> ServerResult<Availability> {
        if let Some(entry) = self.fresh_entry().await {
            debug!(
                age_ms = entry.age().as_millis() as u64,
                events = entry.events.len(),
                "Serving availability from cache"
            );
            return Ok(Availability::from_entry(Source::Cache, &entry));
        }

        let _guard = self.refresh.lock().await;

        // A refresh may have completed while we waited for the guard.
        if let Some(entry) = self.fresh_entry().await {
            debug!("Serving availability refreshed by a concurrent request");
            return Ok(Availability::from_entry(Source::Cache, &entry));
        }

        let entry = self.refresh_locked().await?;
        Ok(Availability::from_entry(Source::Remote, &entry))
    }

    async fn fresh_entry(&self) -> Option<Arc<CacheEntry>> {
        let entry = self.entry.read().await.clone()?;
        entry.is_fresh(self.ttl).then_some(entry)
    }

    /// Fetches and publishes a new snapshot. Caller holds the refresh guard.
    async fn refresh_locked(&self) -> ServerResult<Arc<CacheEntry>> {
        let started = Instant::now();
        debug!(source = self.source.name(), "Refreshing availability");

        let events = match tokio::time::timeout(self.fetch_timeout, self.source.fetch_events()).await
        {
            Ok(Ok(events)) => events,
            Ok(Err(e)) => {
                error!(error = %e, "Failed to fetch or parse calendar");
                return Err(ServerError::Fetch(e));
            }
            Err(_) => {
                error!(
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "Calendar fetch timed out"
                );
                return Err(ServerError::FetchTimeout {
                    timeout: self.fetch_timeout,
                });
            }
        };

        let entry = Arc::new(CacheEntry::new(events, started));
        *self.entry.write().await = Some(Arc::clone(&entry));

        info!(
            events = entry.events.len(),
            updated_at = %entry.updated_at,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Availability cache refreshed"
        );
        Ok(entry)
    }
}
