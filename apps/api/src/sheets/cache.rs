//! Freshness-window cache over the last successful sheet fetch.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::sheets::columns::DescriptionMap;

/// Time source for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Tokio's clock, so paused-time tests also work against it.
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CachedDescriptions {
    data: DescriptionMap,
    fetched_at: Instant,
    expired: bool,
}

/// Holds the last successful fetch. Replaced wholesale, never merged.
pub struct DescriptionCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: Mutex<Option<CachedDescriptions>>,
}

impl DescriptionCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entry: Mutex::new(None),
        }
    }

    /// Cached data if it is inside the freshness window and non-empty.
    pub fn fresh(&self) -> Option<DescriptionMap> {
        let now = self.clock.now();
        let entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        entry
            .as_ref()
            .filter(|c| !c.data.is_empty() && !c.expired)
            .filter(|c| now.saturating_duration_since(c.fetched_at) < self.ttl)
            .map(|c| c.data.clone())
    }

    /// Last successful fetch regardless of age.
    pub fn last_known(&self) -> Option<DescriptionMap> {
        let entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        entry.as_ref().map(|c| c.data.clone())
    }

    pub fn replace(&self, data: DescriptionMap) {
        let fetched_at = self.clock.now();
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        *entry = Some(CachedDescriptions {
            data,
            fetched_at,
            expired: false,
        });
    }

    /// Ends the freshness window early. The data stays as last known.
    pub fn invalidate(&self) {
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entry.as_mut() {
            cached.expired = true;
        }
    }
}

/// Manually advanced clock for freshness tests.
#[cfg(test)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }
}
