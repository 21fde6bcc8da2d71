//! Per-caller fixed-window rate limiting.
//!
//! Each identity gets a counter that resets once the current time is more
//! than one window past the moment the window opened. A caller may therefore
//! burst up to twice the limit across a window boundary; under steady load the
//! bound is `max_requests` per window.
//!
//! The limiter never blocks a request because of its own failures: a store
//! error is logged and the request is admitted.

use crate::{Error, Result, config::LimitsConfig};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub window_start_ms: i64,
    pub count: u32,
}

impl RateLimitRecord {
    pub fn is_expired(&self, now_ms: i64, window_ms: i64) -> bool {
        now_ms - self.window_start_ms > window_ms
    }
}

/// Storage behind the limiter. `hit` is built from the three primitives by
/// default; stores that can do better should perform it atomically.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn get(&self, identity: &str) -> Result<Option<RateLimitRecord>>;

    /// Adds one to the record's count, creating the record at `now_ms` if it
    /// does not exist.
    async fn increment(&self, identity: &str, now_ms: i64) -> Result<RateLimitRecord>;

    /// Starts a new window at `now_ms` with a zero count.
    async fn reset(&self, identity: &str, now_ms: i64) -> Result<()>;

    /// Records one request and returns the resulting record.
    async fn hit(&self, identity: &str, now_ms: i64, window_ms: i64) -> Result<RateLimitRecord> {
        let expired = match self.get(identity).await? {
            Some(record) => record.is_expired(now_ms, window_ms),
            None => true,
        };
        if expired {
            self.reset(identity, now_ms).await?;
        }
        self.increment(identity, now_ms).await
    }
}

/// Process-local store. Records do not survive a restart and are not shared
/// between instances.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRateLimitStore {
    records: Arc<Mutex<HashMap<String, RateLimitRecord>>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, RateLimitRecord>>> {
        self.records
            .lock()
            .map_err(|e| Error::rate_limit_store(format!("Failed to acquire lock: {}", e)))
    }

    /// Drops every record whose window has already closed. Returns how many
    /// records were removed.
    pub fn purge_expired(&self, now_ms: i64, window_ms: i64) -> Result<usize> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now_ms, window_ms));
        Ok(before - records.len())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn get(&self, identity: &str) -> Result<Option<RateLimitRecord>> {
        Ok(self.lock()?.get(identity).copied())
    }

    async fn increment(&self, identity: &str, now_ms: i64) -> Result<RateLimitRecord> {
        let mut records = self.lock()?;
        let record = records
            .entry(identity.to_string())
            .or_insert(RateLimitRecord {
                window_start_ms: now_ms,
                count: 0,
            });
        record.count = record.count.saturating_add(1);
        Ok(*record)
    }

    async fn reset(&self, identity: &str, now_ms: i64) -> Result<()> {
        self.lock()?.insert(
            identity.to_string(),
            RateLimitRecord {
                window_start_ms: now_ms,
                count: 0,
            },
        );
        Ok(())
    }

    async fn hit(&self, identity: &str, now_ms: i64, window_ms: i64) -> Result<RateLimitRecord> {
        let mut records = self.lock()?;
        let record = records
            .entry(identity.to_string())
            .or_insert(RateLimitRecord {
                window_start_ms: now_ms,
                count: 0,
            });
        if record.is_expired(now_ms, window_ms) {
            record.window_start_ms = now_ms;
            record.count = 0;
        }
        record.count = record.count.saturating_add(1);
        Ok(*record)
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    window_ms: i64,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, window_ms: i64, max_requests: u32) -> Self {
        Self {
            store,
            window_ms,
            max_requests,
        }
    }

    pub fn from_config(store: Arc<dyn RateLimitStore>, limits: &LimitsConfig) -> Self {
        Self::new(store, limits.rate_limit_window_ms, limits.rate_limit_max_requests)
    }

    /// Counts a request from `identity` at the current wall-clock time.
    pub async fn check(&self, identity: &str) -> Result<()> {
        self.check_at(identity, Utc::now().timestamp_millis()).await
    }

    /// Counts a request from `identity` at `now_ms`. Only a count over the
    /// limit is an error; store failures admit the request.
    pub async fn check_at(&self, identity: &str, now_ms: i64) -> Result<()> {
        let record = match self.store.hit(identity, now_ms, self.window_ms).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Rate limiter error, admitting request: {}", e);
                return Ok(());
            }
        };

        if record.count > self.max_requests {
            warn!(
                "Rate limit exceeded for {}: {} requests in window",
                identity, record.count
            );
            return Err(Error::RateLimited {
                identity: identity.to_string(),
                count: record.count,
                max: self.max_requests,
            });
        }

        debug!(
            "Admitted request {} of {} for {}",
            record.count, self.max_requests, identity
        );
        Ok(())
    }
}
