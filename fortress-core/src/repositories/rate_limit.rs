//! Repository trait for fixed-window rate limit counters.

use async_trait::async_trait;
use chrono::Duration;

use crate::{Error, storage::RateLimitWindow};

/// Storage operations for per-key request counters.
#[async_trait]
pub trait RateLimitRepository: Send + Sync + 'static {
    /// Atomically count a request against `key`.
    ///
    /// If no window exists for the key, or the current window has passed
    /// its reset time, a fresh window of length `window` starts with
    /// count 1. Otherwise the existing count increments. The increment and
    /// the rollover check happen under one per-key critical section, so
    /// parallel callers can never admit more requests than the count
    /// reflects.
    ///
    /// Returns the window state after counting this request. The caller
    /// compares the count against its quota.
    async fn increment(&self, key: &str, window: Duration) -> Result<RateLimitWindow, Error>;

    /// Drop the window for `key`, if any.
    async fn reset(&self, key: &str) -> Result<(), Error>;

    /// Drop all windows whose reset time has passed.
    ///
    /// Returns the number of windows removed.
    async fn purge_stale(&self) -> Result<u64, Error>;
}
