//! Fixed-window rate limiter.
//!
//! Counts requests per key (IP address, email, or any composite) within a
//! fixed window: the counter resets entirely once the window boundary
//! passes, as opposed to a sliding window. The check and the increment are
//! one atomic repository operation, so the limit holds under parallel
//! callers.

use std::sync::Arc;

use crate::{
    Error,
    repositories::RateLimitRepository,
    storage::{RateLimitDecision, RateLimitQuota},
};

/// Service for per-key request counting.
pub struct RateLimiter<R: RateLimitRepository> {
    repository: Arc<R>,
}

impl<R: RateLimitRepository> RateLimiter<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Count a request against `key` and decide whether it is within
    /// `quota`.
    ///
    /// Denied requests are still counted; a client hammering a closed
    /// window does not extend it, because the window boundary is fixed at
    /// the first request of the period.
    pub async fn check(
        &self,
        key: &str,
        quota: RateLimitQuota,
    ) -> Result<RateLimitDecision, Error> {
        let window = self.repository.increment(key, quota.window).await?;
        let allowed = window.count <= quota.max_requests;

        if !allowed {
            tracing::warn!(
                key = %key,
                count = window.count,
                max_requests = quota.max_requests,
                "Rate limit exceeded"
            );
        }

        Ok(RateLimitDecision {
            allowed,
            remaining: quota.max_requests.saturating_sub(window.count),
            reset_at: window.reset_at,
        })
    }

    /// Forget the window for `key`.
    pub async fn reset(&self, key: &str) -> Result<(), Error> {
        self.repository.reset(key).await
    }

    /// Drop windows whose boundary has passed. Returns how many were
    /// removed.
    pub async fn purge_stale(&self) -> Result<u64, Error> {
        self.repository.purge_stale().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRateLimitRepository;
    use chrono::Duration;

    fn limiter() -> RateLimiter<MemoryRateLimitRepository> {
        RateLimiter::new(Arc::new(MemoryRateLimitRepository::default()))
    }

    #[tokio::test]
    async fn test_eleventh_request_denied() {
        let limiter = limiter();
        let quota = RateLimitQuota::new(10, Duration::seconds(60));

        for i in 1..=10u32 {
            let decision = limiter.check("ip:1.2.3.4", quota).await.unwrap();
            assert!(decision.allowed, "request {i} should be allowed");
            assert_eq!(decision.remaining, 10 - i);
        }

        let decision = limiter.check("ip:1.2.3.4", quota).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert!(decision.retry_after_seconds() <= 60);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = limiter();
        let quota = RateLimitQuota::new(1, Duration::seconds(60));

        assert!(limiter.check("a", quota).await.unwrap().allowed);
        assert!(!limiter.check("a", quota).await.unwrap().allowed);
        assert!(limiter.check("b", quota).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_window_rollover_admits_again() {
        let limiter = limiter();
        // Zero-length window: every request starts a new one.
        let quota = RateLimitQuota::new(1, Duration::zero());

        assert!(limiter.check("a", quota).await.unwrap().allowed);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(limiter.check("a", quota).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_reset_clears_counter() {
        let limiter = limiter();
        let quota = RateLimitQuota::new(1, Duration::seconds(60));

        assert!(limiter.check("a", quota).await.unwrap().allowed);
        assert!(!limiter.check("a", quota).await.unwrap().allowed);

        limiter.reset("a").await.unwrap();
        assert!(limiter.check("a", quota).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_login_default_quota() {
        let quota = RateLimitQuota::login_default();
        assert_eq!(quota.max_requests, 10);
        assert_eq!(quota.window, Duration::seconds(60));
    }
}
