//! Rate limiting through the facade.

use std::sync::Arc;

use chrono::Duration;
use fortress::{
    EventFilter, Fortress, MemoryRepositoryProvider, RateLimitQuota, SecurityEventKind,
    TokenConfig,
};

fn fortress() -> Fortress<MemoryRepositoryProvider> {
    Fortress::new(
        Arc::new(MemoryRepositoryProvider::new()),
        TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec()),
    )
}

#[tokio::test]
async fn test_login_quota_rejects_eleventh_attempt() {
    let fortress = fortress();

    for _ in 0..10 {
        fortress
            .guard_login("user@example.com", Some("203.0.113.7"))
            .await
            .expect("Within quota");
    }

    let err = fortress
        .guard_login("user@example.com", Some("203.0.113.7"))
        .await
        .expect_err("Eleventh attempt should be rate limited");
    let retry_after = err
        .retry_after_seconds()
        .expect("Rate limit rejection should disclose retry timing");
    assert!(retry_after > 0 && retry_after <= 60);
}

#[tokio::test]
async fn test_quota_is_per_ip() {
    let fortress = fortress();

    for _ in 0..10 {
        fortress
            .guard_login("user@example.com", Some("203.0.113.7"))
            .await
            .expect("Within quota");
    }

    // A different client address has its own window.
    fortress
        .guard_login("user@example.com", Some("198.51.100.9"))
        .await
        .expect("Other address should be admitted");
}

#[tokio::test]
async fn test_unknown_ip_skips_rate_limiting() {
    let fortress = fortress();

    for _ in 0..20 {
        fortress
            .guard_login("user@example.com", None)
            .await
            .expect("No address, no quota");
    }
}

#[tokio::test]
async fn test_custom_quota_and_window_rollover() {
    let fortress = fortress().with_login_quota(RateLimitQuota::new(
        2,
        Duration::milliseconds(50),
    ));

    fortress
        .guard_login("user@example.com", Some("203.0.113.7"))
        .await
        .expect("Within quota");
    fortress
        .guard_login("user@example.com", Some("203.0.113.7"))
        .await
        .expect("Within quota");
    assert!(
        fortress
            .guard_login("user@example.com", Some("203.0.113.7"))
            .await
            .is_err()
    );

    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    fortress
        .guard_login("user@example.com", Some("203.0.113.7"))
        .await
        .expect("New window should admit the request");
}

#[tokio::test]
async fn test_generic_rate_limit_decisions() {
    let fortress = fortress();
    let quota = RateLimitQuota::new(3, Duration::seconds(60));

    for remaining in [2, 1, 0] {
        let decision = fortress
            .check_rate_limit("api:203.0.113.7", quota)
            .await
            .expect("Failed to check quota");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, remaining);
    }

    let decision = fortress
        .check_rate_limit("api:203.0.113.7", quota)
        .await
        .expect("Failed to check quota");
    assert!(!decision.allowed);
    assert_eq!(decision.remaining, 0);
    assert!(decision.retry_after_seconds() > 0);
}

#[tokio::test]
async fn test_rejections_are_recorded() {
    let fortress = fortress();
    let quota = RateLimitQuota::new(1, Duration::seconds(60));

    fortress
        .check_rate_limit("api:key", quota)
        .await
        .expect("Failed to check quota");
    fortress
        .check_rate_limit("api:key", quota)
        .await
        .expect("Failed to check quota");

    let events = fortress
        .security_events(EventFilter::default().kind(SecurityEventKind::RateLimitExceeded))
        .await;
    assert_eq!(events.len(), 1);
}
