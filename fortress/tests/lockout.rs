//! Account lockout behavior through the facade.

use std::sync::Arc;

use chrono::Duration;
use fortress::{
    EventFilter, Fortress, LockoutConfig, MemoryRepositoryProvider, SecurityEventKind,
    TokenConfig,
};

fn fortress() -> Fortress<MemoryRepositoryProvider> {
    Fortress::new(
        Arc::new(MemoryRepositoryProvider::new()),
        TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec()),
    )
}

#[tokio::test]
async fn test_account_locks_after_five_failures() {
    let fortress = fortress();

    for _ in 0..4 {
        let status = fortress
            .record_login_failure("user@example.com", Some("203.0.113.7"))
            .await
            .expect("Failed to record attempt");
        assert!(!status.is_locked);
    }

    let status = fortress
        .record_login_failure("user@example.com", Some("203.0.113.7"))
        .await
        .expect("Failed to record attempt");
    assert!(status.is_locked);
    assert_eq!(status.failed_attempts, 5);
    assert_eq!(status.remaining_attempts, 0);
    assert!(status.locked_until.is_some());

    let err = fortress
        .guard_login("user@example.com", None)
        .await
        .expect_err("Locked account should be rejected");
    let retry_after = err
        .retry_after_seconds()
        .expect("Lockout rejection should disclose retry timing");
    assert!(retry_after > 0 && retry_after <= 30 * 60);
}

#[tokio::test]
async fn test_remaining_attempts_counts_down() {
    let fortress = fortress();

    let status = fortress
        .record_login_failure("user@example.com", None)
        .await
        .expect("Failed to record attempt");
    assert_eq!(status.remaining_attempts, 4);

    let status = fortress
        .record_login_failure("user@example.com", None)
        .await
        .expect("Failed to record attempt");
    assert_eq!(status.remaining_attempts, 3);
}

#[tokio::test]
async fn test_success_clears_failure_history() {
    let fortress = fortress();

    for _ in 0..4 {
        fortress
            .record_login_failure("user@example.com", None)
            .await
            .expect("Failed to record attempt");
    }

    fortress
        .record_login_success("user@example.com")
        .await
        .expect("Failed to record success");

    let status = fortress
        .lockout_status("user@example.com")
        .await
        .expect("Failed to read status");
    assert_eq!(status.failed_attempts, 0);
    assert_eq!(status.remaining_attempts, 5);
}

#[tokio::test]
async fn test_unlock_restores_access() {
    let fortress = fortress();

    for _ in 0..5 {
        fortress
            .record_login_failure("user@example.com", None)
            .await
            .expect("Failed to record attempt");
    }
    assert!(fortress.guard_login("user@example.com", None).await.is_err());

    let was_locked = fortress
        .unlock_account("user@example.com")
        .await
        .expect("Failed to unlock");
    assert!(was_locked);

    fortress
        .guard_login("user@example.com", None)
        .await
        .expect("Unlocked account should be admitted");

    // Unlocking an account that was never locked reports false.
    let was_locked = fortress
        .unlock_account("other@example.com")
        .await
        .expect("Failed to unlock");
    assert!(!was_locked);
}

#[tokio::test]
async fn test_email_addresses_are_normalized() {
    let fortress = fortress();

    for _ in 0..5 {
        fortress
            .record_login_failure("  User@Example.COM  ", None)
            .await
            .expect("Failed to record attempt");
    }

    let status = fortress
        .lockout_status("user@example.com")
        .await
        .expect("Failed to read status");
    assert!(status.is_locked);
}

#[tokio::test]
async fn test_disabled_lockout_never_locks() {
    let repositories = Arc::new(MemoryRepositoryProvider::new());
    let fortress = Fortress::new(
        repositories,
        TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec()),
    )
    .with_lockout_config(LockoutConfig::disabled());

    for _ in 0..20 {
        let status = fortress
            .record_login_failure("user@example.com", None)
            .await
            .expect("Failed to record attempt");
        assert!(!status.is_locked);
    }

    fortress
        .guard_login("user@example.com", None)
        .await
        .expect("Disabled lockout should admit everything");
}

#[tokio::test]
async fn test_short_lockout_expires() {
    let repositories = Arc::new(MemoryRepositoryProvider::new());
    let fortress = Fortress::new(
        repositories,
        TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec()),
    )
    .with_lockout_config(LockoutConfig {
        lockout_period: Duration::milliseconds(50),
        ..LockoutConfig::default()
    });

    for _ in 0..5 {
        fortress
            .record_login_failure("user@example.com", None)
            .await
            .expect("Failed to record attempt");
    }
    assert!(fortress.guard_login("user@example.com", None).await.is_err());

    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    fortress
        .guard_login("user@example.com", None)
        .await
        .expect("Expired lockout should admit the account");
}

#[tokio::test]
async fn test_failures_after_expired_lockout_lock_again() {
    let fortress = Fortress::new(
        Arc::new(MemoryRepositoryProvider::new()),
        TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec()),
    )
    .with_lockout_config(LockoutConfig {
        lockout_period: Duration::milliseconds(50),
        ..LockoutConfig::default()
    });

    for _ in 0..5 {
        fortress
            .record_login_failure("user@example.com", None)
            .await
            .expect("Failed to record attempt");
    }

    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    // The first failure after the lapse crosses the threshold again and
    // must re-engage the lock; guard_login must reject from then on.
    let status = fortress
        .record_login_failure("user@example.com", None)
        .await
        .expect("Failed to record attempt");
    assert!(status.is_locked, "account never re-locked after prior lockout expired");

    let err = fortress
        .guard_login("user@example.com", None)
        .await
        .expect_err("Re-locked account should be rejected");
    assert!(err.retry_after_seconds().is_some());
}

#[tokio::test]
async fn test_lockout_events_are_recorded() {
    let fortress = fortress();

    for _ in 0..5 {
        fortress
            .record_login_failure("user@example.com", None)
            .await
            .expect("Failed to record attempt");
    }
    fortress
        .unlock_account("user@example.com")
        .await
        .expect("Failed to unlock");

    let locked = fortress
        .security_events(EventFilter::default().kind(SecurityEventKind::AccountLocked))
        .await;
    assert_eq!(locked.len(), 1);

    let unlocked = fortress
        .security_events(EventFilter::default().kind(SecurityEventKind::AccountUnlocked))
        .await;
    assert_eq!(unlocked.len(), 1);

    let failures = fortress
        .security_events(EventFilter::default().kind(SecurityEventKind::LoginFailed))
        .await;
    assert_eq!(failures.len(), 5);
}
