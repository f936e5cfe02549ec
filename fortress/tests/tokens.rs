//! Token issuance, rotation, and reuse detection through the facade.

use std::sync::Arc;

use fortress::{
    EventFilter, Fortress, MemoryRepositoryProvider, SecurityEventKind, Severity, TokenConfig,
};

fn fortress() -> Fortress<MemoryRepositoryProvider> {
    Fortress::new(
        Arc::new(MemoryRepositoryProvider::new()),
        TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec()).with_issuer("fortress-test"),
    )
}

#[tokio::test]
async fn test_issued_access_token_verifies() {
    let fortress = fortress();

    let pair = fortress
        .issue_tokens("user-123")
        .await
        .expect("Failed to issue tokens");
    assert_eq!(pair.expires_in, 900);

    let claims = fortress
        .verify_access_token(&pair.access_token)
        .expect("Failed to verify access token");
    assert_eq!(claims.sub, "user-123");
    assert_eq!(claims.iss.as_deref(), Some("fortress-test"));
}

#[tokio::test]
async fn test_garbage_access_token_rejected() {
    let fortress = fortress();
    assert!(fortress.verify_access_token("not-a-jwt").is_err());
}

#[tokio::test]
async fn test_rotation_invalidates_the_old_refresh_token() {
    let fortress = fortress();
    let pair = fortress
        .issue_tokens("user-123")
        .await
        .expect("Failed to issue tokens");

    let rotated = fortress
        .rotate_tokens(&pair.refresh_token)
        .await
        .expect("Failed to rotate");
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    let claims = fortress
        .verify_access_token(&rotated.access_token)
        .expect("Failed to verify rotated access token");
    assert_eq!(claims.sub, "user-123");
}

#[tokio::test]
async fn test_reuse_revokes_the_whole_family() {
    let fortress = fortress();
    let pair = fortress
        .issue_tokens("user-123")
        .await
        .expect("Failed to issue tokens");

    let rotated = fortress
        .rotate_tokens(&pair.refresh_token)
        .await
        .expect("Failed to rotate");

    // Replaying the already-rotated token is reuse.
    assert!(fortress.rotate_tokens(&pair.refresh_token).await.is_err());

    let events = fortress
        .security_events(EventFilter::default().kind(SecurityEventKind::TokenReuseDetected))
        .await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Critical);

    // The revocation takes the legitimate descendant down with it.
    assert!(fortress.rotate_tokens(&rotated.refresh_token).await.is_err());
}

#[tokio::test]
async fn test_unknown_refresh_token_rejected() {
    let fortress = fortress();
    assert!(fortress.rotate_tokens("never-issued").await.is_err());
}

#[tokio::test]
async fn test_revoke_tokens_logs_out_everywhere() {
    let fortress = fortress();
    let first = fortress
        .issue_tokens("user-123")
        .await
        .expect("Failed to issue tokens");
    let second = fortress
        .issue_tokens("user-123")
        .await
        .expect("Failed to issue tokens");

    let revoked = fortress
        .revoke_tokens("user-123")
        .await
        .expect("Failed to revoke");
    assert_eq!(revoked, 2);

    assert!(fortress.rotate_tokens(&first.refresh_token).await.is_err());
    assert!(fortress.rotate_tokens(&second.refresh_token).await.is_err());
}

#[tokio::test]
async fn test_subjects_are_isolated() {
    let fortress = fortress();
    let alice = fortress
        .issue_tokens("alice")
        .await
        .expect("Failed to issue tokens");
    let bob = fortress
        .issue_tokens("bob")
        .await
        .expect("Failed to issue tokens");

    fortress
        .revoke_tokens("alice")
        .await
        .expect("Failed to revoke");

    assert!(fortress.rotate_tokens(&alice.refresh_token).await.is_err());
    fortress
        .rotate_tokens(&bob.refresh_token)
        .await
        .expect("Bob's token should survive Alice's revocation");
}

#[tokio::test]
async fn test_successful_rotation_is_recorded() {
    let fortress = fortress();
    let pair = fortress
        .issue_tokens("user-123")
        .await
        .expect("Failed to issue tokens");
    fortress
        .rotate_tokens(&pair.refresh_token)
        .await
        .expect("Failed to rotate");

    let events = fortress
        .security_events(EventFilter::default().kind(SecurityEventKind::TokenRotated))
        .await;
    assert_eq!(events.len(), 1);
}
