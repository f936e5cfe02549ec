//! CSRF token issuance and validation through the facade.

use std::sync::Arc;

use fortress::{
    EventFilter, Fortress, MemoryRepositoryProvider, SecurityEventKind, TokenConfig, crypto,
};

fn fortress() -> Fortress<MemoryRepositoryProvider> {
    Fortress::new(
        Arc::new(MemoryRepositoryProvider::new()),
        TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec()),
    )
}

#[tokio::test]
async fn test_issued_token_validates_exactly_once() {
    let fortress = fortress();
    let issued = fortress.issue_csrf_token().await.expect("Failed to issue");

    let signature = crypto::hmac_sha256_hex(&issued.secret, &issued.token);

    assert!(
        fortress
            .validate_csrf_token(&issued.token, &signature)
            .await
            .expect("Failed to validate")
    );
    assert!(
        !fortress
            .validate_csrf_token(&issued.token, &signature)
            .await
            .expect("Failed to validate")
    );
}

#[tokio::test]
async fn test_bad_signature_fails_without_consuming() {
    let fortress = fortress();
    let issued = fortress.issue_csrf_token().await.expect("Failed to issue");

    assert!(
        !fortress
            .validate_csrf_token(&issued.token, "not-a-signature")
            .await
            .expect("Failed to validate")
    );

    // A failed signature check must not burn the token.
    let signature = crypto::hmac_sha256_hex(&issued.secret, &issued.token);
    assert!(
        fortress
            .validate_csrf_token(&issued.token, &signature)
            .await
            .expect("Failed to validate")
    );
}

#[tokio::test]
async fn test_unknown_token_fails_closed() {
    let fortress = fortress();

    assert!(
        !fortress
            .validate_csrf_token("never-issued", "whatever")
            .await
            .expect("Failed to validate")
    );
}

#[tokio::test]
async fn test_tokens_are_independent() {
    let fortress = fortress();
    let first = fortress.issue_csrf_token().await.expect("Failed to issue");
    let second = fortress.issue_csrf_token().await.expect("Failed to issue");

    assert_ne!(first.token, second.token);

    // A signature computed with the wrong token's secret is rejected.
    let crossed = crypto::hmac_sha256_hex(&second.secret, &first.token);
    assert!(
        !fortress
            .validate_csrf_token(&first.token, &crossed)
            .await
            .expect("Failed to validate")
    );
}

#[tokio::test]
async fn test_rejections_are_recorded() {
    let fortress = fortress();

    fortress
        .validate_csrf_token("never-issued", "whatever")
        .await
        .expect("Failed to validate");

    let events = fortress
        .security_events(EventFilter::default().kind(SecurityEventKind::CsrfRejected))
        .await;
    assert_eq!(events.len(), 1);
}
