//! One-time CSRF token service.
//!
//! Issues `(token, secret)` pairs and later validates a token against the
//! client-computed signature `HMAC-SHA256(secret, token)`. Tokens are
//! single-use and expire after the configured TTL.
//!
//! Every failure mode — unknown token, expired token, bad signature,
//! replay — collapses into a plain `false`; callers cannot tell the causes
//! apart, by the same fail-closed contract as credential checks.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error, crypto,
    repositories::CsrfTokenRepository,
    storage::{CsrfConfig, CsrfTokenRecord, IssuedCsrfToken},
};

pub struct CsrfService<R: CsrfTokenRepository> {
    repository: Arc<R>,
    config: CsrfConfig,
}

impl<R: CsrfTokenRepository> CsrfService<R> {
    pub fn new(repository: Arc<R>, config: CsrfConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Issue a fresh token/secret pair, valid for the configured TTL.
    ///
    /// Issuing while the store holds more than `cleanup_threshold` entries
    /// triggers an opportunistic purge of expired ones, keeping the store
    /// bounded without a background task.
    pub async fn issue(&self) -> Result<IssuedCsrfToken, Error> {
        if self.repository.len().await? > self.config.cleanup_threshold {
            let purged = self.repository.purge_expired().await?;
            if purged > 0 {
                tracing::debug!(purged, "Purged expired CSRF tokens");
            }
        }

        let token = crypto::generate_secure_token();
        let secret = crypto::generate_secure_token();
        let now = Utc::now();
        let expires_at = now + self.config.ttl;

        self.repository
            .insert(
                &crypto::hash_token(&token),
                CsrfTokenRecord {
                    secret: secret.clone(),
                    created_at: now,
                    expires_at,
                },
            )
            .await?;

        Ok(IssuedCsrfToken {
            token,
            secret,
            expires_at,
        })
    }

    /// Validate `signature` for `token`. Returns `true` at most once per
    /// issued token.
    ///
    /// The deletion of the stored entry is the one-time-use linearization
    /// point: when two validations race, only the one whose delete
    /// succeeds returns `true`. A signature failure does not consume the
    /// token.
    pub async fn validate(&self, token: &str, signature: &str) -> Result<bool, Error> {
        let token_hash = crypto::hash_token(token);

        let Some(record) = self.repository.get(&token_hash).await? else {
            return Ok(false);
        };

        if record.is_expired() {
            // Lazy expiry: drop the entry, then fail closed.
            self.repository.delete(&token_hash).await?;
            return Ok(false);
        }

        if !crypto::verify_hmac_sha256_hex(&record.secret, token, signature) {
            return Ok(false);
        }

        // Consume. delete() reports whether the entry was still present,
        // which is what makes a concurrent double-validate admit only one.
        Ok(self.repository.delete(&token_hash).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCsrfTokenRepository;
    use chrono::Duration;

    fn service(config: CsrfConfig) -> CsrfService<MemoryCsrfTokenRepository> {
        CsrfService::new(Arc::new(MemoryCsrfTokenRepository::default()), config)
    }

    #[tokio::test]
    async fn test_validate_exactly_once() {
        let service = service(CsrfConfig::default());
        let issued = service.issue().await.unwrap();

        let signature = crypto::hmac_sha256_hex(&issued.secret, &issued.token);
        assert!(service.validate(&issued.token, &signature).await.unwrap());

        // Replay with the same token+signature fails.
        assert!(!service.validate(&issued.token, &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_bad_signature_does_not_consume() {
        let service = service(CsrfConfig::default());
        let issued = service.issue().await.unwrap();

        assert!(!service.validate(&issued.token, "not-a-signature").await.unwrap());

        // The token is still live for the legitimate holder.
        let signature = crypto::hmac_sha256_hex(&issued.secret, &issued.token);
        assert!(service.validate(&issued.token, &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_token_fails_closed() {
        let service = service(CsrfConfig::default());
        assert!(!service.validate("never-issued", "sig").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_rejected_even_with_valid_signature() {
        let config = CsrfConfig {
            ttl: Duration::zero(),
            ..CsrfConfig::default()
        };
        let service = service(config);
        let issued = service.issue().await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let signature = crypto::hmac_sha256_hex(&issued.secret, &issued.token);
        assert!(!service.validate(&issued.token, &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_over_threshold() {
        let config = CsrfConfig {
            ttl: Duration::zero(),
            cleanup_threshold: 5,
        };
        let service = service(config);

        // All of these expire immediately.
        for _ in 0..6 {
            service.issue().await.unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        // The store is over threshold, so this issue purges the dead ones.
        service.issue().await.unwrap();
        assert_eq!(service.repository.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_issued_expiry_matches_ttl() {
        let service = service(CsrfConfig::default());
        let issued = service.issue().await.unwrap();
        let ttl = issued.expires_at - Utc::now();
        assert!(ttl > Duration::minutes(59) && ttl <= Duration::hours(1));
    }
}
