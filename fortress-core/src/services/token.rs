//! Access/refresh token pairs with rotation.
//!
//! Access tokens are short-lived HS256 JWTs; refresh tokens are opaque
//! 256-bit values stored hashed. Rotation consumes the presented refresh
//! token atomically and issues a fresh pair. Presenting a refresh token
//! that was already rotated away is treated as reuse and revokes every
//! outstanding token for that subject.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    Error, crypto,
    error::{AuthError, CryptoError},
    repositories::RefreshTokenRepository,
    storage::{AccessClaims, ConsumeOutcome, RefreshTokenRecord, TokenConfig, TokenPair},
};

/// Outcome of a rotation attempt, distinguishing reuse for callers that
/// want to audit it. Both failure variants must surface to clients as a
/// plain "unauthorized".
#[derive(Debug)]
pub enum RotationOutcome {
    Rotated(TokenPair),
    /// The token was valid once but has already been rotated away. All
    /// tokens for the subject have been revoked.
    ReuseDetected {
        subject: String,
        revoked: u64,
    },
    Invalid,
}

pub struct TokenService<R: RefreshTokenRepository> {
    repository: Arc<R>,
    config: TokenConfig,
}

impl<R: RefreshTokenRepository> TokenService<R> {
    pub fn new(repository: Arc<R>, config: TokenConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue a fresh access/refresh pair for `subject`.
    pub async fn issue_pair(&self, subject: &str) -> Result<TokenPair, Error> {
        let access_token = self.sign_access_token(subject)?;

        let refresh_token = crypto::generate_secure_token();
        let now = Utc::now();
        self.repository
            .insert(
                &crypto::hash_token(&refresh_token),
                RefreshTokenRecord {
                    subject: subject.to_string(),
                    issued_at: now,
                    expires_at: now + self.config.refresh_ttl,
                    consumed_at: None,
                    revoked: false,
                },
            )
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.config.access_ttl.num_seconds(),
        })
    }

    /// Rotate `refresh_token` into a new pair.
    ///
    /// Returns [`AuthError::InvalidRefreshToken`] on every failure path;
    /// the caller must treat it as unauthorized, never retry. Use
    /// [`TokenService::try_rotate`] to additionally observe reuse.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, Error> {
        match self.try_rotate(refresh_token).await? {
            RotationOutcome::Rotated(pair) => Ok(pair),
            _ => Err(AuthError::InvalidRefreshToken.into()),
        }
    }

    /// Like [`TokenService::rotate`], but reports reuse detection instead
    /// of collapsing it, so the facade can log a security event.
    pub async fn try_rotate(&self, refresh_token: &str) -> Result<RotationOutcome, Error> {
        let token_hash = crypto::hash_token(refresh_token);

        match self.repository.consume(&token_hash).await? {
            ConsumeOutcome::Consumed(record) => {
                let pair = self.issue_pair(&record.subject).await?;
                tracing::debug!(subject = %record.subject, "Rotated refresh token");
                Ok(RotationOutcome::Rotated(pair))
            }
            ConsumeOutcome::Reused(record) => {
                // Replay of a rotated-away token: someone other than the
                // legitimate holder has it. Kill the whole family.
                let revoked = self.repository.revoke_for_subject(&record.subject).await?;
                tracing::warn!(
                    subject = %record.subject,
                    revoked,
                    "Refresh token reuse detected; revoked all tokens for subject"
                );
                Ok(RotationOutcome::ReuseDetected {
                    subject: record.subject,
                    revoked,
                })
            }
            ConsumeOutcome::NotFound => Ok(RotationOutcome::Invalid),
        }
    }

    /// Verify an access token and return its claims.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }

        let data = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(&self.config.secret_key),
            &validation,
        )
        .map_err(|e| AuthError::InvalidAccessToken(e.to_string()))?;

        Ok(data.claims)
    }

    /// Revoke every outstanding refresh token for `subject`
    /// (logout-everywhere). Returns how many were revoked.
    pub async fn revoke_all(&self, subject: &str) -> Result<u64, Error> {
        self.repository.revoke_for_subject(subject).await
    }

    /// Drop expired refresh-token records.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        self.repository.purge_expired().await
    }

    fn sign_access_token(&self, subject: &str) -> Result<String, Error> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.config.access_ttl).timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.config.secret_key),
        )
        .map_err(|e| CryptoError::JwtSigning(e.to_string()).into())
    }
}
