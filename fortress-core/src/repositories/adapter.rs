//! Adapters that wrap a [`RepositoryProvider`] and implement the
//! individual repository traits, so services can be constructed from one
//! shared provider handle.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{
    Error,
    repositories::{
        CsrfTokenRepository, CsrfTokenRepositoryProvider, LockoutRepository,
        LockoutRepositoryProvider, RateLimitRepository, RateLimitRepositoryProvider,
        RefreshTokenRepository, RefreshTokenRepositoryProvider, RepositoryProvider,
    },
    storage::{ConsumeOutcome, CsrfTokenRecord, LockoutRecord, RateLimitWindow, RefreshTokenRecord},
};

pub struct LockoutRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> LockoutRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> LockoutRepository for LockoutRepositoryAdapter<R> {
    async fn record_attempt(
        &self,
        email: &str,
        ip_address: Option<&str>,
        reset_if_before: DateTime<Utc>,
    ) -> Result<LockoutRecord, Error> {
        self.provider
            .lockout()
            .record_attempt(email, ip_address, reset_if_before)
            .await
    }

    async fn get(&self, email: &str) -> Result<Option<LockoutRecord>, Error> {
        self.provider.lockout().get(email).await
    }

    async fn set_locked_until(
        &self,
        email: &str,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        self.provider
            .lockout()
            .set_locked_until(email, locked_until)
            .await
    }

    async fn reset_attempts(&self, email: &str) -> Result<(), Error> {
        self.provider.lockout().reset_attempts(email).await
    }

    async fn delete(&self, email: &str) -> Result<(), Error> {
        self.provider.lockout().delete(email).await
    }
}

pub struct RateLimitRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> RateLimitRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> RateLimitRepository for RateLimitRepositoryAdapter<R> {
    async fn increment(&self, key: &str, window: Duration) -> Result<RateLimitWindow, Error> {
        self.provider.rate_limit().increment(key, window).await
    }

    async fn reset(&self, key: &str) -> Result<(), Error> {
        self.provider.rate_limit().reset(key).await
    }

    async fn purge_stale(&self) -> Result<u64, Error> {
        self.provider.rate_limit().purge_stale().await
    }
}

pub struct CsrfTokenRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> CsrfTokenRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> CsrfTokenRepository for CsrfTokenRepositoryAdapter<R> {
    async fn insert(&self, token_hash: &str, record: CsrfTokenRecord) -> Result<(), Error> {
        self.provider.csrf().insert(token_hash, record).await
    }

    async fn get(&self, token_hash: &str) -> Result<Option<CsrfTokenRecord>, Error> {
        self.provider.csrf().get(token_hash).await
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, Error> {
        self.provider.csrf().delete(token_hash).await
    }

    async fn len(&self) -> Result<usize, Error> {
        self.provider.csrf().len().await
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        self.provider.csrf().purge_expired().await
    }
}

pub struct RefreshTokenRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> RefreshTokenRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> RefreshTokenRepository for RefreshTokenRepositoryAdapter<R> {
    async fn insert(&self, token_hash: &str, record: RefreshTokenRecord) -> Result<(), Error> {
        self.provider.refresh_token().insert(token_hash, record).await
    }

    async fn consume(&self, token_hash: &str) -> Result<ConsumeOutcome, Error> {
        self.provider.refresh_token().consume(token_hash).await
    }

    async fn revoke_for_subject(&self, subject: &str) -> Result<u64, Error> {
        self.provider.refresh_token().revoke_for_subject(subject).await
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        self.provider.refresh_token().purge_expired().await
    }
}
