//! In-memory repository provider backed by DashMap.
//!
//! This is the shipped storage backend: per-key sharded locking gives the
//! atomic read-modify-write semantics the repository traits require,
//! without a database. State does not survive a process restart, which is
//! acceptable for cache-like security counters; multi-instance deployments
//! need a shared backend implementing the same traits.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::{
    Error,
    repositories::{
        CsrfTokenRepository, CsrfTokenRepositoryProvider, LockoutRepository,
        LockoutRepositoryProvider, RateLimitRepository, RateLimitRepositoryProvider,
        RefreshTokenRepository, RefreshTokenRepositoryProvider, RepositoryProvider,
    },
    storage::{ConsumeOutcome, CsrfTokenRecord, LockoutRecord, RateLimitWindow, RefreshTokenRecord},
};

/// DashMap-backed implementation of all fortress repositories.
#[derive(Default)]
pub struct MemoryRepositoryProvider {
    lockouts: MemoryLockoutRepository,
    rate_limits: MemoryRateLimitRepository,
    csrf_tokens: MemoryCsrfTokenRepository,
    refresh_tokens: MemoryRefreshTokenRepository,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockoutRepositoryProvider for MemoryRepositoryProvider {
    type LockoutRepo = MemoryLockoutRepository;

    fn lockout(&self) -> &Self::LockoutRepo {
        &self.lockouts
    }
}

impl RateLimitRepositoryProvider for MemoryRepositoryProvider {
    type RateLimitRepo = MemoryRateLimitRepository;

    fn rate_limit(&self) -> &Self::RateLimitRepo {
        &self.rate_limits
    }
}

impl CsrfTokenRepositoryProvider for MemoryRepositoryProvider {
    type CsrfRepo = MemoryCsrfTokenRepository;

    fn csrf(&self) -> &Self::CsrfRepo {
        &self.csrf_tokens
    }
}

impl RefreshTokenRepositoryProvider for MemoryRepositoryProvider {
    type RefreshTokenRepo = MemoryRefreshTokenRepository;

    fn refresh_token(&self) -> &Self::RefreshTokenRepo {
        &self.refresh_tokens
    }
}

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}

// ============================================================================
// Lockout
// ============================================================================

#[derive(Default)]
pub struct MemoryLockoutRepository {
    records: DashMap<String, LockoutRecord>,
}

#[async_trait]
impl LockoutRepository for MemoryLockoutRepository {
    async fn record_attempt(
        &self,
        email: &str,
        ip_address: Option<&str>,
        reset_if_before: DateTime<Utc>,
    ) -> Result<LockoutRecord, Error> {
        let now = Utc::now();
        // The entry guard holds the shard lock for the whole
        // increment-or-reset, so concurrent failures never lose a count.
        let mut entry = self
            .records
            .entry(email.to_string())
            .or_insert_with(|| LockoutRecord {
                email: email.to_string(),
                failed_attempts: 0,
                last_failed_at: now,
                last_ip_address: None,
                locked_until: None,
            });

        if entry.failed_attempts > 0 && entry.last_failed_at < reset_if_before {
            entry.failed_attempts = 1;
        } else {
            entry.failed_attempts += 1;
        }
        entry.last_failed_at = now;
        entry.last_ip_address = ip_address.map(|s| s.to_string());

        Ok(entry.clone())
    }

    async fn get(&self, email: &str) -> Result<Option<LockoutRecord>, Error> {
        Ok(self.records.get(email).map(|r| r.clone()))
    }

    async fn set_locked_until(
        &self,
        email: &str,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        if let Some(mut record) = self.records.get_mut(email) {
            record.locked_until = locked_until;
        }
        Ok(())
    }

    async fn reset_attempts(&self, email: &str) -> Result<(), Error> {
        if let Some(mut record) = self.records.get_mut(email) {
            record.failed_attempts = 0;
        }
        Ok(())
    }

    async fn delete(&self, email: &str) -> Result<(), Error> {
        self.records.remove(email);
        Ok(())
    }
}

// ============================================================================
// Rate limiting
// ============================================================================

#[derive(Default)]
pub struct MemoryRateLimitRepository {
    windows: DashMap<String, RateLimitWindow>,
}

#[async_trait]
impl RateLimitRepository for MemoryRateLimitRepository {
    async fn increment(&self, key: &str, window: Duration) -> Result<RateLimitWindow, Error> {
        let now = Utc::now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| RateLimitWindow {
                count: 0,
                reset_at: now + window,
            });

        if now > entry.reset_at {
            // Fixed window: full reset at the boundary, not sliding.
            entry.count = 1;
            entry.reset_at = now + window;
        } else {
            entry.count += 1;
        }

        Ok(entry.clone())
    }

    async fn reset(&self, key: &str) -> Result<(), Error> {
        self.windows.remove(key);
        Ok(())
    }

    async fn purge_stale(&self) -> Result<u64, Error> {
        let now = Utc::now();
        let before = self.windows.len();
        self.windows.retain(|_, w| w.reset_at >= now);
        Ok((before - self.windows.len()) as u64)
    }
}

// ============================================================================
// CSRF tokens
// ============================================================================

#[derive(Default)]
pub struct MemoryCsrfTokenRepository {
    tokens: DashMap<String, CsrfTokenRecord>,
}

#[async_trait]
impl CsrfTokenRepository for MemoryCsrfTokenRepository {
    async fn insert(&self, token_hash: &str, record: CsrfTokenRecord) -> Result<(), Error> {
        self.tokens.insert(token_hash.to_string(), record);
        Ok(())
    }

    async fn get(&self, token_hash: &str) -> Result<Option<CsrfTokenRecord>, Error> {
        Ok(self.tokens.get(token_hash).map(|r| r.clone()))
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, Error> {
        Ok(self.tokens.remove(token_hash).is_some())
    }

    async fn len(&self) -> Result<usize, Error> {
        Ok(self.tokens.len())
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let before = self.tokens.len();
        self.tokens.retain(|_, record| !record.is_expired());
        Ok((before - self.tokens.len()) as u64)
    }
}

// ============================================================================
// Refresh tokens
// ============================================================================

#[derive(Default)]
pub struct MemoryRefreshTokenRepository {
    tokens: DashMap<String, RefreshTokenRecord>,
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn insert(&self, token_hash: &str, record: RefreshTokenRecord) -> Result<(), Error> {
        self.tokens.insert(token_hash.to_string(), record);
        Ok(())
    }

    async fn consume(&self, token_hash: &str) -> Result<ConsumeOutcome, Error> {
        let Some(mut entry) = self.tokens.get_mut(token_hash) else {
            return Ok(ConsumeOutcome::NotFound);
        };

        if entry.is_expired() {
            return Ok(ConsumeOutcome::NotFound);
        }
        if entry.revoked || entry.consumed_at.is_some() {
            return Ok(ConsumeOutcome::Reused(entry.clone()));
        }

        // Still holding the entry guard: exactly one racing caller gets here.
        entry.consumed_at = Some(Utc::now());
        Ok(ConsumeOutcome::Consumed(entry.clone()))
    }

    async fn revoke_for_subject(&self, subject: &str) -> Result<u64, Error> {
        let mut revoked = 0u64;
        for mut entry in self.tokens.iter_mut() {
            if entry.subject == subject && !entry.revoked {
                entry.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let before = self.tokens.len();
        self.tokens.retain(|_, record| !record.is_expired());
        Ok((before - self.tokens.len()) as u64)
    }
}
