//! Account lockout service.
//!
//! Tracks failed login attempts per email and escalates to a timed lock
//! once the configured threshold is crossed. Two independent windows
//! govern the behavior: a failure arriving more than `attempt_window`
//! after the previous one restarts the counter at 1 (sliding-window
//! forgiveness), and crossing `max_failed_attempts` locks the account for
//! `lockout_period` from that attempt.
//!
//! # Example
//!
//! ```rust,ignore
//! use fortress_core::services::LockoutService;
//! use fortress_core::storage::LockoutConfig;
//!
//! let service = LockoutService::new(repository, LockoutConfig::default());
//!
//! if service.is_locked("user@example.com").await? {
//!     // 429 with Retry-After
//! }
//! let status = service.record_failed_attempt("user@example.com", Some("192.168.1.1")).await?;
//! ```

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error,
    repositories::LockoutRepository,
    storage::{LockoutConfig, LockoutRecord, LockoutStatus},
};

/// Service for per-account brute force lockout.
///
/// # Thread Safety
///
/// The service is thread-safe; the repository performs the counter
/// read-modify-write atomically per email.
pub struct LockoutService<R: LockoutRepository> {
    repository: Arc<R>,
    config: LockoutConfig,
}

impl<R: LockoutRepository> LockoutService<R> {
    pub fn new(repository: Arc<R>, config: LockoutConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Check whether `email` is currently locked.
    ///
    /// An expired lock is cleared from the record as a side effect, so a
    /// record never reports a lock that has already lapsed.
    pub async fn is_locked(&self, email: &str) -> Result<bool, Error> {
        if !self.config.enabled {
            return Ok(false);
        }

        let email = normalize_email(email);
        let Some(record) = self.repository.get(&email).await? else {
            return Ok(false);
        };

        match record.locked_until {
            Some(until) if Utc::now() <= until => Ok(true),
            Some(_) => {
                // Lock has expired; purge it and start the counter fresh.
                self.repository.set_locked_until(&email, None).await?;
                self.repository.reset_attempts(&email).await?;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Current status for `email` without mutating anything (expired locks
    /// are still reported as unlocked).
    pub async fn status(&self, email: &str) -> Result<LockoutStatus, Error> {
        let email = normalize_email(email);
        if !self.config.enabled {
            return Ok(self.unlocked_status(&email, 0));
        }

        match self.repository.get(&email).await? {
            Some(record) => Ok(self.status_from_record(&record)),
            None => Ok(self.unlocked_status(&email, 0)),
        }
    }

    /// Record a failed login attempt and return the updated status.
    ///
    /// If protection is disabled this is a no-op reporting an unlocked
    /// status. Crossing the attempt threshold sets the lock expiry to
    /// `now + lockout_period`.
    pub async fn record_failed_attempt(
        &self,
        email: &str,
        ip_address: Option<&str>,
    ) -> Result<LockoutStatus, Error> {
        if !self.config.enabled {
            return Ok(self.unlocked_status(&normalize_email(email), 0));
        }

        let email = normalize_email(email);
        let reset_cutoff = Utc::now() - self.config.attempt_window;
        let mut record = self
            .repository
            .record_attempt(&email, ip_address, reset_cutoff)
            .await?;

        // An expired lock must not shield the account from locking again.
        let lock_active = record
            .locked_until
            .is_some_and(|until| until > Utc::now());

        if record.failed_attempts >= self.config.max_failed_attempts && !lock_active {
            let locked_until = Utc::now() + self.config.lockout_period;
            self.repository
                .set_locked_until(&email, Some(locked_until))
                .await?;
            record.locked_until = Some(locked_until);

            tracing::warn!(
                email = %email,
                failed_attempts = record.failed_attempts,
                locked_until = %locked_until,
                "Account locked after repeated failed login attempts"
            );
        }

        Ok(self.status_from_record(&record))
    }

    /// Clear the attempt history entirely (successful authentication).
    pub async fn clear_attempts(&self, email: &str) -> Result<(), Error> {
        self.repository.delete(&normalize_email(email)).await
    }

    /// Administrative unlock: clears the lock and zeroes the counter while
    /// keeping the record. Returns whether the account had been locked.
    pub async fn unlock(&self, email: &str) -> Result<bool, Error> {
        let email = normalize_email(email);
        let was_locked = self.is_locked(&email).await?;
        self.repository.set_locked_until(&email, None).await?;
        self.repository.reset_attempts(&email).await?;
        Ok(was_locked)
    }

    fn status_from_record(&self, record: &LockoutRecord) -> LockoutStatus {
        let is_locked = record
            .locked_until
            .is_some_and(|until| until > Utc::now());

        LockoutStatus {
            email: record.email.clone(),
            failed_attempts: record.failed_attempts,
            is_locked,
            locked_until: if is_locked { record.locked_until } else { None },
            remaining_attempts: if is_locked {
                0
            } else {
                self.config
                    .max_failed_attempts
                    .saturating_sub(record.failed_attempts)
            },
        }
    }

    fn unlocked_status(&self, email: &str, failed_attempts: u32) -> LockoutStatus {
        LockoutStatus {
            email: email.to_string(),
            failed_attempts,
            is_locked: false,
            locked_until: None,
            remaining_attempts: self
                .config
                .max_failed_attempts
                .saturating_sub(failed_attempts),
        }
    }
}

/// Lockout keys are case-insensitive emails.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
