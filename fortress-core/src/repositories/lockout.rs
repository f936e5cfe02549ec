//! Repository trait for account lockout tracking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, storage::LockoutRecord};

/// Storage operations for per-email failed-login state.
///
/// Emails passed to these methods are already lowercased by the service;
/// implementations treat them as opaque keys.
///
/// # Security Considerations
///
/// - Attempts are recorded for all email addresses, even non-existent
///   ones, to prevent user enumeration.
/// - `record_attempt` must be atomic per key: concurrent failures for the
///   same email must never lose an increment.
#[async_trait]
pub trait LockoutRepository: Send + Sync + 'static {
    /// Atomically record a failed attempt for `email`.
    ///
    /// If no record exists, or the previous failure is older than
    /// `reset_if_before`, the counter restarts at 1; otherwise it
    /// increments. `last_failed_at` is set to now either way.
    ///
    /// Returns the updated record. This method does not set or inspect
    /// `locked_until`; lockout policy lives in the service.
    async fn record_attempt(
        &self,
        email: &str,
        ip_address: Option<&str>,
        reset_if_before: DateTime<Utc>,
    ) -> Result<LockoutRecord, Error>;

    /// Fetch the current record for `email`, if any.
    async fn get(&self, email: &str) -> Result<Option<LockoutRecord>, Error>;

    /// Set or clear the lock expiry on an existing record. A no-op when no
    /// record exists.
    async fn set_locked_until(
        &self,
        email: &str,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), Error>;

    /// Reset the failure counter to zero without deleting the record.
    async fn reset_attempts(&self, email: &str) -> Result<(), Error>;

    /// Delete the record entirely (successful authentication).
    async fn delete(&self, email: &str) -> Result<(), Error>;
}
