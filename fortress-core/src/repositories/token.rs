//! Repository trait for refresh-token rotation state.

use async_trait::async_trait;

use crate::{
    Error,
    storage::{ConsumeOutcome, RefreshTokenRecord},
};

/// Storage operations for refresh tokens, keyed by the SHA-256 hash of the
/// opaque token value.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Store a freshly issued token record under `token_hash`.
    async fn insert(&self, token_hash: &str, record: RefreshTokenRecord) -> Result<(), Error>;

    /// Atomically consume the token for `token_hash`.
    ///
    /// A live record is marked consumed and returned as
    /// [`ConsumeOutcome::Consumed`]; a record that was already consumed or
    /// revoked comes back as [`ConsumeOutcome::Reused`] so the service can
    /// treat the replay as an attack signal. Expired or unknown hashes
    /// yield [`ConsumeOutcome::NotFound`]. The state transition happens
    /// under the per-key lock, so racing rotations resolve to exactly one
    /// `Consumed`.
    async fn consume(&self, token_hash: &str) -> Result<ConsumeOutcome, Error>;

    /// Revoke every outstanding token for `subject` (reuse response,
    /// logout-everywhere). Returns the number of records revoked.
    async fn revoke_for_subject(&self, subject: &str) -> Result<u64, Error>;

    /// Drop expired records. Returns the number removed.
    async fn purge_expired(&self) -> Result<u64, Error>;
}
