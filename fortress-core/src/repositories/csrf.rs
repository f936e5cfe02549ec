//! Repository trait for one-time CSRF tokens.

use async_trait::async_trait;

use crate::{Error, storage::CsrfTokenRecord};

/// Storage operations for CSRF entries, keyed by the SHA-256 hash of the
/// issued token. Plaintext tokens never reach the repository.
#[async_trait]
pub trait CsrfTokenRepository: Send + Sync + 'static {
    /// Store a new entry under `token_hash`.
    async fn insert(&self, token_hash: &str, record: CsrfTokenRecord) -> Result<(), Error>;

    /// Fetch the entry for `token_hash`, if any, without consuming it.
    async fn get(&self, token_hash: &str) -> Result<Option<CsrfTokenRecord>, Error>;

    /// Atomically remove the entry for `token_hash`.
    ///
    /// Returns `true` iff the entry was present. This is the one-time-use
    /// linearization point: when two validations race, exactly one sees
    /// `true`.
    async fn delete(&self, token_hash: &str) -> Result<bool, Error>;

    /// Number of entries currently stored, expired or not.
    async fn len(&self) -> Result<usize, Error>;

    /// Remove all expired entries, returning how many were dropped.
    async fn purge_expired(&self) -> Result<u64, Error>;
}
