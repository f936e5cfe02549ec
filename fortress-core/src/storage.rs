//! Record and configuration types shared between services and repositories.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Account lockout
// ============================================================================

/// Per-email failed-login state.
///
/// Created on the first failed attempt, mutated on each subsequent failure,
/// deleted on successful authentication. `locked_until` is only ever set
/// once `failed_attempts` has reached the configured maximum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutRecord {
    /// Lowercased email the attempts were made against.
    pub email: String,
    pub failed_attempts: u32,
    pub last_failed_at: DateTime<Utc>,
    /// IP address of the most recent failed attempt, if known.
    pub last_ip_address: Option<String>,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Result of a lockout check or a recorded failure, as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub email: String,
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
    /// Attempts left before the account locks. Zero while locked.
    pub remaining_attempts: u32,
}

impl LockoutStatus {
    /// Seconds until the lockout expires, if currently locked.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        self.locked_until
            .filter(|_| self.is_locked)
            .map(|until| (until - Utc::now()).num_seconds().max(0))
    }
}

/// Configuration for the account lockout tracker.
///
/// The attempt window and the lockout period are independent: an attacker
/// probing slower than once per `attempt_window` never accumulates enough
/// failures to lock the account.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    pub enabled: bool,
    /// Failures at which the account locks.
    pub max_failed_attempts: u32,
    /// A failure more than this long after the previous one resets the
    /// counter to 1 instead of incrementing it.
    pub attempt_window: Duration,
    /// How long the account stays locked once the threshold is crossed.
    pub lockout_period: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failed_attempts: 5,
            attempt_window: Duration::minutes(15),
            lockout_period: Duration::minutes(30),
        }
    }
}

impl LockoutConfig {
    /// A configuration that turns the tracker into a no-op.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

// ============================================================================
// Rate limiting
// ============================================================================

/// A fixed-window counter for one key.
///
/// The count restarts at 1 whenever a request arrives after `reset_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

/// Request budget for a key: at most `max_requests` per `window`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitQuota {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitQuota {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Per-IP login quota: 10 requests per minute.
    pub fn login_default() -> Self {
        Self::new(10, Duration::seconds(60))
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window. Zero when denied.
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Seconds until the window rolls over. Only meaningful when denied.
    pub fn retry_after_seconds(&self) -> i64 {
        (self.reset_at - Utc::now()).num_seconds().max(0)
    }
}

// ============================================================================
// CSRF tokens
// ============================================================================

/// Stored CSRF entry, keyed in the repository by the SHA-256 hash of the
/// issued token. One-time use: deleted on successful validation.
#[derive(Debug, Clone)]
pub struct CsrfTokenRecord {
    pub secret: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CsrfTokenRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// The pair handed to the client. The client later proves possession by
/// sending the token plus `HMAC-SHA256(secret, token)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedCsrfToken {
    pub token: String,
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CsrfConfig {
    pub ttl: Duration,
    /// Issuing a token while the store holds more than this many entries
    /// triggers an opportunistic purge of expired ones.
    pub cleanup_threshold: usize,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(1),
            cleanup_threshold: 1000,
        }
    }
}

// ============================================================================
// Token rotation
// ============================================================================

/// Stored refresh-token state, keyed by the SHA-256 hash of the token.
///
/// Consumed records are kept (marked, not deleted) until expiry so that
/// replay of a rotated-away token is recognizable as reuse rather than
/// being indistinguishable from a token that never existed.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Outcome of atomically consuming a refresh token.
#[derive(Debug, Clone)]
pub enum ConsumeOutcome {
    /// The token was live and is now marked consumed.
    Consumed(RefreshTokenRecord),
    /// The token had already been consumed or revoked: rotation replay.
    Reused(RefreshTokenRecord),
    /// Unknown or expired token.
    NotFound,
}

/// An access/refresh pair as returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Claims carried by the HS256 access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject the pair was issued for.
    pub sub: String,
    /// Issued at (UTC timestamp, seconds).
    pub iat: i64,
    /// Expiration (UTC timestamp, seconds).
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret key for HS256 signing and verification.
    pub secret_key: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: Option<String>,
}

impl TokenConfig {
    pub fn new(secret_key: Vec<u8>) -> Self {
        Self {
            secret_key,
            access_ttl: Duration::seconds(900),
            refresh_ttl: Duration::days(7),
            issuer: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

// ============================================================================
// Security event log
// ============================================================================

#[derive(Debug, Clone)]
pub struct EventLogConfig {
    /// Oldest events are evicted once the log exceeds this many entries.
    pub max_events: usize,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self { max_events: 10_000 }
    }
}
