//! # Fortress
//!
//! Fortress hardens an application's login surface with a set of
//! composable security primitives:
//!
//! - Account lockout after repeated failed logins
//! - Fixed-window rate limiting
//! - One-time, HMAC-signed CSRF tokens
//! - Access/refresh token pairs with rotation and reuse detection
//! - Static role-based access control tables
//! - A capped, queryable security event log
//!
//! All state lives behind repository traits, so the in-memory DashMap
//! provider that ships with the crate can be replaced by an external
//! store without changing application code.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fortress::{Fortress, MemoryRepositoryProvider, TokenConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let repositories = Arc::new(MemoryRepositoryProvider::new());
//!     let token_config = TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec());
//!
//!     let fortress = Fortress::new(repositories, token_config);
//!
//!     match fortress.guard_login("user@example.com", Some("203.0.113.7")).await {
//!         Ok(()) => { /* proceed to credential verification */ }
//!         Err(e) => eprintln!("rejected: {e}"),
//!     }
//! }
//! ```
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use fortress_core::{
    repositories::{
        CsrfTokenRepositoryAdapter, LockoutRepositoryAdapter, RateLimitRepositoryAdapter,
        RefreshTokenRepositoryAdapter,
    },
    services::{CsrfService, LockoutService, RateLimiter, TokenService},
};

/// Re-export core types from fortress_core
///
/// These types are commonly used when working with the Fortress API.
pub use fortress_core::{
    AccessClaims, CsrfConfig, Error, EventFilter, EventLogConfig, IssuedCsrfToken, LockoutConfig,
    LockoutStatus, MemoryRepositoryProvider, Permission, RateLimitDecision, RateLimitQuota,
    RepositoryProvider, Role, SecurityEvent, SecurityEventKind, SecurityEventLog, Severity,
    TokenConfig, TokenPair, highest_role,
};

pub use fortress_core::error::AuthError;
pub use fortress_core::services::token::RotationOutcome;
pub use fortress_core::{crypto, totp, validation};

/// The central coordinator for fortress's security services.
///
/// `Fortress` wires every service to a shared [`RepositoryProvider`] and
/// records notable outcomes (lockouts, rate-limit rejections, CSRF
/// failures, token reuse) in its [`SecurityEventLog`].
///
/// # Example
///
/// ```rust,no_run
/// use fortress::{Fortress, MemoryRepositoryProvider, TokenConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repositories = Arc::new(MemoryRepositoryProvider::new());
///     let fortress = Fortress::new(
///         repositories,
///         TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec()),
///     );
///
///     let pair = fortress.issue_tokens("user-123").await?;
///     let claims = fortress.verify_access_token(&pair.access_token)?;
///     assert_eq!(claims.sub, "user-123");
///
///     Ok(())
/// }
/// ```
pub struct Fortress<R: RepositoryProvider> {
    repositories: Arc<R>,
    lockout_service: Arc<LockoutService<LockoutRepositoryAdapter<R>>>,
    rate_limiter: Arc<RateLimiter<RateLimitRepositoryAdapter<R>>>,
    csrf_service: Arc<CsrfService<CsrfTokenRepositoryAdapter<R>>>,
    token_service: Arc<TokenService<RefreshTokenRepositoryAdapter<R>>>,
    event_log: Arc<SecurityEventLog>,
    login_quota: RateLimitQuota,
}

impl<R: RepositoryProvider> Fortress<R> {
    /// Create a new Fortress instance with a repository provider.
    ///
    /// Lockout, rate limiting, CSRF, and the event log start from their
    /// default configurations; the token signing config is required up
    /// front because there is no safe default for a signing secret.
    pub fn new(repositories: Arc<R>, token_config: TokenConfig) -> Self {
        let lockout_service = Arc::new(LockoutService::new(
            Arc::new(LockoutRepositoryAdapter::new(repositories.clone())),
            LockoutConfig::default(),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(Arc::new(RateLimitRepositoryAdapter::new(
            repositories.clone(),
        ))));
        let csrf_service = Arc::new(CsrfService::new(
            Arc::new(CsrfTokenRepositoryAdapter::new(repositories.clone())),
            CsrfConfig::default(),
        ));
        let token_service = Arc::new(TokenService::new(
            Arc::new(RefreshTokenRepositoryAdapter::new(repositories.clone())),
            token_config,
        ));

        Self {
            repositories,
            lockout_service,
            rate_limiter,
            csrf_service,
            token_service,
            event_log: Arc::new(SecurityEventLog::new(EventLogConfig::default())),
            login_quota: RateLimitQuota::login_default(),
        }
    }

    /// Set the lockout configuration.
    pub fn with_lockout_config(mut self, config: LockoutConfig) -> Self {
        self.lockout_service = Arc::new(LockoutService::new(
            Arc::new(LockoutRepositoryAdapter::new(self.repositories.clone())),
            config,
        ));
        self
    }

    /// Set the CSRF token configuration.
    pub fn with_csrf_config(mut self, config: CsrfConfig) -> Self {
        self.csrf_service = Arc::new(CsrfService::new(
            Arc::new(CsrfTokenRepositoryAdapter::new(self.repositories.clone())),
            config,
        ));
        self
    }

    /// Set the per-IP quota applied to login attempts by
    /// [`Fortress::guard_login`].
    pub fn with_login_quota(mut self, quota: RateLimitQuota) -> Self {
        self.login_quota = quota;
        self
    }

    /// Set the event log configuration.
    pub fn with_event_log_config(mut self, config: EventLogConfig) -> Self {
        self.event_log = Arc::new(SecurityEventLog::new(config));
        self
    }

    /// Health check for all repositories.
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    // --- Login protection ---

    /// Gate a login attempt before credentials are checked.
    ///
    /// Applies the per-IP login quota (when an IP is known) and then the
    /// account lockout check, in that order. Returns
    /// [`AuthError::RateLimited`] or [`AuthError::AccountLocked`] so the
    /// caller can surface a retry-after hint.
    ///
    /// This does not count a failed attempt; call
    /// [`Fortress::record_login_failure`] after credential verification
    /// fails.
    pub async fn guard_login(&self, email: &str, ip_address: Option<&str>) -> Result<(), Error> {
        if let Some(ip) = ip_address {
            let decision = self
                .rate_limiter
                .check(&format!("login:{ip}"), self.login_quota)
                .await?;
            if !decision.allowed {
                self.event_log
                    .log(
                        SecurityEventKind::RateLimitExceeded,
                        Severity::Warning,
                        format!("Login rate limit exceeded for {ip}"),
                        json!({ "ip_address": ip, "reset_at": decision.reset_at }),
                    )
                    .await;
                return Err(AuthError::RateLimited {
                    retry_after_seconds: decision.retry_after_seconds(),
                }
                .into());
            }
        }

        let status = self.lockout_service.status(email).await?;
        if status.is_locked {
            return Err(AuthError::AccountLocked {
                retry_after_seconds: status.retry_after_seconds().unwrap_or(0),
            }
            .into());
        }

        Ok(())
    }

    /// Record a failed credential check and return the updated lockout
    /// status.
    pub async fn record_login_failure(
        &self,
        email: &str,
        ip_address: Option<&str>,
    ) -> Result<LockoutStatus, Error> {
        let status = self
            .lockout_service
            .record_failed_attempt(email, ip_address)
            .await?;

        self.event_log
            .log(
                SecurityEventKind::LoginFailed,
                Severity::Warning,
                format!("Failed login attempt for {}", status.email),
                json!({
                    "email": status.email,
                    "ip_address": ip_address,
                    "failed_attempts": status.failed_attempts,
                }),
            )
            .await;

        if status.is_locked {
            self.event_log
                .log(
                    SecurityEventKind::AccountLocked,
                    Severity::Error,
                    format!("Account {} locked", status.email),
                    json!({
                        "email": status.email,
                        "locked_until": status.locked_until,
                    }),
                )
                .await;
        }

        Ok(status)
    }

    /// Record a successful login, clearing the account's failure history.
    pub async fn record_login_success(&self, email: &str) -> Result<(), Error> {
        self.lockout_service.clear_attempts(email).await?;
        self.event_log
            .log(
                SecurityEventKind::LoginSucceeded,
                Severity::Info,
                format!("Successful login for {}", email.trim().to_lowercase()),
                json!({ "email": email.trim().to_lowercase() }),
            )
            .await;
        Ok(())
    }

    /// Current lockout status for an account.
    pub async fn lockout_status(&self, email: &str) -> Result<LockoutStatus, Error> {
        self.lockout_service.status(email).await
    }

    /// Administratively unlock an account. Returns whether it had been
    /// locked.
    pub async fn unlock_account(&self, email: &str) -> Result<bool, Error> {
        let was_locked = self.lockout_service.unlock(email).await?;
        if was_locked {
            self.event_log
                .log(
                    SecurityEventKind::AccountUnlocked,
                    Severity::Info,
                    format!("Account {} unlocked", email.trim().to_lowercase()),
                    json!({ "email": email.trim().to_lowercase() }),
                )
                .await;
        }
        Ok(was_locked)
    }

    // --- Rate limiting ---

    /// Count a request against `key` under `quota` and return the
    /// decision. Rejections are recorded in the event log.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        quota: RateLimitQuota,
    ) -> Result<RateLimitDecision, Error> {
        let decision = self.rate_limiter.check(key, quota).await?;
        if !decision.allowed {
            self.event_log
                .log(
                    SecurityEventKind::RateLimitExceeded,
                    Severity::Warning,
                    format!("Rate limit exceeded for {key}"),
                    json!({ "key": key, "reset_at": decision.reset_at }),
                )
                .await;
        }
        Ok(decision)
    }

    // --- CSRF ---

    /// Issue a one-time CSRF token and its signing secret.
    pub async fn issue_csrf_token(&self) -> Result<IssuedCsrfToken, Error> {
        self.csrf_service.issue().await
    }

    /// Validate a CSRF token against its client-computed signature,
    /// consuming it on success. Failures are recorded in the event log.
    pub async fn validate_csrf_token(&self, token: &str, signature: &str) -> Result<bool, Error> {
        let valid = self.csrf_service.validate(token, signature).await?;
        if !valid {
            self.event_log
                .log(
                    SecurityEventKind::CsrfRejected,
                    Severity::Warning,
                    "Rejected CSRF token",
                    json!({}),
                )
                .await;
        }
        Ok(valid)
    }

    // --- Tokens ---

    /// Issue an access/refresh token pair for `subject`.
    pub async fn issue_tokens(&self, subject: &str) -> Result<TokenPair, Error> {
        self.token_service.issue_pair(subject).await
    }

    /// Rotate a refresh token into a new pair.
    ///
    /// Reuse of an already-rotated token revokes every outstanding token
    /// for the subject and is recorded as a critical event; the caller
    /// sees [`AuthError::InvalidRefreshToken`] either way.
    pub async fn rotate_tokens(&self, refresh_token: &str) -> Result<TokenPair, Error> {
        match self.token_service.try_rotate(refresh_token).await? {
            RotationOutcome::Rotated(pair) => {
                self.event_log
                    .log(
                        SecurityEventKind::TokenRotated,
                        Severity::Info,
                        "Refresh token rotated",
                        json!({}),
                    )
                    .await;
                Ok(pair)
            }
            RotationOutcome::ReuseDetected { subject, revoked } => {
                self.event_log
                    .log(
                        SecurityEventKind::TokenReuseDetected,
                        Severity::Critical,
                        format!("Refresh token reuse detected for {subject}"),
                        json!({ "subject": subject, "revoked": revoked }),
                    )
                    .await;
                Err(AuthError::InvalidRefreshToken.into())
            }
            RotationOutcome::Invalid => Err(AuthError::InvalidRefreshToken.into()),
        }
    }

    /// Verify an access token and return its claims.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, Error> {
        self.token_service.verify_access_token(token)
    }

    /// Revoke every outstanding refresh token for `subject` (logout
    /// everywhere). Returns how many were revoked.
    pub async fn revoke_tokens(&self, subject: &str) -> Result<u64, Error> {
        self.token_service.revoke_all(subject).await
    }

    // --- Multi-factor authentication ---

    /// Verify a TOTP code for `subject` against its shared secret,
    /// recording the outcome in the event log.
    ///
    /// Returns [`AuthError::InvalidTotpCode`] when the code does not
    /// match within the accepted clock skew.
    pub async fn verify_totp(
        &self,
        subject: &str,
        secret: &[u8],
        code: &str,
    ) -> Result<(), Error> {
        if totp::verify(secret, code, Utc::now()) {
            self.event_log
                .log(
                    SecurityEventKind::MfaVerified,
                    Severity::Info,
                    format!("TOTP code accepted for {subject}"),
                    json!({ "subject": subject }),
                )
                .await;
            Ok(())
        } else {
            self.event_log
                .log(
                    SecurityEventKind::MfaRejected,
                    Severity::Warning,
                    format!("TOTP code rejected for {subject}"),
                    json!({ "subject": subject }),
                )
                .await;
            Err(AuthError::InvalidTotpCode.into())
        }
    }

    // --- Events and maintenance ---

    /// Query the security event log, newest first.
    pub async fn security_events(&self, filter: EventFilter) -> Vec<SecurityEvent> {
        self.event_log.events(filter).await
    }

    /// The shared event log, for recording application-level events such
    /// as MFA outcomes.
    pub fn event_log(&self) -> &Arc<SecurityEventLog> {
        &self.event_log
    }

    /// Drop expired refresh tokens and stale rate-limit windows. Returns
    /// how many entries were removed.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let tokens = self.token_service.purge_expired().await?;
        let windows = self.rate_limiter.purge_stale().await?;
        Ok(tokens + windows)
    }
}
