use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fortress::{Role, SecurityEvent, SecurityEventKind, Severity};

/// Name of the cookie carrying the access token.
pub const AUTH_COOKIE: &str = "fortress_auth_token";
/// Name of the cookie carrying the refresh token. Scoped to the API
/// prefix so browsers only send it where rotation happens.
pub const REFRESH_COOKIE: &str = "fortress_refresh_token";
/// Path the refresh cookie is scoped to.
pub const REFRESH_COOKIE_PATH: &str = "/api";
/// Name of the cookie carrying the CSRF token. Readable by scripts so
/// the client can echo it back alongside its signature.
pub const CSRF_COOKIE: &str = "fortress_csrf_token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Fallback for non-browser clients that do not carry the refresh
    /// cookie.
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub email: String,
}

/// A user whose credentials have been verified by the embedding
/// application.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedUser {
    /// Stable identifier used as the JWT subject.
    pub subject: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: VerifiedUser,
    pub access_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CsrfTokenResponse {
    pub token: String,
    /// Per-token signing secret the client uses to compute the request
    /// signature.
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnlockResponse {
    pub email: String,
    pub was_locked: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EventsQuery {
    pub kind: Option<SecurityEventKind>,
    pub severity: Option<Severity>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub events: Vec<SecurityEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Attributes shared by the cookies this crate sets. Names and paths are
/// fixed; lifetime and transport requirements vary by deployment.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub secure: bool,
    pub same_site: CookieSameSite,
    pub auth_max_age_seconds: i64,
    pub refresh_max_age_seconds: i64,
    pub csrf_max_age_seconds: i64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: CookieSameSite::Strict,
            auth_max_age_seconds: 86_400,
            refresh_max_age_seconds: 7 * 86_400,
            csrf_max_age_seconds: 3_600,
        }
    }
}

impl CookieConfig {
    /// Like the default, but without the `Secure` attribute so cookies
    /// work over plain HTTP in local development.
    pub fn development() -> Self {
        Self {
            secure: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum CookieSameSite {
    #[default]
    Strict,
    Lax,
    None,
}
