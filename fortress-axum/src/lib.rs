//! # Fortress Axum Integration
//!
//! This crate provides Axum routes and middleware for the fortress
//! security toolkit: a login endpoint guarded by rate limiting and
//! account lockout, refresh-token rotation, CSRF token issuance, an
//! administrative unlock endpoint, and a security event feed.
//!
//! Credential verification stays in the embedding application: you
//! implement [`CredentialVerifier`] against your own user store, and the
//! routes here handle everything around it.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::Router;
//! use fortress::{Fortress, MemoryRepositoryProvider, Role, TokenConfig};
//! use fortress_axum::{ApiError, CookieConfig, CredentialVerifier, VerifiedUser, routes};
//!
//! struct MyVerifier;
//!
//! #[async_trait::async_trait]
//! impl CredentialVerifier for MyVerifier {
//!     async fn verify_credentials(
//!         &self,
//!         email: &str,
//!         password: &str,
//!     ) -> Result<Option<VerifiedUser>, ApiError> {
//!         // Look up the user and verify the password hash here.
//!         Ok(None)
//!     }
//!
//!     async fn role_of(&self, _subject: &str) -> Option<Role> {
//!         Some(Role::User)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let repositories = Arc::new(MemoryRepositoryProvider::new());
//!     let fortress = Arc::new(Fortress::new(
//!         repositories,
//!         TokenConfig::new(b"a-32-byte-minimum-signing-secret".to_vec()),
//!     ));
//!
//!     let auth_routes = routes(fortress, Arc::new(MyVerifier))
//!         .with_cookie_config(CookieConfig::development());
//!
//!     let app = Router::new().nest("/api/auth", auth_routes.build());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::{
    AccessTokenFromRequest, AuthClaims, OptionalAuthClaims, RefreshTokenFromCookie,
};
pub use middleware::{AuthState, CredentialVerifier, auth_middleware, authorize, require_auth};
pub use routes::create_router;
pub use types::{
    AUTH_COOKIE, AuthResponse, CSRF_COOKIE, ConnectionInfo, CookieConfig, CookieSameSite,
    CsrfTokenResponse, EventsQuery, EventsResponse, HealthResponse, LoginRequest, MessageResponse,
    REFRESH_COOKIE, REFRESH_COOKIE_PATH, RefreshRequest, TokenResponse, UnlockRequest,
    UnlockResponse, VerifiedUser,
};

use axum::Router;
use std::sync::Arc;

use fortress::{Fortress, RepositoryProvider};

/// Create authentication routes for your Axum application.
///
/// # Arguments
///
/// * `fortress` - An Arc-wrapped Fortress instance
/// * `verifier` - Your credential verification hook
///
/// # Returns
///
/// A builder producing a Router that can be nested at any path
/// (e.g., "/api/auth")
pub fn routes<R>(
    fortress: Arc<Fortress<R>>,
    verifier: Arc<dyn CredentialVerifier>,
) -> AuthRouterBuilder<R>
where
    R: RepositoryProvider + 'static,
{
    AuthRouterBuilder {
        fortress,
        verifier,
        cookie_config: CookieConfig::default(),
    }
}

/// Builder for configuring authentication routes
pub struct AuthRouterBuilder<R: RepositoryProvider> {
    fortress: Arc<Fortress<R>>,
    verifier: Arc<dyn CredentialVerifier>,
    cookie_config: CookieConfig,
}

impl<R: RepositoryProvider + 'static> AuthRouterBuilder<R> {
    /// Set custom cookie configuration
    pub fn with_cookie_config(mut self, config: CookieConfig) -> Self {
        self.cookie_config = config;
        self
    }

    /// Build the router with the configured options
    pub fn build(self) -> Router {
        create_router(self.fortress, self.verifier, self.cookie_config)
    }
}

impl<R: RepositoryProvider + 'static> From<AuthRouterBuilder<R>> for Router {
    fn from(builder: AuthRouterBuilder<R>) -> Self {
        builder.build()
    }
}
