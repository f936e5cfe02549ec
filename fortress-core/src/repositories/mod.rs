//! Repository traits for the data access layer
//!
//! Services interact with storage exclusively through these traits, so the
//! DashMap-backed in-memory provider can be replaced by an external cache
//! without changing call sites.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data
//!   domain, including the atomic read-modify-write primitives the services
//!   rely on.
//! - Individual `*RepositoryProvider` traits provide access to each
//!   repository type.
//! - [`RepositoryProvider`] is a supertrait combining all provider traits
//!   plus a health check.

pub mod adapter;
pub mod csrf;
pub mod lockout;
pub mod rate_limit;
pub mod token;

pub use adapter::{
    CsrfTokenRepositoryAdapter, LockoutRepositoryAdapter, RateLimitRepositoryAdapter,
    RefreshTokenRepositoryAdapter,
};
pub use csrf::CsrfTokenRepository;
pub use lockout::LockoutRepository;
pub use rate_limit::RateLimitRepository;
pub use token::RefreshTokenRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for lockout repository access.
pub trait LockoutRepositoryProvider: Send + Sync + 'static {
    type LockoutRepo: LockoutRepository;

    fn lockout(&self) -> &Self::LockoutRepo;
}

/// Provider trait for rate limit repository access.
pub trait RateLimitRepositoryProvider: Send + Sync + 'static {
    type RateLimitRepo: RateLimitRepository;

    fn rate_limit(&self) -> &Self::RateLimitRepo;
}

/// Provider trait for CSRF token repository access.
pub trait CsrfTokenRepositoryProvider: Send + Sync + 'static {
    type CsrfRepo: CsrfTokenRepository;

    fn csrf(&self) -> &Self::CsrfRepo;
}

/// Provider trait for refresh token repository access.
pub trait RefreshTokenRepositoryProvider: Send + Sync + 'static {
    type RefreshTokenRepo: RefreshTokenRepository;

    fn refresh_token(&self) -> &Self::RefreshTokenRepo;
}

/// Provider trait that storage implementations must implement to provide
/// all repositories.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement `RepositoryProvider` with `health_check()`
#[async_trait]
pub trait RepositoryProvider:
    LockoutRepositoryProvider
    + RateLimitRepositoryProvider
    + CsrfTokenRepositoryProvider
    + RefreshTokenRepositoryProvider
{
    /// Health check for all repositories.
    async fn health_check(&self) -> Result<(), Error>;
}
