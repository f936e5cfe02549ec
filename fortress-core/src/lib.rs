//! Core account-security primitives for the fortress project
//!
//! This crate contains the leaf services that back fortress's authentication
//! hardening: account lockout tracking, fixed-window rate limiting, one-time
//! CSRF tokens, refresh-token rotation, static RBAC tables, and a capped
//! security event log.
//!
//! All state lives behind repository traits so the backing store can be
//! swapped without touching call sites; [`MemoryRepositoryProvider`] is the
//! shipped DashMap-backed implementation. Every read-modify-write the
//! services perform (counter increments, one-time token consumption) is
//! atomic per key.
//!
//! This crate is designed to be consumed through the `fortress` facade and
//! is not intended to be used directly by application code.

pub mod crypto;
pub mod error;
pub mod events;
pub mod memory;
pub mod rbac;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod totp;
pub mod validation;

pub use error::Error;
pub use events::{EventFilter, SecurityEvent, SecurityEventKind, SecurityEventLog, Severity};
pub use memory::MemoryRepositoryProvider;
pub use rbac::{Permission, Role, highest_role};
pub use repositories::RepositoryProvider;
pub use storage::{
    AccessClaims, CsrfConfig, EventLogConfig, IssuedCsrfToken, LockoutConfig, LockoutStatus,
    RateLimitDecision, RateLimitQuota, TokenConfig, TokenPair,
};
