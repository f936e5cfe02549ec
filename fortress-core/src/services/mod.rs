//! Service layer for the security primitives
//!
//! This module contains concrete service implementations that encapsulate
//! the lockout, rate limiting, CSRF, and token rotation logic over the
//! repository traits.

pub mod csrf;
pub mod lockout;
pub mod rate_limit;
pub mod token;

pub use csrf::CsrfService;
pub use lockout::LockoutService;
pub use rate_limit::RateLimiter;
pub use token::TokenService;
