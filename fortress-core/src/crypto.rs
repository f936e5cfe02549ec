//! Cryptographic utilities for secure token handling
//!
//! This module provides token generation, hashing, HMAC signing, and
//! constant-time verification for the token-shaped values fortress hands
//! out (CSRF tokens, refresh tokens).
//!
//! # Security
//!
//! Token verification is vulnerable to timing attacks when using standard
//! string comparison because the comparison may exit early on the first
//! mismatch. This module addresses this by:
//!
//! 1. Storing SHA256 hashes of tokens instead of plaintext tokens
//! 2. Using constant-time comparison via the `subtle` crate
//! 3. Providing hash-based lookups to avoid iterating over all tokens
//!
//! SHA256 (rather than a password hash) is sufficient here because every
//! token carries 256 bits of CSPRNG entropy, making brute force infeasible.

use hmac::{Hmac, Mac};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Generate a cryptographically secure random token.
///
/// This produces a 256-bit (32-byte) random token encoded as URL-safe
/// base64 (43 characters).
///
/// # Panics
///
/// Panics if the OS random number generator fails. This indicates a
/// critical system failure (e.g., /dev/urandom unavailable) from which
/// recovery is not possible for security-sensitive operations.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32]; // 256 bits of entropy
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Hash a token for secure storage using SHA256.
///
/// Produces a deterministic hex-encoded hash usable as a store key. The
/// token must carry at least 256 bits of entropy (e.g., from
/// [`generate_secure_token`]).
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a token against a stored hash with constant-time comparison.
pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
    let computed_hash = hash_token(token);
    constant_time_compare(computed_hash.as_bytes(), stored_hash.as_bytes())
}

/// Compute `HMAC-SHA256(secret, message)` as a hex string.
///
/// This is the signature scheme for CSRF tokens: the server issues a
/// `(token, secret)` pair and the client must present the token together
/// with this HMAC of it.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC key of any length is accepted");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify an HMAC-SHA256 hex signature in constant time.
pub fn verify_hmac_sha256_hex(secret: &str, message: &str, signature: &str) -> bool {
    let expected = hmac_sha256_hex(secret, message);
    constant_time_compare(expected.as_bytes(), signature.as_bytes())
}

/// Perform constant-time comparison of two byte slices.
///
/// Uses the `subtle` crate to ensure the comparison takes the same amount
/// of time regardless of where (or if) the bytes differ.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
