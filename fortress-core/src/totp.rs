//! RFC 6238 time-based one-time passwords.
//!
//! Real TOTP verification: HMAC-SHA1 over the big-endian time-step
//! counter, dynamic truncation, 6 digits, 30-second steps, with one step
//! of clock skew tolerated in each direction. Codes are compared in
//! constant time.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::{TryRngCore, rngs::OsRng};
use sha1::Sha1;

use crate::crypto::constant_time_compare;

type HmacSha1 = Hmac<Sha1>;

/// Time-step length in seconds.
pub const STEP_SECONDS: u64 = 30;

/// Number of digits in a code.
pub const DIGITS: u32 = 6;

/// Steps of clock skew accepted on either side of "now".
pub const SKEW_STEPS: u64 = 1;

/// Generate a 160-bit shared secret, the standard size for SHA-1 TOTP.
///
/// # Panics
///
/// Panics if the OS random number generator fails, as for
/// [`crate::crypto::generate_secure_token`].
pub fn generate_secret() -> Vec<u8> {
    let mut bytes = vec![0u8; 20];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    bytes
}

/// The code for `secret` at the given time.
pub fn code_at(secret: &[u8], time: DateTime<Utc>) -> String {
    code_for_step(secret, (time.timestamp().max(0) as u64) / STEP_SECONDS)
}

/// Verify `code` for `secret` at time `now`, accepting [`SKEW_STEPS`]
/// steps of drift in either direction.
pub fn verify(secret: &[u8], code: &str, now: DateTime<Utc>) -> bool {
    if code.len() != DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let current_step = (now.timestamp().max(0) as u64) / STEP_SECONDS;
    let first = current_step.saturating_sub(SKEW_STEPS);
    let last = current_step + SKEW_STEPS;

    // Check every candidate step without early exit on match, keeping the
    // comparison work independent of which step (if any) matches.
    let mut matched = false;
    for step in first..=last {
        let expected = code_for_step(secret, step);
        if constant_time_compare(expected.as_bytes(), code.as_bytes()) {
            matched = true;
        }
    }
    matched
}

fn code_for_step(secret: &[u8], step: u64) -> String {
    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC key of any length is accepted");
    mac.update(&step.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // RFC 4226 dynamic truncation: the low nibble of the last byte picks
    // a 4-byte window, whose top bit is masked off.
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    format!("{:06}", binary % 10u32.pow(DIGITS))
}
