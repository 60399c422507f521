use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::SiteError;

type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes in a session nonce.
pub const NONCE_BYTES: usize = 16;

/// Compares a supplied secret with the configured one in constant time.
///
/// Returns `false` when either side is empty. A length mismatch still walks
/// the supplied bytes once before answering; only the length itself leaks.
pub fn verify_credential(supplied: &str, configured: &str) -> bool {
    if configured.is_empty() || supplied.is_empty() {
        return false;
    }

    let supplied = supplied.as_bytes();
    let configured = configured.as_bytes();

    if supplied.len() != configured.len() {
        std::hint::black_box(constant_time_eq(
            std::hint::black_box(supplied),
            std::hint::black_box(supplied),
        ));
        return false;
    }

    constant_time_eq(supplied, configured)
}

/// Constant-time comparison of two byte strings.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// HMAC-SHA256 of `message` under `key`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, SiteError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| SiteError::Crypto(format!("hmac key rejected: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Hex-encoded nonce drawn from the thread-local CSPRNG.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
