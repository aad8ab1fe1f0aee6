//! Salt generation and keyed hashing for credential-like flows.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Generate a fresh random salt: 16 bytes of entropy, hex-encoded.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// HMAC-SHA-256 of `value` keyed by `salt`, as a hex digest.
///
/// Deterministic for the same inputs; different salts produce unrelated
/// outputs for the same value.
pub fn keyed_hash(value: &str, salt: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC accepts any key length");
    mac.update(value.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
