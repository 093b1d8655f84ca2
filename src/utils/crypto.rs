use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of the digest embedded in signed URLs
pub const DIGEST_LEN: usize = 16;

/// Full hex HMAC-SHA256 of `message`
pub fn generate_digest(key: &str, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// First 16 hex characters of the HMAC-SHA256 of `message`
pub fn truncated_digest(key: &str, message: &str) -> String {
    let mut digest = generate_digest(key, message);
    digest.truncate(DIGEST_LEN);
    digest
}

/// Verify a truncated digest (returns bool)
pub fn verify_digest(key: &str, message: &str, digest: &str) -> bool {
    let expected = truncated_digest(key, message);
    constant_time_eq(expected.as_bytes(), digest.as_bytes())
}

/// Constant-time string comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
