use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Size of an HMAC-SHA256 or SHA-256 output in bytes
pub const SIGNATURE_SIZE: usize = 32;

/// Length of a hex-encoded signature
pub const SIGNATURE_HEX_LEN: usize = SIGNATURE_SIZE * 2;

/// Generates an HMAC-SHA256 tag
///
/// # Arguments
/// * `key` - The secret key (any length, including empty)
/// * `message` - The message to authenticate
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; SIGNATURE_SIZE] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// HMAC-SHA256 tag as lowercase hex
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    hex::encode(hmac_sha256(key, message))
}

/// Plain SHA-256 digest, used to check Lightning preimages against payment hashes
pub fn sha256(data: &[u8]) -> [u8; SIGNATURE_SIZE] {
    Sha256::digest(data).into()
}

/// Compares two byte strings without branching on where they differ.
///
/// Length is not secret: inputs of different lengths return `false` early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
