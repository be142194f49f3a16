// src/auth/token.rs
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Generate an opaque URL-safe bearer token from the OS RNG.
/// 32 random bytes, base64-url without padding (~43 chars).
pub fn generate() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// SHA-256 of the raw token. Only this digest is ever persisted; a leaked
/// sessions table does not leak usable tokens.
pub fn digest(raw_token: &str) -> [u8; 32] {
    let out = Sha256::digest(raw_token.as_bytes());
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}
