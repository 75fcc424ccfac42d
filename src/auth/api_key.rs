//! VisionTrack gateway key generation
//!
//! Keys are shown to the caller once. Only the public prefix and the SHA-256
//! digest are kept.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "vt_";
const KEY_RANDOM_LEN: usize = 32;
const PUBLIC_PREFIX_LEN: usize = 8;

/// Freshly generated key material
#[derive(Debug, Clone)]
pub struct IssuedKey {
    pub plaintext: String,
    pub prefix: String,
    pub hash: String,
}

/// VT API key generator
pub struct ApiKeyGenerator;

impl ApiKeyGenerator {
    /// Format: vt_<32 alphanumeric>
    pub fn generate() -> String {
        let random: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(KEY_RANDOM_LEN)
            .map(char::from)
            .collect();

        format!("{}{}", KEY_PREFIX, random)
    }

    /// Public identifier: the scheme prefix plus the first 8 random characters
    pub fn public_prefix(key: &str) -> String {
        key.chars()
            .take(KEY_PREFIX.len() + PUBLIC_PREFIX_LEN)
            .collect()
    }

    /// Hex-encoded SHA-256 of the key
    pub fn hash(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    pub fn issue() -> IssuedKey {
        let plaintext = Self::generate();
        IssuedKey {
            prefix: Self::public_prefix(&plaintext),
            hash: Self::hash(&plaintext),
            plaintext,
        }
    }
}
