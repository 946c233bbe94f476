//! In-memory API key registry.

use rand::RngCore;
use std::collections::HashSet;
use std::fmt::Write as _;
use tokio::sync::RwLock;

use super::AuthError;

/// Number of random bytes in a generated key (hex-encoded, so keys are
/// twice as many characters).
const KEY_BYTES: usize = 32;

/// Registry of valid API keys.
///
/// Holds exactly one master key per process lifetime plus a mutable set of
/// standard keys. The master key is the only key authorized to mint new
/// standard keys and is itself always valid. Nothing is persisted: issued
/// keys are lost on restart, which is accepted for this service.
pub struct KeyRegistry {
    master_key: String,
    keys: RwLock<HashSet<String>>,
}

impl KeyRegistry {
    /// Creates a registry with the given master key and pre-seeded standard
    /// keys. The master key is a member of the valid set.
    pub fn new(master_key: String, seeded: Vec<String>) -> Self {
        let mut keys: HashSet<String> = seeded.into_iter().collect();
        keys.insert(master_key.clone());
        Self {
            master_key,
            keys: RwLock::new(keys),
        }
    }

    /// Mints a new standard key.
    ///
    /// Succeeds only when `requested_by` is the master key; the registry is
    /// untouched otherwise.
    pub async fn issue_key(&self, requested_by: &str) -> Result<String, AuthError> {
        if !self.is_master(requested_by) {
            return Err(AuthError::InvalidKey);
        }

        let key = generate_key();
        self.keys.write().await.insert(key.clone());
        tracing::info!("Issued new API key (total valid keys: {})", self.key_count().await);
        Ok(key)
    }

    /// Membership test against the valid set (master key included).
    pub async fn is_valid(&self, key: &str) -> bool {
        self.keys.read().await.contains(key)
    }

    /// Whether `key` is the master key. Constant-time comparison.
    pub fn is_master(&self, key: &str) -> bool {
        constant_time_eq(key.as_bytes(), self.master_key.as_bytes())
    }

    /// Number of valid keys, master included.
    pub async fn key_count(&self) -> usize {
        self.keys.read().await.len()
    }

    /// Length of the master key in characters. Logged at startup instead of
    /// the key itself.
    pub fn master_key_len(&self) -> usize {
        self.master_key.len()
    }
}

/// Generates a fresh high-entropy API key: 32 random bytes, hex-encoded.
pub fn generate_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().fold(
        String::with_capacity(KEY_BYTES * 2),
        |mut out, b| {
            let _ = write!(out, "{:02x}", b);
            out
        },
    )
}

/// Constant-time byte comparison to prevent timing attacks.
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
