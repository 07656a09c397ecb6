//! Credential verification against `salt:iterations:hash` strings.

use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use subtle::ConstantTimeEq;

use crate::auth::cache::HashCache;
use crate::auth::hashing::{KeyDerivation, Pbkdf2Sha512};
use crate::observability::metrics;

/// Verifies passwords, memoizing derived hashes.
///
/// Thread-safe: the cache is concurrent and the derivation holds no lock.
pub struct CredentialsHasher<D = Pbkdf2Sha512> {
    derivation: D,
    cache: HashCache,
}

impl Default for CredentialsHasher<Pbkdf2Sha512> {
    fn default() -> Self {
        Self::new(Pbkdf2Sha512, HashCache::default())
    }
}

impl<D: KeyDerivation> CredentialsHasher<D> {
    pub fn new(derivation: D, cache: HashCache) -> Self {
        Self { derivation, cache }
    }

    /// Check a base64 encoded password against a stored `salt:iterations:hash`.
    ///
    /// Malformed stored strings never panic, they simply do not match.
    pub fn check_credentials(&self, base64_password: &str, stored: &str) -> bool {
        let fields: Vec<&str> = stored.split(':').collect();
        let [salt, iterations, expected] = fields.as_slice() else {
            return false;
        };
        let Ok(iterations) = iterations.parse::<u32>() else {
            return false;
        };
        let Ok(expected) = BASE64.decode(expected) else {
            return false;
        };

        let key = HashCache::key(base64_password, salt, iterations);
        let hash = match self.cache.get(&key) {
            Some(hash) => {
                metrics::record_hash_cache_hit();
                hash
            }
            None => {
                metrics::record_hash_cache_miss();
                let start = Instant::now();
                let derived = self.derivation.derive(base64_password, salt, iterations);
                metrics::record_hash_duration(start.elapsed());

                let hash: Arc<[u8]> = match derived {
                    Ok(hash) => Arc::from(hash),
                    Err(e) => {
                        tracing::debug!(error = %e, "Could not derive password hash");
                        return false;
                    }
                };
                self.cache.insert(key, hash.clone());
                hash
            }
        };

        // constant-time, length mismatch yields false
        hash.ct_eq(&expected).into()
    }

    pub fn cache(&self) -> &HashCache {
        &self.cache
    }
}
