//! Password hashing (PBKDF2 with HMAC-SHA512).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

/// Length of a derived hash in bytes (512 bits).
pub const HASH_LEN: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashingError {
    #[error("invalid base64 in {0}")]
    Base64(&'static str),

    #[error("iteration count must be at least 1")]
    Iterations,

    #[error("invalid HMAC key length")]
    KeyLength,
}

/// A deterministic, expensive one-way derivation of a password hash.
pub trait KeyDerivation: Send + Sync {
    fn derive(
        &self,
        base64_password: &str,
        base64_salt: &str,
        iterations: u32,
    ) -> Result<Vec<u8>, HashingError>;
}

/// PBKDF2-HMAC-SHA512 producing a 512 bit key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pbkdf2Sha512;

impl KeyDerivation for Pbkdf2Sha512 {
    fn derive(
        &self,
        base64_password: &str,
        base64_salt: &str,
        iterations: u32,
    ) -> Result<Vec<u8>, HashingError> {
        create_hash(base64_password, base64_salt, iterations)
    }
}

/// Derive the hash of a base64 encoded password with a base64 encoded salt.
pub fn create_hash(
    base64_password: &str,
    base64_salt: &str,
    iterations: u32,
) -> Result<Vec<u8>, HashingError> {
    let password = BASE64
        .decode(base64_password)
        .map_err(|_| HashingError::Base64("password"))?;
    let salt = BASE64
        .decode(base64_salt)
        .map_err(|_| HashingError::Base64("salt"))?;

    let mut out = vec![0u8; HASH_LEN];
    pbkdf2_hmac_sha512(&password, &salt, iterations, &mut out)?;
    Ok(out)
}

/// Encode a raw password, salt and derived hash as `salt:iterations:hash`.
pub fn encode_password(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<String, HashingError> {
    let base64_salt = BASE64.encode(salt);
    let hash = create_hash(&BASE64.encode(password), &base64_salt, iterations)?;
    Ok(format!("{}:{}:{}", base64_salt, iterations, BASE64.encode(hash)))
}

/// PBKDF2 (RFC 8018) with HMAC-SHA512 as PRF, filling `out`.
fn pbkdf2_hmac_sha512(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    out: &mut [u8],
) -> Result<(), HashingError> {
    if iterations == 0 {
        return Err(HashingError::Iterations);
    }

    let prf = HmacSha512::new_from_slice(password).map_err(|_| HashingError::KeyLength)?;

    for (index, block) in out.chunks_mut(HASH_LEN).enumerate() {
        // U1 = PRF(P, S || INT(i))
        let mut mac = prf.clone();
        mac.update(salt);
        mac.update(&(index as u32 + 1).to_be_bytes());
        let mut u = mac.finalize().into_bytes();

        let mut t = u.clone();
        for _ in 1..iterations {
            let mut mac = prf.clone();
            mac.update(&u);
            u = mac.finalize().into_bytes();
            for (acc, x) in t.iter_mut().zip(u.iter()) {
                *acc ^= x;
            }
        }

        block.copy_from_slice(&t[..block.len()]);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // PBKDF2-HMAC-SHA512("password", "salt", 1)
        let hash = create_hash("cGFzc3dvcmQ=", "c2FsdA==", 1).unwrap();
        assert_eq!(
            BASE64.encode(hash),
            "hn9wzxreAs/zdSWZo6U9xK80x6ZpgVrl1RNVThyM8lLALUcKKFoFAbrZmb/pQ8CPBQI119aLHaVeY/c7YKV/zg=="
        );
    }

    #[test]
    fn test_multiple_iterations() {
        let hash = create_hash("cGFzczE=", "c2FsdA==", 100).unwrap();
        assert_eq!(hash.len(), HASH_LEN);
        assert_eq!(
            BASE64.encode(hash),
            "MAK8JjJQh/c4uYbwkAm33TRXCbeuBC+meeK9ww3Mu4KTv08+8ywTKgF24MNHotOESjDmsutrEk+38PaZVX2TFA=="
        );
    }

    #[test]
    fn test_encode_password() {
        let encoded = encode_password(b"secret", b"0123456789abcdef", 10).unwrap();
        assert_eq!(
            encoded,
            "MDEyMzQ1Njc4OWFiY2RlZg==:10:CT2WaqiwCp/TOhqi4epOk/YhKIMQHkXaak6rx4jz4h9W1EfS22pl091UXfqMmpDddPNDZA6aN47PJSOWf2dhFg=="
        );
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(
            create_hash("not base64!", "c2FsdA==", 1),
            Err(HashingError::Base64("password"))
        );
        assert_eq!(create_hash("cGFzczE=", "c2FsdA==", 0), Err(HashingError::Iterations));
    }
}
