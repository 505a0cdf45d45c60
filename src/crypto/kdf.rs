//! Password-based key derivation.
//!
//! Two iteration-hardened KDFs are supported:
//! - **Argon2id** (default): memory-hard, resists GPU guessing.
//! - **PBKDF2-HMAC-SHA256**: memory-light, tuned by iteration count.
//!
//! The parameters used at creation are stored in the master-key record
//! so that every later unlock re-derives with exactly the same settings.
//! Derivation is deliberately slow and runs on the calling thread.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::TryRngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use super::keys::{WrappingKey, KEY_LEN};
use crate::errors::{PassVaultError, Result};

/// Length of a freshly generated salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Shortest salt accepted when reading an existing record.
pub const MIN_SALT_LEN: usize = 16;

/// Minimum safe Argon2 memory cost in KiB (8 MB).
pub const MIN_ARGON2_MEMORY_KIB: u32 = 8_192;

/// Minimum PBKDF2 iteration count.
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;

/// Default PBKDF2 iteration count.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// Largest Argon2 memory cost accepted, in KiB (4 GiB).
pub const MAX_ARGON2_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Largest Argon2 pass count accepted.
pub const MAX_ARGON2_ITERATIONS: u32 = 64;

/// Largest Argon2 parallelism accepted.
pub const MAX_ARGON2_PARALLELISM: u32 = 64;

/// Largest PBKDF2 iteration count accepted.
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// KDF algorithm and its work factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfParams {
    /// Argon2id (v0x13).
    Argon2id {
        /// Memory cost in KiB (default: 65 536 = 64 MB).
        memory_kib: u32,
        /// Number of passes (default: 3).
        iterations: u32,
        /// Parallelism lanes (default: 4).
        parallelism: u32,
    },
    /// PBKDF2 with HMAC-SHA256.
    Pbkdf2Sha256 {
        /// Iteration count (default: 600 000).
        iterations: u32,
    },
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::Argon2id {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// PBKDF2-HMAC-SHA256 with the default iteration count.
    pub fn pbkdf2_default() -> Self {
        Self::Pbkdf2Sha256 {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }

    /// Name used in the key file and in `.passvault.toml`.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Argon2id { .. } => "argon2id",
            Self::Pbkdf2Sha256 { .. } => "pbkdf2-sha256",
        }
    }

    /// Reject work factors that would make offline guessing cheap, or
    /// that are too large to run on an ordinary machine.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => {
                if !(MIN_ARGON2_MEMORY_KIB..=MAX_ARGON2_MEMORY_KIB).contains(&memory_kib) {
                    return Err(PassVaultError::KeyDerivationFailed(format!(
                        "Argon2 memory_kib must be between {MIN_ARGON2_MEMORY_KIB} and {MAX_ARGON2_MEMORY_KIB} (got {memory_kib})"
                    )));
                }
                if !(1..=MAX_ARGON2_ITERATIONS).contains(&iterations) {
                    return Err(PassVaultError::KeyDerivationFailed(format!(
                        "Argon2 iterations must be between 1 and {MAX_ARGON2_ITERATIONS} (got {iterations})"
                    )));
                }
                if !(1..=MAX_ARGON2_PARALLELISM).contains(&parallelism) {
                    return Err(PassVaultError::KeyDerivationFailed(format!(
                        "Argon2 parallelism must be between 1 and {MAX_ARGON2_PARALLELISM} (got {parallelism})"
                    )));
                }
            }
            Self::Pbkdf2Sha256 { iterations } => {
                if !(MIN_PBKDF2_ITERATIONS..=MAX_PBKDF2_ITERATIONS).contains(&iterations) {
                    return Err(PassVaultError::KeyDerivationFailed(format!(
                        "PBKDF2 iterations must be between {MIN_PBKDF2_ITERATIONS} and {MAX_PBKDF2_ITERATIONS} (got {iterations})"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for KdfParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => write!(
                f,
                "argon2id (m={memory_kib} KiB, t={iterations}, p={parallelism})"
            ),
            Self::Pbkdf2Sha256 { iterations } => {
                write!(f, "pbkdf2-sha256 ({iterations} iterations)")
            }
        }
    }
}

/// Derive a 32-byte wrapping key from a passphrase and salt.
///
/// The same passphrase + salt + params always produce the same key.
pub fn derive(passphrase: &[u8], salt: &[u8], params: &KdfParams) -> Result<WrappingKey> {
    if salt.is_empty() {
        return Err(PassVaultError::KeyDerivationFailed(
            "salt must not be empty".into(),
        ));
    }
    params.validate()?;

    let mut key = [0u8; KEY_LEN];
    match *params {
        KdfParams::Argon2id {
            memory_kib,
            iterations,
            parallelism,
        } => {
            let argon2_params = Params::new(memory_kib, iterations, parallelism, Some(KEY_LEN))
                .map_err(|e| {
                    PassVaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}"))
                })?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params)
                .hash_password_into(passphrase, salt, &mut key)
                .map_err(|e| {
                    PassVaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}"))
                })?;
        }
        KdfParams::Pbkdf2Sha256 { iterations } => {
            pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, iterations, &mut key);
        }
    }

    let wrapping_key = WrappingKey::new(key);
    key.zeroize();
    Ok(wrapping_key)
}

/// Generate a cryptographically random salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    fill_random(&mut salt)?;
    Ok(salt)
}

/// Fill `buf` from the operating system's CSPRNG.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<()> {
    rand::rngs::OsRng
        .try_fill_bytes(buf)
        .map_err(|e| PassVaultError::EntropyUnavailable(e.to_string()))
}
