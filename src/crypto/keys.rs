//! Key types and HKDF sub-key derivation.
//!
//! The KDF output (the *wrapping key*) is never used directly.  HKDF-SHA256
//! splits it into two independent sub-keys:
//! - a **verifier key** that only ever encrypts the passphrase marker, and
//! - a **wrap key** that only ever encrypts the data-encryption key.
//!
//! A verifier ciphertext therefore cannot be replayed in the wrapped-key
//! slot (or the reverse), and a passing verifier says nothing about which
//! data key the wrap key will accept.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{PassVaultError, Result};

/// Length of every symmetric key in the vault (256 bits).
pub const KEY_LEN: usize = 32;

const VERIFIER_INFO: &[u8] = b"passvault-verifier-key";
const WRAP_INFO: &[u8] = b"passvault-data-key-wrap";

/// Run HKDF-SHA256 expand over `ikm` with the given `info`.
///
/// No extract salt: the input already comes out of a password KDF and
/// is uniformly distributed.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| PassVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// Key derived from the master passphrase.  Zeroed on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct WrappingKey {
    bytes: [u8; KEY_LEN],
}

impl WrappingKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Sub-key used to encrypt and check the passphrase verifier.
    pub fn verifier_key(&self) -> Result<[u8; KEY_LEN]> {
        hkdf_derive(&self.bytes, VERIFIER_INFO)
    }

    /// Sub-key used to wrap and unwrap the data-encryption key.
    pub fn wrap_key(&self) -> Result<[u8; KEY_LEN]> {
        hkdf_derive(&self.bytes, WRAP_INFO)
    }
}

/// The vault's data-encryption key.  Zeroed on drop.
///
/// Only ever persisted in wrapped form inside the master-key record.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DataKey {
    bytes: [u8; KEY_LEN],
}

impl DataKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random data key from the OS CSPRNG.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        super::kdf::fill_random(&mut bytes)?;
        let key = Self::new(bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// Rebuild a data key from unwrapped bytes, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self::new(array))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DataKey(..)")
    }
}
