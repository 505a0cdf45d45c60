//! Cryptographic primitives for PassVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - Argon2id / PBKDF2 password-based key derivation (`kdf`)
//! - Zeroizing key types and HKDF sub-key derivation (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive, ...};
pub use encryption::{decrypt, decrypt_with_aad, encrypt, encrypt_with_aad};
pub use kdf::{derive, generate_salt, KdfParams};
pub use keys::{DataKey, WrappingKey, KEY_LEN};
