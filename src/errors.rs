use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in PassVault.
#[derive(Debug, Error)]
pub enum PassVaultError {
    // --- Authentication errors ---
    #[error("Wrong passphrase ({attempts_left} attempt(s) left)")]
    WrongPassphrase { attempts_left: u32 },

    #[error("Access denied — too many wrong passphrases")]
    AccessDenied,

    /// Raised by `MasterKeyRecord::unlock`, which has no notion of
    /// attempts; `AuthenticationGate` turns it into `WrongPassphrase` or
    /// `AccessDenied`.
    #[error("Passphrase does not match this key file")]
    PassphraseRejected,

    // --- Crypto errors ---
    #[error("Authentication failed — ciphertext was modified or the key is wrong")]
    AuthenticationFailed,

    #[error("Entry '{label}' on line {line} failed authentication — vault file may be corrupted or tampered")]
    EntryAuthenticationFailed { line: usize, label: String },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("System entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    // --- Record errors ---
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Key file not found at {0}")]
    KeyFileNotFound(PathBuf),

    #[error("Key file already exists at {0}")]
    KeyFileExists(PathBuf),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("No entry labelled '{0}'")]
    EntryNotFound(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl PassVaultError {
    /// Shorthand for a `MalformedRecord` error.
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for PassVault results.
pub type Result<T> = std::result::Result<T, PassVaultError>;
