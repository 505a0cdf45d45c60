//! Authentication gate: the unlock state machine.
//!
//! ```text
//!   NoVault ──passphrase──▶ Unlocked          (creates the key file)
//!   Locked  ──correct────▶ Unlocked
//!   Locked  ──wrong──────▶ Locked             (attempts remain)
//!   Locked  ──wrong──────▶ Denied             (last attempt used)
//! ```
//!
//! A successful transition hands back a [`Session`], which owns the data
//! key and is the only way to add or list entries.  Code that has no
//! `Session` cannot touch the vault.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::crypto::kdf::KdfParams;
use crate::crypto::keys::DataKey;
use crate::errors::{PassVaultError, Result};

use super::entry::DecryptedEntry;
use super::master_key::MasterKeyRecord;
use super::store::{Entries, VaultStore};

/// Observable state of an [`AuthenticationGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No master-key record on disk yet.
    NoVault,
    /// A record exists and no passphrase has been verified.
    Locked { attempts_left: u32 },
    /// A passphrase was verified and a session issued.
    Unlocked,
    /// Too many wrong passphrases; no further attempts are run.
    Denied,
}

/// Orchestrates bootstrap and unlock for one key file / vault file pair.
pub struct AuthenticationGate {
    key_path: PathBuf,
    vault_path: PathBuf,
    kdf: KdfParams,
    max_attempts: u32,
    failures: u32,
    unlocked: bool,
}

impl AuthenticationGate {
    /// `kdf` is used only when a new record is created; existing records
    /// always unlock with their stored parameters.  `max_attempts` is
    /// clamped to at least 1.
    pub fn new(
        key_path: impl Into<PathBuf>,
        vault_path: impl Into<PathBuf>,
        kdf: KdfParams,
        max_attempts: u32,
    ) -> Self {
        Self {
            key_path: key_path.into(),
            vault_path: vault_path.into(),
            kdf,
            max_attempts: max_attempts.max(1),
            failures: 0,
            unlocked: false,
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    /// Current state, checking the disk for the key file.
    pub fn state(&self) -> GateState {
        if self.is_denied() {
            GateState::Denied
        } else if self.unlocked {
            GateState::Unlocked
        } else if !self.key_path.exists() {
            GateState::NoVault
        } else {
            GateState::Locked {
                attempts_left: self.max_attempts - self.failures,
            }
        }
    }

    /// Create the vault on first run, otherwise verify the passphrase.
    pub fn bootstrap_or_unlock(&mut self, passphrase: &str) -> Result<Session> {
        match self.state() {
            GateState::Denied => Err(PassVaultError::AccessDenied),
            GateState::NoVault => self.bootstrap(passphrase),
            GateState::Locked { .. } | GateState::Unlocked => self.unlock(passphrase),
        }
    }

    /// Create a new master-key record.  Fails if one already exists.
    pub fn bootstrap(&mut self, passphrase: &str) -> Result<Session> {
        if self.is_denied() {
            return Err(PassVaultError::AccessDenied);
        }
        if self.key_path.exists() {
            return Err(PassVaultError::KeyFileExists(self.key_path.clone()));
        }

        let (record, data_key) = MasterKeyRecord::create(passphrase.as_bytes(), &self.kdf)?;
        record.save_new(&self.key_path)?;
        debug!(path = %self.key_path.display(), "bootstrapped new vault");

        Ok(self.open_session(data_key))
    }

    /// Verify the passphrase against the existing record.
    pub fn unlock(&mut self, passphrase: &str) -> Result<Session> {
        if self.is_denied() {
            return Err(PassVaultError::AccessDenied);
        }
        let record = MasterKeyRecord::load(&self.key_path)?;
        let data_key = self.try_unlock(&record, passphrase)?;
        Ok(self.open_session(data_key))
    }

    /// Replace the record with one wrapping the same data key under
    /// `new_passphrase`.  A wrong `old_passphrase` counts as a failed
    /// attempt.
    pub fn change_passphrase(&mut self, old_passphrase: &str, new_passphrase: &str) -> Result<Session> {
        if self.is_denied() {
            return Err(PassVaultError::AccessDenied);
        }
        let record = MasterKeyRecord::load(&self.key_path)?;
        let data_key = self.try_unlock(&record, old_passphrase)?;

        let new_record = MasterKeyRecord::seal(new_passphrase.as_bytes(), &self.kdf, &data_key)?;
        new_record.replace(&self.key_path)?;
        debug!(path = %self.key_path.display(), kdf = %self.kdf, "passphrase changed");

        Ok(self.open_session(data_key))
    }

    fn try_unlock(&mut self, record: &MasterKeyRecord, passphrase: &str) -> Result<DataKey> {
        match record.unlock(passphrase.as_bytes()) {
            Ok(data_key) => {
                self.failures = 0;
                Ok(data_key)
            }
            Err(PassVaultError::PassphraseRejected) => {
                self.failures += 1;
                if self.is_denied() {
                    warn!(attempts = self.failures, "access denied");
                    Err(PassVaultError::AccessDenied)
                } else {
                    Err(PassVaultError::WrongPassphrase {
                        attempts_left: self.max_attempts - self.failures,
                    })
                }
            }
            Err(e) => Err(e),
        }
    }

    fn open_session(&mut self, data_key: DataKey) -> Session {
        self.unlocked = true;
        Session {
            data_key,
            store: VaultStore::new(self.vault_path.clone()),
        }
    }

    fn is_denied(&self) -> bool {
        self.failures >= self.max_attempts
    }
}

/// An unlocked vault.  Holds the data key until dropped.
#[derive(Debug)]
pub struct Session {
    data_key: DataKey,
    store: VaultStore,
}

impl Session {
    /// Append a new entry.
    pub fn add_entry(&self, label: &str, secret: &str) -> Result<()> {
        self.store.add(&self.data_key, label, secret)
    }

    /// All entries in write order, decrypted lazily.
    pub fn list_entries(&self) -> Result<Entries<'_>> {
        self.store.list(&self.data_key)
    }

    /// Most recent entry with `label`.
    pub fn get_entry(&self, label: &str) -> Result<Option<DecryptedEntry>> {
        self.store.latest(&self.data_key, label)
    }

    pub fn store(&self) -> &VaultStore {
        &self.store
    }
}
