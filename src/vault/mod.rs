//! Vault module — encrypted credential storage.
//!
//! This module provides:
//! - `VaultEntry` / `DecryptedEntry` and the entry line format (`entry`)
//! - The master-key record and its key file format (`master_key`)
//! - The append-only `VaultStore` over the entries file (`store`)
//! - The `AuthenticationGate` state machine and `Session` (`gate`)

pub mod entry;
pub mod gate;
pub mod master_key;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{DecryptedEntry, VaultEntry};
pub use gate::{AuthenticationGate, GateState, Session};
pub use master_key::MasterKeyRecord;
pub use store::{Entries, VaultStore};

use std::path::Path;

use crate::errors::Result;

/// On Unix, restrict permissions to owner-only read/write.
pub(crate) fn restrict_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
