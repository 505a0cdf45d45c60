//! `passvault change-passphrase` — re-wrap the data key under a new
//! master passphrase.
//!
//! Entries are untouched: they stay encrypted under the same data key.

use crate::cli::output;
use crate::cli::{prompt_new_passphrase, prompt_passphrase, Cli, Context};
use crate::errors::{PassVaultError, Result};
use crate::vault::GateState;

/// Execute the `change-passphrase` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut gate = ctx.gate()?;

    if gate.state() == GateState::NoVault {
        output::tip("Run `passvault init` to create a vault.");
        return Err(PassVaultError::KeyFileNotFound(ctx.key_path));
    }

    // 1. Verify the current passphrase, re-prompting while attempts remain.
    let current = loop {
        let candidate = prompt_passphrase("Current master passphrase")?;
        match gate.unlock(&candidate) {
            Ok(_session) => break candidate,
            Err(PassVaultError::WrongPassphrase { attempts_left }) => {
                output::warning(&format!(
                    "Wrong passphrase — {attempts_left} attempt(s) left."
                ));
            }
            Err(e) => return Err(e),
        }
    };

    // 2. Choose the new one.
    let new_passphrase = prompt_new_passphrase()?;

    // 3. Replace the key file atomically.
    let session = gate.change_passphrase(&current, &new_passphrase)?;
    output::success(&format!(
        "Master passphrase changed ({} entries kept)",
        session.store().entry_count()?
    ));

    Ok(())
}
