//! `passvault init` — create a new vault and master passphrase.

use crate::cli::output;
use crate::cli::{prompt_new_passphrase, Cli, Context};
use crate::errors::{PassVaultError, Result};
use crate::vault::GateState;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut gate = ctx.gate()?;

    // 1. Refuse to touch an existing key file.
    if gate.state() != GateState::NoVault {
        output::tip("Use `passvault change-passphrase` to change the master passphrase.");
        return Err(PassVaultError::KeyFileExists(ctx.key_path));
    }

    // 2. Prompt for a new passphrase (with confirmation).
    let passphrase = prompt_new_passphrase()?;

    // 3. Write the key file.
    let session = gate.bootstrap(&passphrase)?;
    output::success(&format!(
        "Vault created ({}) with key file {}",
        ctx.settings.kdf,
        ctx.key_path.display()
    ));
    output::info(&format!(
        "Entries will be stored in {}",
        session.store().path().display()
    ));

    // 4. Show helpful tips.
    output::tip("Run `passvault add <LABEL>` to add an entry.");
    output::tip("Run `passvault list` to see all entries.");
    output::tip("Keep the key file: without it the vault cannot be opened.");

    Ok(())
}
