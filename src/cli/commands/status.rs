//! `passvault status` — show vault files, KDF settings and entry count.
//!
//! Never asks for the passphrase and never decrypts anything.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;
use crate::vault::{MasterKeyRecord, VaultStore};

/// Execute the `status` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;

    if !ctx.key_path.exists() {
        output::info(&format!(
            "No vault yet (key file {} does not exist)",
            ctx.key_path.display()
        ));
        output::tip("Run `passvault init` to create one.");
        return Ok(());
    }

    let record = MasterKeyRecord::load(&ctx.key_path)?;
    let store = VaultStore::new(&ctx.vault_path);

    output::info(&format!("Key file:   {}", ctx.key_path.display()));
    output::info(&format!("Vault file: {}", ctx.vault_path.display()));
    output::info(&format!("KDF:        {}", record.kdf));
    output::info(&format!(
        "Created:    {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output::info(&format!("Entries:    {}", store.entry_count()?));

    match store.labels() {
        Ok(mut labels) => {
            labels.sort();
            labels.dedup();
            output::info(&format!("Labels:     {}", labels.len()));
        }
        Err(e) => output::warning(&format!("Vault file has unreadable lines: {e}")),
    }

    Ok(())
}
