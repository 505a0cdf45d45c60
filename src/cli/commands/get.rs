//! `passvault get` — print the most recent secret for a label.

use crate::cli::{open_session, Cli, Context};
use crate::errors::{PassVaultError, Result};

/// Execute the `get` command.
pub fn execute(cli: &Cli, label: &str) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut gate = ctx.gate()?;
    let session = open_session(&mut gate)?;

    // Decrypt and print the secret value to stdout.
    let entry = session
        .get_entry(label)?
        .ok_or_else(|| PassVaultError::EntryNotFound(label.to_string()))?;
    println!("{}", entry.secret);

    Ok(())
}
