//! `passvault list` — display all entries in a table.

use crate::cli::output;
use crate::cli::{open_session, Cli, Context};
use crate::errors::Result;
use crate::vault::DecryptedEntry;

/// Execute the `list` command.
pub fn execute(cli: &Cli, latest: bool, skip_corrupt: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut gate = ctx.gate()?;
    let session = open_session(&mut gate)?;

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for item in session.list_entries()? {
        match item {
            Ok(entry) => entries.push(entry),
            Err(e) if skip_corrupt => {
                output::warning(&format!("Skipping entry: {e}"));
                skipped += 1;
            }
            Err(e) => {
                output::tip("Run `passvault list --skip-corrupt` to show the readable entries.");
                return Err(e);
            }
        }
    }

    if latest {
        entries = latest_per_label(entries);
    }

    output::info(&format!("{} entr(ies)", entries.len()));
    output::print_entries_table(&entries);

    if skipped > 0 {
        output::warning(&format!("{skipped} entr(ies) could not be read"));
    }

    Ok(())
}

/// Keep only the last entry for each label, in the order those last
/// entries were written.
fn latest_per_label(entries: Vec<DecryptedEntry>) -> Vec<DecryptedEntry> {
    let mut kept: Vec<DecryptedEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        kept.retain(|e| e.label != entry.label);
        kept.push(entry);
    }
    kept
}
