//! Styled messages for the passvault CLI.
//!
//! Confirmations and notes go to stdout; warnings and errors go to
//! stderr so piped output only carries what a command prints on purpose.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::DecryptedEntry;

/// A completed action, prefixed with a green check mark.
pub fn success(msg: &str) {
    println!("{} {msg}", style("\u{2713}").green().bold());
}

/// A failure that ends the command. Written to stderr.
pub fn error(msg: &str) {
    eprintln!("{} {msg}", style("\u{2717}").red().bold());
}

/// Something the user should know about that does not stop the command.
/// Written to stderr.
pub fn warning(msg: &str) {
    eprintln!("{} {msg}", style("\u{26a0}").yellow().bold());
}

/// Neutral status line.
pub fn info(msg: &str) {
    println!("{} {msg}", style("\u{2139}").blue().bold());
}

/// Suggested next command, dimmed.
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Entries as a Label / Secret table, in the order given.
pub fn print_entries_table(entries: &[DecryptedEntry]) {
    if entries.is_empty() {
        info("No entries in this vault yet.");
        tip("Run `passvault add <LABEL>` to add your first entry.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Label", "Secret"]);

    for entry in entries {
        table.add_row(vec![entry.label.as_str(), entry.secret.as_str()]);
    }

    println!("{table}");
}
