//! `passvault add` — append an entry to the vault.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_session, prompt_secret, Cli, Context, GeneratorArgs};
use crate::errors::Result;
use crate::generator;
use crate::vault::entry::validate_label;

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    label: &str,
    secret: Option<&str>,
    generate: bool,
    generator_args: &GeneratorArgs,
) -> Result<()> {
    // Reject a bad label before asking for anything.
    validate_label(label)?;

    let ctx = Context::load(cli)?;
    let mut gate = ctx.gate()?;
    let session = open_session(&mut gate)?;

    // Determine the secret from one of three sources.
    let secret_value = if generate {
        // Source 1: Generated password.
        generator::generate(&generator_args.options(&ctx.settings))?
    } else if let Some(v) = secret {
        // Source 2: Inline value on the command line.
        output::warning("Secret provided on command line — it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else {
        // Source 3: Piped stdin line or secure prompt.
        prompt_secret(label)?
    };

    // Only picks the message; a damaged vault line must not block adding.
    let existed = match session.store().labels() {
        Ok(labels) => labels.iter().any(|l| l == label),
        Err(e) => {
            output::warning(&format!("Could not read existing labels: {e}"));
            false
        }
    };
    session.add_entry(label, &secret_value)?;
    let total = session.store().entry_count()?;

    if existed {
        output::success(&format!(
            "Recorded a newer secret for '{label}' ({total} entries)"
        ));
    } else {
        output::success(&format!("Entry '{label}' added ({total} entries)"));
    }

    if generate {
        println!("{}", secret_value.as_str());
    }

    Ok(())
}
