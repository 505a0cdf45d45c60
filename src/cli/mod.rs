//! CLI module — Clap argument parser, prompting, output helpers, and
//! command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{PassVaultError, Result};
use crate::generator::GeneratorOptions;
use crate::vault::{AuthenticationGate, GateState, Session};

/// Minimum passphrase length accepted for a new vault.
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// PassVault CLI: local passphrase-protected password vault.
#[derive(Parser)]
#[command(
    name = "passvault",
    about = "Local passphrase-protected password vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Master-key file (default: passvault.key, or `key_file` in .passvault.toml)
    #[arg(long, env = "PASSVAULT_KEY_FILE", global = true)]
    pub key_file: Option<PathBuf>,

    /// Vault entries file (default: passvault.db, or `vault_file` in .passvault.toml)
    #[arg(long, env = "PASSVAULT_VAULT_FILE", global = true)]
    pub vault_file: Option<PathBuf>,

    /// Increase log verbosity (-v: warnings, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault and master passphrase
    Init,

    /// Add an entry (adding an existing label records a newer secret)
    Add {
        /// Account or site label (e.g. github.com)
        label: String,
        /// Secret value (omit for interactive prompt)
        secret: Option<String>,
        /// Generate a random password instead of entering one
        #[arg(short, long, conflicts_with = "secret")]
        generate: bool,
        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Print the most recent secret for a label
    Get {
        /// Account or site label
        label: String,
    },

    /// List all entries with their secrets
    List {
        /// Show only the most recent entry per label
        #[arg(long)]
        latest: bool,
        /// Skip entries that fail to decrypt instead of aborting
        #[arg(long)]
        skip_corrupt: bool,
    },

    /// Generate a random password without storing it
    Generate {
        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Change the master passphrase (entries are kept as they are)
    ChangePassphrase,

    /// Show vault files, KDF settings and entry count
    Status,
}

/// Password generator flags shared by `add --generate` and `generate`.
#[derive(clap::Args, Debug, Clone)]
pub struct GeneratorArgs {
    /// Password length (default: `generator_length` in .passvault.toml, or 20)
    #[arg(short, long)]
    pub length: Option<usize>,
    /// Leave digits out
    #[arg(long)]
    pub no_digits: bool,
    /// Leave punctuation out
    #[arg(long)]
    pub no_symbols: bool,
}

impl GeneratorArgs {
    pub fn options(&self, settings: &Settings) -> GeneratorOptions {
        GeneratorOptions {
            length: self.length.unwrap_or(settings.generator_length),
            digits: !self.no_digits,
            symbols: !self.no_symbols,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolved settings and file paths for one invocation.
pub struct Context {
    pub settings: Settings,
    pub key_path: PathBuf,
    pub vault_path: PathBuf,
}

impl Context {
    /// Load `.passvault.toml` from the working directory and apply the
    /// `--key-file` / `--vault-file` overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let settings = Settings::load(&cwd)?;

        let key_path = cli
            .key_file
            .clone()
            .unwrap_or_else(|| settings.key_path(&cwd));
        let vault_path = cli
            .vault_file
            .clone()
            .unwrap_or_else(|| settings.vault_path(&cwd));

        Ok(Self {
            settings,
            key_path,
            vault_path,
        })
    }

    /// Build an authentication gate for these paths and settings.
    pub fn gate(&self) -> Result<AuthenticationGate> {
        Ok(AuthenticationGate::new(
            &self.key_path,
            &self.vault_path,
            self.settings.kdf_params()?,
            self.settings.max_attempts,
        ))
    }
}

/// Unlock the vault, creating it first if no key file exists yet.
///
/// Re-prompts after a wrong passphrase until the gate denies access.
pub fn open_session(gate: &mut AuthenticationGate) -> Result<Session> {
    if gate.state() == GateState::NoVault {
        output::info(&format!(
            "No key file at {} — creating a new vault.",
            gate.key_path().display()
        ));
        let passphrase = prompt_new_passphrase()?;
        let session = gate.bootstrap(&passphrase)?;
        output::success("Vault created.");
        return Ok(session);
    }

    loop {
        let passphrase = prompt_passphrase("Enter master passphrase")?;
        match gate.unlock(&passphrase) {
            Ok(session) => return Ok(session),
            Err(PassVaultError::WrongPassphrase { attempts_left }) => {
                output::warning(&format!(
                    "Wrong passphrase — {attempts_left} attempt(s) left."
                ));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Read the master passphrase.
///
/// When stdin is not a terminal the next line of stdin is used, so the
/// CLI can be scripted.  Returns `Zeroizing<String>` so the passphrase is
/// wiped from memory on drop.
pub fn prompt_passphrase(prompt: &str) -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        return read_stdin_line();
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| PassVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase with confirmation.
///
/// Enforces a minimum passphrase length.
pub fn prompt_new_passphrase() -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        let pw = read_stdin_line()?;
        if pw.chars().count() < MIN_PASSPHRASE_LEN {
            return Err(PassVaultError::CommandFailed(format!(
                "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let passphrase = dialoguer::Password::new()
            .with_prompt("Choose master passphrase")
            .with_confirmation(
                "Confirm master passphrase",
                "Passphrases do not match, try again",
            )
            .interact()
            .map_err(|e| PassVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
        let passphrase = Zeroizing::new(passphrase);

        if passphrase.chars().count() < MIN_PASSPHRASE_LEN {
            output::warning(&format!(
                "Passphrase must be at least {MIN_PASSPHRASE_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(passphrase);
    }
}

/// Read an entry secret, from stdin when piped or from a hidden prompt.
pub fn prompt_secret(label: &str) -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        return read_stdin_line();
    }

    let secret = dialoguer::Password::new()
        .with_prompt(format!("Secret for {label}"))
        .interact()
        .map_err(|e| PassVaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(secret))
}

/// Read one line from stdin without its line terminator.
fn read_stdin_line() -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    let read = io::stdin().read_line(&mut line)?;
    if read == 0 {
        return Err(PassVaultError::CommandFailed(
            "unexpected end of input on stdin".into(),
        ));
    }

    let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed_len);
    Ok(line)
}
