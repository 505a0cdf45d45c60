//! Append-only encrypted entry store.
//!
//! `VaultStore` owns nothing but the vault file path.  Every operation
//! opens the file, reads it fully or appends one line, and closes it
//! again; no handle outlives the call.
//!
//! Existing lines are never rewritten.  "Editing" an entry means adding
//! a new one with the same label; lookups by label take the most recent.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::crypto::encryption::{decrypt_with_aad, encrypt_with_aad};
use crate::crypto::keys::DataKey;
use crate::errors::{PassVaultError, Result};

use super::entry::{validate_label, DecryptedEntry, VaultEntry};
use super::restrict_permissions;

/// Handle on the vault file.
#[derive(Debug, Clone)]
pub struct VaultStore {
    path: PathBuf,
}

impl VaultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the vault file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Encrypt `secret` and append it as a new entry.
    ///
    /// The label is bound into the ciphertext as associated data, so an
    /// entry whose label is edited on disk no longer decrypts.
    pub fn add(&self, data_key: &DataKey, label: &str, secret: &str) -> Result<()> {
        validate_label(label)?;

        let entry = VaultEntry {
            label: label.to_string(),
            ciphertext: encrypt_with_aad(data_key.as_bytes(), secret.as_bytes(), label.as_bytes())?,
        };

        let is_new = !self.path.exists();
        if is_new {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        // A previous write cut short would leave no trailing newline;
        // start on a fresh line so only that fragment is malformed.
        let mut line = entry.to_line();
        if !is_new && !ends_with_newline(&self.path)? {
            line.insert(0, '\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if is_new {
            restrict_permissions(&self.path)?;
        }
        file.write_all(line.as_bytes())?;
        file.sync_data()?;

        debug!(label, path = %self.path.display(), "appended vault entry");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Read the vault file and return a lazy iterator over its entries.
    ///
    /// The file is read in full and closed before this returns; each item
    /// is decrypted only when the iterator reaches it.  A missing file
    /// yields no entries.  Call again to see entries appended since.
    pub fn list<'k>(&self, data_key: &'k DataKey) -> Result<Entries<'k>> {
        let lines = self.read_lines()?;
        debug!(count = lines.len(), path = %self.path.display(), "read vault file");
        Ok(Entries {
            lines: lines.into_iter(),
            data_key,
        })
    }

    /// Decrypt the most recent entry with `label`, if any.
    ///
    /// Only entries carrying that label are decrypted.  A malformed line
    /// anywhere after the match aborts the lookup, since it could have
    /// been a newer entry for the same label.
    pub fn latest(&self, data_key: &DataKey, label: &str) -> Result<Option<DecryptedEntry>> {
        validate_label(label)?;

        for (line_no, line) in self.read_lines()?.into_iter().rev() {
            let entry = VaultEntry::parse_line(&line?, line_no)?;
            if entry.label == label {
                return decrypt_entry(data_key, entry, line_no).map(Some);
            }
        }
        Ok(None)
    }

    /// All labels in file order, without decrypting anything.
    pub fn labels(&self) -> Result<Vec<String>> {
        self.read_lines()?
            .into_iter()
            .map(|(line_no, line)| {
                line.and_then(|line| VaultEntry::parse_line(&line, line_no))
                    .map(|e| e.label)
            })
            .collect()
    }

    /// Number of non-blank lines in the vault file.
    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.read_lines()?.len())
    }

    /// Read all non-blank lines with their 1-based line numbers.
    ///
    /// A line that is not valid UTF-8 is kept as a `MalformedRecord` in
    /// its position, so one damaged line never hides the others.
    fn read_lines(&self) -> Result<Vec<Line>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(contents
            .split(|&b| b == b'\n')
            .enumerate()
            .filter_map(|(idx, raw)| {
                let line_no = idx + 1;
                let raw = raw.strip_suffix(&[b'\r']).unwrap_or(raw);
                match std::str::from_utf8(raw) {
                    Ok(text) if text.trim().is_empty() => None,
                    Ok(text) => Some((line_no, Ok(text.to_string()))),
                    Err(_) => Some((
                        line_no,
                        Err(PassVaultError::malformed(line_no, "line is not valid UTF-8")),
                    )),
                }
            })
            .collect())
    }
}

/// One vault file line: its 1-based number and its text, or the reason
/// it could not be read as text.
type Line = (usize, Result<String>);

/// Lazy, finite iterator over decrypted entries in write order.
///
/// Each item is either the decrypted entry or the per-line failure
/// (`MalformedRecord` or `EntryAuthenticationFailed`); the caller decides
/// whether to stop or skip.
pub struct Entries<'k> {
    lines: std::vec::IntoIter<Line>,
    data_key: &'k DataKey,
}

impl Iterator for Entries<'_> {
    type Item = Result<DecryptedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line_no, line) = self.lines.next()?;
        Some(
            line.and_then(|line| VaultEntry::parse_line(&line, line_no))
                .and_then(|entry| decrypt_entry(self.data_key, entry, line_no)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

fn decrypt_entry(data_key: &DataKey, entry: VaultEntry, line_no: usize) -> Result<DecryptedEntry> {
    let plaintext =
        match decrypt_with_aad(data_key.as_bytes(), &entry.ciphertext, entry.label.as_bytes()) {
            Ok(plaintext) => plaintext,
            Err(_) => {
                warn!(line = line_no, label = %entry.label, "vault entry failed authentication");
                return Err(PassVaultError::EntryAuthenticationFailed {
                    line: line_no,
                    label: entry.label,
                });
            }
        };

    let secret = String::from_utf8(plaintext).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        PassVaultError::malformed(line_no, "secret is not valid UTF-8")
    })?;

    Ok(DecryptedEntry {
        label: entry.label,
        secret,
    })
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
