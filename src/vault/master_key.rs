//! Master-key record: creation, verification, re-wrapping and the
//! line-oriented key file format.
//!
//! A key file has exactly six lines, each `name SP value...`:
//!
//! ```text
//! passvault-key 1
//! created 2026-10-15T12:00:00Z
//! kdf argon2id 65536 3 4          (or: kdf pbkdf2-sha256 600000)
//! salt <base64>
//! verifier <base64>
//! wrapped-key <base64>
//! ```
//!
//! Binary fields are base64 so raw ciphertext can never contain the
//! line separator.  The wrapping key itself is never written; only the
//! salt and KDF parameters that regenerate it from the passphrase.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::kdf::{self, KdfParams, MIN_SALT_LEN};
use crate::crypto::keys::DataKey;
use crate::errors::{PassVaultError, Result};

use super::restrict_permissions;

/// First line of every key file.
const MAGIC: &str = "passvault-key";

/// Current key file format version.
pub const CURRENT_VERSION: u32 = 1;

/// Known plaintext sealed under the verifier key.
const VERIFIER_MARKER: &[u8] = b"passvault:verifier:v1";

/// The persisted master-key record.  One per vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterKeyRecord {
    /// When the record was created (or last re-wrapped).
    pub created_at: DateTime<Utc>,
    /// KDF algorithm and work factors used to derive the wrapping key.
    pub kdf: KdfParams,
    /// Random salt fed to the KDF.
    pub salt: Vec<u8>,
    /// `encrypt(verifier_key, VERIFIER_MARKER)`.
    pub verifier: Vec<u8>,
    /// `encrypt(wrap_key, data_key)`.
    pub wrapped_data_key: Vec<u8>,
}

impl MasterKeyRecord {
    // ------------------------------------------------------------------
    // Key management
    // ------------------------------------------------------------------

    /// Create a new record for `passphrase` together with a fresh data key.
    ///
    /// Fails only if the entropy source is unavailable or `params` are
    /// below the accepted minimums.
    pub fn create(passphrase: &[u8], params: &KdfParams) -> Result<(Self, DataKey)> {
        let data_key = DataKey::generate()?;
        let record = Self::seal(passphrase, params, &data_key)?;
        debug!(kdf = %params, "created master-key record");
        Ok((record, data_key))
    }

    /// Verify `passphrase` and return the unwrapped data key.
    ///
    /// The verifier is checked first; the wrapped data key is only
    /// touched once the passphrase has been proven correct.  A wrong
    /// passphrase is `PassphraseRejected`.
    pub fn unlock(&self, passphrase: &[u8]) -> Result<DataKey> {
        let wrapping_key = kdf::derive(passphrase, &self.salt, &self.kdf)?;

        let mut verifier_key = wrapping_key.verifier_key()?;
        let verified = decrypt(&verifier_key, &self.verifier);
        verifier_key.zeroize();

        let marker_ok = match verified {
            Ok(plaintext) => bool::from(plaintext.as_slice().ct_eq(VERIFIER_MARKER)),
            Err(_) => false,
        };
        if !marker_ok {
            warn!("passphrase verification failed");
            return Err(PassVaultError::PassphraseRejected);
        }

        // The passphrase is right, so a failure from here on means the
        // record itself was modified.
        let mut wrap_key = wrapping_key.wrap_key()?;
        let unwrapped = decrypt(&wrap_key, &self.wrapped_data_key);
        wrap_key.zeroize();
        let mut dek_bytes = unwrapped?;

        let data_key = DataKey::from_slice(&dek_bytes);
        dek_bytes.zeroize();
        let data_key = data_key.ok_or_else(|| {
            PassVaultError::malformed(6, "wrapped data key has the wrong length")
        })?;

        debug!("master-key record unlocked");
        Ok(data_key)
    }

    /// Re-wrap the same data key under a new passphrase.
    ///
    /// Generates a new salt and uses `params` for the new record, so vault
    /// entries stay readable without being rewritten.
    pub fn rewrap(
        &self,
        old_passphrase: &[u8],
        new_passphrase: &[u8],
        params: &KdfParams,
    ) -> Result<Self> {
        let data_key = self.unlock(old_passphrase)?;
        let record = Self::seal(new_passphrase, params, &data_key)?;
        debug!(kdf = %params, "re-wrapped data key under new passphrase");
        Ok(record)
    }

    /// Build a record that wraps an existing `data_key` under `passphrase`.
    pub fn seal(passphrase: &[u8], params: &KdfParams, data_key: &DataKey) -> Result<Self> {
        let salt = kdf::generate_salt()?;
        let wrapping_key = kdf::derive(passphrase, &salt, params)?;

        let mut verifier_key = wrapping_key.verifier_key()?;
        let verifier = encrypt(&verifier_key, VERIFIER_MARKER);
        verifier_key.zeroize();

        let mut wrap_key = wrapping_key.wrap_key()?;
        let wrapped_data_key = encrypt(&wrap_key, data_key.as_bytes());
        wrap_key.zeroize();

        Ok(Self {
            created_at: Utc::now().trunc_subsecs(0),
            kdf: *params,
            salt: salt.to_vec(),
            verifier: verifier?,
            wrapped_data_key: wrapped_data_key?,
        })
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Read and parse a key file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PassVaultError::KeyFileNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Write the record to a new file.  Refuses to overwrite an existing one.
    pub fn save_new(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(PassVaultError::KeyFileExists(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        restrict_permissions(path)?;
        file.write_all(self.encode().as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Replace an existing key file **atomically**.
    ///
    /// Writes a temp file next to the target, then renames it over the
    /// target so readers never see a half-written record.
    pub fn replace(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or(Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));

        let result = write_synced(&tmp_path, self.encode().as_bytes())
            .and_then(|()| fs::rename(&tmp_path, path).map_err(PassVaultError::from));
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    // ------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------

    /// Serialize to the six-line key file format.
    pub fn encode(&self) -> String {
        let kdf_line = match self.kdf {
            KdfParams::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => format!("kdf argon2id {memory_kib} {iterations} {parallelism}"),
            KdfParams::Pbkdf2Sha256 { iterations } => format!("kdf pbkdf2-sha256 {iterations}"),
        };

        format!(
            "{MAGIC} {CURRENT_VERSION}\ncreated {}\n{kdf_line}\nsalt {}\nverifier {}\nwrapped-key {}\n",
            self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            BASE64.encode(&self.salt),
            BASE64.encode(&self.verifier),
            BASE64.encode(&self.wrapped_data_key),
        )
    }

    /// Parse the six-line key file format, checking every field count.
    pub fn parse(contents: &str) -> Result<Self> {
        let lines: Vec<&str> = contents.lines().collect();
        if lines.len() != 6 {
            let line = if lines.len() < 6 { lines.len() + 1 } else { 7 };
            return Err(PassVaultError::malformed(
                line,
                format!("key file must have 6 lines, found {}", lines.len()),
            ));
        }

        let header = fields(lines[0], 1, MAGIC, 1)?;
        let version: u32 = parse_number(header[0], 1, "version")?;
        if version != CURRENT_VERSION {
            return Err(PassVaultError::malformed(
                1,
                format!("unsupported key file version {version}, expected {CURRENT_VERSION}"),
            ));
        }

        let created = fields(lines[1], 2, "created", 1)?;
        let created_at = DateTime::parse_from_rfc3339(created[0])
            .map_err(|e| PassVaultError::malformed(2, format!("bad timestamp: {e}")))?
            .with_timezone(&Utc);

        let kdf = parse_kdf_line(lines[2])?;

        let salt = decode_b64(fields(lines[3], 4, "salt", 1)?[0], 4)?;
        if salt.len() < MIN_SALT_LEN {
            return Err(PassVaultError::malformed(
                4,
                format!("salt must be at least {MIN_SALT_LEN} bytes"),
            ));
        }
        let verifier = decode_b64(fields(lines[4], 5, "verifier", 1)?[0], 5)?;
        let wrapped_data_key = decode_b64(fields(lines[5], 6, "wrapped-key", 1)?[0], 6)?;

        Ok(Self {
            created_at,
            kdf,
            salt,
            verifier,
            wrapped_data_key,
        })
    }
}

/// Create or truncate `path` with owner-only permissions, write
/// `contents` and flush them to disk.
fn write_synced(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    restrict_permissions(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

/// Split `line` into its name and exactly `count` values.
fn fields<'a>(line: &'a str, line_no: usize, name: &str, count: usize) -> Result<Vec<&'a str>> {
    let mut parts = line.split(' ');
    match parts.next() {
        Some(found) if found == name => {}
        Some(found) => {
            return Err(PassVaultError::malformed(
                line_no,
                format!("expected field '{name}', found '{found}'"),
            ));
        }
        None => return Err(PassVaultError::malformed(line_no, "empty line")),
    }

    let values: Vec<&str> = parts.collect();
    if values.len() != count || values.iter().any(|v| v.is_empty()) {
        return Err(PassVaultError::malformed(
            line_no,
            format!("field '{name}' expects {count} value(s), found {}", values.len()),
        ));
    }
    Ok(values)
}

fn parse_kdf_line(line: &str) -> Result<KdfParams> {
    const LINE: usize = 3;
    let algorithm = line.split(' ').nth(1).unwrap_or_default();
    let params = match algorithm {
        "argon2id" => {
            let v = fields(line, LINE, "kdf", 4)?;
            KdfParams::Argon2id {
                memory_kib: parse_number(v[1], LINE, "memory_kib")?,
                iterations: parse_number(v[2], LINE, "iterations")?,
                parallelism: parse_number(v[3], LINE, "parallelism")?,
            }
        }
        "pbkdf2-sha256" => {
            let v = fields(line, LINE, "kdf", 2)?;
            KdfParams::Pbkdf2Sha256 {
                iterations: parse_number(v[1], LINE, "iterations")?,
            }
        }
        other => {
            return Err(PassVaultError::malformed(
                LINE,
                format!("unknown KDF '{other}'"),
            ));
        }
    };

    // Checked here so a tampered record never reaches the KDF.
    params.validate().map_err(|e| match e {
        PassVaultError::KeyDerivationFailed(reason) => PassVaultError::malformed(LINE, reason),
        other => other,
    })?;
    Ok(params)
}

fn parse_number(value: &str, line_no: usize, what: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| PassVaultError::malformed(line_no, format!("{what} is not a number: '{value}'")))
}

fn decode_b64(value: &str, line_no: usize) -> Result<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|e| PassVaultError::malformed(line_no, format!("invalid base64: {e}")))
}
