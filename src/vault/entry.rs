//! Vault entry types and the one-line-per-entry text encoding.
//!
//! Each line is `label|base64(nonce || ciphertext || tag)`.  The label is
//! plaintext and must not contain the delimiter or a line break.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroize;

use crate::errors::{PassVaultError, Result};

/// Separator between label and ciphertext.
pub const DELIMITER: char = '|';

/// Longest label accepted, in bytes.
const MAX_LABEL_LEN: usize = 256;

/// A single encrypted entry as stored in the vault file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    /// Account or site identifier (not secret).
    pub label: String,
    /// The secret, encrypted under the data key with the label as AAD.
    pub ciphertext: Vec<u8>,
}

impl VaultEntry {
    /// Encode as one line, including the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{}{DELIMITER}{}\n", self.label, BASE64.encode(&self.ciphertext))
    }

    /// Parse one line (without its newline).  `line_no` is 1-based and is
    /// only used for error reporting.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let parts: Vec<&str> = line.split(DELIMITER).collect();
        if parts.len() != 2 {
            return Err(PassVaultError::malformed(
                line_no,
                format!("expected 2 fields separated by '{DELIMITER}', found {}", parts.len()),
            ));
        }

        let label = parts[0];
        validate_label(label).map_err(|e| PassVaultError::malformed(line_no, e.to_string()))?;

        let ciphertext = BASE64
            .decode(parts[1].trim_end_matches('\r'))
            .map_err(|e| PassVaultError::malformed(line_no, format!("invalid base64: {e}")))?;

        Ok(Self {
            label: label.to_string(),
            ciphertext,
        })
    }
}

/// A decrypted entry: label and plaintext secret.
///
/// The secret is wiped from memory when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct DecryptedEntry {
    pub label: String,
    pub secret: String,
}

impl std::fmt::Debug for DecryptedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedEntry")
            .field("label", &self.label)
            .field("secret", &"***")
            .finish()
    }
}

/// Validate that a label can be stored unambiguously.
///
/// Must be non-empty, at most 256 bytes, and free of `|`, `\n` and `\r`.
pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(PassVaultError::InvalidLabel("label cannot be empty".into()));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(PassVaultError::InvalidLabel(format!(
            "label cannot exceed {MAX_LABEL_LEN} bytes"
        )));
    }
    if label.contains(|c: char| c == DELIMITER || c == '\n' || c == '\r') {
        return Err(PassVaultError::InvalidLabel(format!(
            "label '{}' contains '{DELIMITER}' or a line break",
            label.escape_debug()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_roundtrip() {
        let entry = VaultEntry {
            label: "github.com".into(),
            ciphertext: vec![0, 1, 2, 255, b'\n', b'|'],
        };
        let line = entry.to_line();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let parsed = VaultEntry::parse_line(line.trim_end_matches('\n'), 1).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn missing_delimiter_is_malformed() {
        let err = VaultEntry::parse_line("github.com", 3).unwrap_err();
        assert!(matches!(err, PassVaultError::MalformedRecord { line: 3, .. }));
    }

    #[test]
    fn extra_delimiter_is_malformed() {
        let err = VaultEntry::parse_line("a|b|c", 1).unwrap_err();
        assert!(matches!(err, PassVaultError::MalformedRecord { .. }));
    }

    #[test]
    fn bad_base64_is_malformed() {
        let err = VaultEntry::parse_line("site|not*base64", 2).unwrap_err();
        assert!(matches!(err, PassVaultError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn empty_label_in_file_is_malformed() {
        let err = VaultEntry::parse_line("|AAAA", 1).unwrap_err();
        assert!(matches!(err, PassVaultError::MalformedRecord { .. }));
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let entry = VaultEntry {
            label: "site".into(),
            ciphertext: vec![9; 30],
        };
        let line = entry.to_line().replace('\n', "\r");
        assert_eq!(VaultEntry::parse_line(&line, 1).unwrap(), entry);
    }

    #[test]
    fn label_validation() {
        assert!(validate_label("github.com").is_ok());
        assert!(validate_label("my bank (checking)").is_ok());
        assert!(validate_label("").is_err());
        assert!(validate_label("a|b").is_err());
        assert!(validate_label("a\nb").is_err());
        assert!(validate_label("a\rb").is_err());
        assert!(validate_label(&"x".repeat(257)).is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let entry = DecryptedEntry {
            label: "site".into(),
            secret: "hunter2".into(),
        };
        let shown = format!("{entry:?}");
        assert!(shown.contains("site"));
        assert!(!shown.contains("hunter2"));
    }
}
