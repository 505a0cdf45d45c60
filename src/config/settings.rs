use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::KdfParams;
use crate::errors::{PassVaultError, Result};

/// Project-level configuration, loaded from `.passvault.toml`.
///
/// Every field has a sensible default so PassVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path of the master-key file (relative paths resolve against the
    /// project directory).
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Path of the vault entries file.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// KDF used when a new key file is created: "argon2id" or "pbkdf2-sha256".
    #[serde(default = "default_kdf")]
    pub kdf: String,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// PBKDF2-HMAC-SHA256 iteration count (default: 600 000).
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Wrong passphrases allowed per run before access is denied.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Length of generated passwords.
    #[serde(default = "default_generator_length")]
    pub generator_length: usize,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_key_file() -> String {
    "passvault.key".to_string()
}

fn default_vault_file() -> String {
    "passvault.db".to_string()
}

fn default_kdf() -> String {
    "argon2id".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_pbkdf2_iterations() -> u32 {
    crate::crypto::kdf::DEFAULT_PBKDF2_ITERATIONS
}

fn default_max_attempts() -> u32 {
    3
}

fn default_generator_length() -> usize {
    20
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
            vault_file: default_vault_file(),
            kdf: default_kdf(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            max_attempts: default_max_attempts(),
            generator_length: default_generator_length(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".passvault.toml";

    /// Load settings from `<project_dir>/.passvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            PassVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        // Catch a typo'd KDF name or out-of-range work factor at load time
        // rather than at first use.
        settings.kdf_params()?.validate().map_err(|e| {
            PassVaultError::ConfigError(format!("{}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Resolve the key file path against `project_dir`.
    pub fn key_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.key_file)
    }

    /// Resolve the vault file path against `project_dir`.
    pub fn vault_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_file)
    }

    /// Convert the KDF settings into crypto-layer params.
    pub fn kdf_params(&self) -> Result<KdfParams> {
        match self.kdf.as_str() {
            "argon2id" => Ok(KdfParams::Argon2id {
                memory_kib: self.argon2_memory_kib,
                iterations: self.argon2_iterations,
                parallelism: self.argon2_parallelism,
            }),
            "pbkdf2-sha256" => Ok(KdfParams::Pbkdf2Sha256 {
                iterations: self.pbkdf2_iterations,
            }),
            other => Err(PassVaultError::ConfigError(format!(
                "unknown kdf '{other}' — supported: argon2id, pbkdf2-sha256"
            ))),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.key_file, "passvault.key");
        assert_eq!(s.vault_file, "passvault.db");
        assert_eq!(s.kdf, "argon2id");
        assert_eq!(s.argon2_memory_kib, 65_536);
        assert_eq!(s.pbkdf2_iterations, 600_000);
        assert_eq!(s.max_attempts, 3);
        assert_eq!(s.kdf_params().unwrap(), KdfParams::default());
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.key_file, "passvault.key");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
key_file = "secrets/master.key"
vault_file = "secrets/entries.db"
kdf = "pbkdf2-sha256"
pbkdf2_iterations = 700000
max_attempts = 1
generator_length = 32
"#;
        fs::write(tmp.path().join(".passvault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.key_file, "secrets/master.key");
        assert_eq!(settings.max_attempts, 1);
        assert_eq!(settings.generator_length, 32);
        assert_eq!(
            settings.kdf_params().unwrap(),
            KdfParams::Pbkdf2Sha256 {
                iterations: 700_000
            }
        );
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passvault.toml"), "max_attempts = 5\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.vault_file, "passvault.db");
        assert_eq!(settings.argon2_iterations, 3);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passvault.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_errors_on_unknown_kdf() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passvault.toml"), "kdf = \"md5\"\n").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(PassVaultError::ConfigError(_))
        ));
    }

    #[test]
    fn load_errors_on_out_of_range_work_factor() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".passvault.toml"),
            "argon2_memory_kib = 1024\n",
        )
        .unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(PassVaultError::ConfigError(_))
        ));
    }

    #[test]
    fn paths_resolve_against_project_dir() {
        let s = Settings::default();
        let project = Path::new("/home/user/project");
        assert_eq!(
            s.key_path(project),
            PathBuf::from("/home/user/project/passvault.key")
        );
        assert_eq!(
            s.vault_path(project),
            PathBuf::from("/home/user/project/passvault.db")
        );
    }

    #[test]
    fn absolute_paths_are_kept() {
        let s = Settings {
            key_file: "/var/lib/passvault/master.key".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            s.key_path(Path::new("/home/user/project")),
            PathBuf::from("/var/lib/passvault/master.key")
        );
    }
}
