//! Integration tests for the PassVault vault module.

use std::fs;
use std::path::PathBuf;

use passvault::crypto::KdfParams;
use passvault::errors::PassVaultError;
use passvault::vault::{AuthenticationGate, DecryptedEntry, GateState, MasterKeyRecord, Session};
use tempfile::TempDir;

/// Helper: key file and vault file paths inside a fresh temp dir.
fn vault_paths() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let key = dir.path().join("test.key");
    let vault = dir.path().join("test.db");
    (dir, key, vault)
}

/// Helper: a gate with cheap Argon2id params.
fn gate(key: &PathBuf, vault: &PathBuf, max_attempts: u32) -> AuthenticationGate {
    let kdf = KdfParams::Argon2id {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    };
    AuthenticationGate::new(key, vault, kdf, max_attempts)
}

fn pair(label: &str, secret: &str) -> DecryptedEntry {
    DecryptedEntry {
        label: label.to_string(),
        secret: secret.to_string(),
    }
}

fn collect(session: &Session) -> Vec<DecryptedEntry> {
    session
        .list_entries()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// ---------------------------------------------------------------------------
// First run and unlock
// ---------------------------------------------------------------------------

#[test]
fn entry_added_after_create_is_readable_after_fresh_unlock() {
    let (_dir, key, vault) = vault_paths();

    {
        let mut first = gate(&key, &vault, 3);
        let session = first.bootstrap_or_unlock("hunter2").unwrap();
        session.add_entry("github.com", "s3cret").unwrap();
    }

    let mut second = gate(&key, &vault, 3);
    assert!(matches!(second.state(), GateState::Locked { attempts_left: 3 }));

    let session = second.bootstrap_or_unlock("hunter2").unwrap();
    assert_eq!(second.state(), GateState::Unlocked);
    assert_eq!(collect(&session), vec![pair("github.com", "s3cret")]);
}

#[test]
fn wrong_passphrase_yields_no_session() {
    let (_dir, key, vault) = vault_paths();

    {
        let mut first = gate(&key, &vault, 3);
        let session = first.bootstrap_or_unlock("hunter2").unwrap();
        session.add_entry("github.com", "s3cret").unwrap();
    }

    let mut second = gate(&key, &vault, 3);
    let result = second.bootstrap_or_unlock("wrong");
    assert!(matches!(
        result,
        Err(PassVaultError::WrongPassphrase { attempts_left: 2 })
    ));
    assert!(matches!(second.state(), GateState::Locked { attempts_left: 2 }));
}

#[test]
fn first_run_creates_key_file_but_no_vault_file() {
    let (_dir, key, vault) = vault_paths();
    let mut g = gate(&key, &vault, 3);
    assert_eq!(g.state(), GateState::NoVault);

    let session = g.bootstrap_or_unlock("hunter2").unwrap();

    assert!(key.exists());
    assert!(!vault.exists(), "vault file is created on first add");
    assert!(collect(&session).is_empty());
}

#[test]
fn bootstrap_refuses_to_overwrite_existing_key_file() {
    let (_dir, key, vault) = vault_paths();
    gate(&key, &vault, 3).bootstrap("hunter2").unwrap();
    let before = fs::read_to_string(&key).unwrap();

    let result = gate(&key, &vault, 3).bootstrap("another");
    assert!(matches!(result, Err(PassVaultError::KeyFileExists(_))));
    assert_eq!(fs::read_to_string(&key).unwrap(), before);
}

#[test]
fn unlock_without_key_file_fails() {
    let (_dir, key, vault) = vault_paths();
    let result = gate(&key, &vault, 3).unlock("hunter2");
    assert!(matches!(result, Err(PassVaultError::KeyFileNotFound(_))));
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[test]
fn attempts_run_out_then_access_is_denied() {
    let (_dir, key, vault) = vault_paths();
    gate(&key, &vault, 3).bootstrap("hunter2").unwrap();

    let mut g = gate(&key, &vault, 3);
    assert!(matches!(
        g.unlock("nope"),
        Err(PassVaultError::WrongPassphrase { attempts_left: 2 })
    ));
    assert!(matches!(
        g.unlock("nope"),
        Err(PassVaultError::WrongPassphrase { attempts_left: 1 })
    ));
    assert!(matches!(g.unlock("nope"), Err(PassVaultError::AccessDenied)));
    assert_eq!(g.state(), GateState::Denied);

    // Even the right passphrase is refused once denied.
    assert!(matches!(
        g.bootstrap_or_unlock("hunter2"),
        Err(PassVaultError::AccessDenied)
    ));
}

#[test]
fn single_attempt_denies_on_first_failure() {
    let (_dir, key, vault) = vault_paths();
    gate(&key, &vault, 1).bootstrap("hunter2").unwrap();

    let mut g = gate(&key, &vault, 1);
    assert!(matches!(g.unlock("wrong"), Err(PassVaultError::AccessDenied)));
    assert_eq!(g.state(), GateState::Denied);
}

#[test]
fn zero_max_attempts_is_treated_as_one() {
    let (_dir, key, vault) = vault_paths();
    gate(&key, &vault, 1).bootstrap("hunter2").unwrap();

    let g = gate(&key, &vault, 0);
    assert!(matches!(g.state(), GateState::Locked { attempts_left: 1 }));
}

#[test]
fn success_after_a_wrong_attempt() {
    let (_dir, key, vault) = vault_paths();
    gate(&key, &vault, 3).bootstrap("hunter2").unwrap();

    let mut g = gate(&key, &vault, 3);
    assert!(g.unlock("wrong").is_err());
    assert!(g.unlock("hunter2").is_ok());
    assert_eq!(g.state(), GateState::Unlocked);
}

// ---------------------------------------------------------------------------
// Adding and listing entries
// ---------------------------------------------------------------------------

#[test]
fn add_then_list_yields_exactly_that_pair() {
    let (_dir, key, vault) = vault_paths();
    let session = gate(&key, &vault, 3).bootstrap_or_unlock("hunter2").unwrap();

    session.add_entry("github.com", "s3cret").unwrap();

    assert_eq!(collect(&session), vec![pair("github.com", "s3cret")]);
}

#[test]
fn same_label_twice_keeps_both_in_append_order() {
    let (_dir, key, vault) = vault_paths();
    let session = gate(&key, &vault, 3).bootstrap_or_unlock("hunter2").unwrap();

    session.add_entry("github.com", "first").unwrap();
    session.add_entry("github.com", "second").unwrap();

    assert_eq!(
        collect(&session),
        vec![pair("github.com", "first"), pair("github.com", "second")]
    );
    assert_eq!(
        session.get_entry("github.com").unwrap(),
        Some(pair("github.com", "second"))
    );
}

#[test]
fn listing_twice_gives_identical_results() {
    let (_dir, key, vault) = vault_paths();
    let session = gate(&key, &vault, 3).bootstrap_or_unlock("hunter2").unwrap();
    session.add_entry("a", "1").unwrap();
    session.add_entry("b", "2").unwrap();

    assert_eq!(collect(&session), collect(&session));
}

#[test]
fn get_entry_for_unknown_label_is_none() {
    let (_dir, key, vault) = vault_paths();
    let session = gate(&key, &vault, 3).bootstrap_or_unlock("hunter2").unwrap();
    session.add_entry("a", "1").unwrap();

    assert_eq!(session.get_entry("b").unwrap(), None);
}

#[test]
fn label_with_delimiter_is_rejected() {
    let (_dir, key, vault) = vault_paths();
    let session = gate(&key, &vault, 3).bootstrap_or_unlock("hunter2").unwrap();

    let result = session.add_entry("a|b", "pw");
    assert!(matches!(result, Err(PassVaultError::InvalidLabel(_))));
    assert!(!vault.exists());
}

#[test]
fn secrets_are_not_stored_in_plaintext() {
    let (_dir, key, vault) = vault_paths();
    let session = gate(&key, &vault, 3).bootstrap_or_unlock("hunter2").unwrap();
    session.add_entry("github.com", "very-recognisable-secret").unwrap();

    let raw = fs::read_to_string(&vault).unwrap();
    assert!(raw.starts_with("github.com|"));
    assert!(!raw.contains("very-recognisable-secret"));
    assert!(!fs::read_to_string(&key).unwrap().contains("hunter2"));
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn tampered_entry_fails_authentication_without_hiding_others() {
    let (_dir, key, vault) = vault_paths();
    let session = gate(&key, &vault, 3).bootstrap_or_unlock("hunter2").unwrap();
    session.add_entry("a", "1").unwrap();
    session.add_entry("b", "2").unwrap();

    // Swap the labels so each ciphertext is presented under the wrong label.
    let raw = fs::read_to_string(&vault).unwrap();
    let lines: Vec<&str> = raw.lines().collect();
    let (_, ct_a) = lines[0].split_once('|').unwrap();
    let (_, ct_b) = lines[1].split_once('|').unwrap();
    fs::write(&vault, format!("a|{ct_b}\nb|{ct_a}\n")).unwrap();

    let results: Vec<_> = session.list_entries().unwrap().collect();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0],
        Err(PassVaultError::EntryAuthenticationFailed { line: 1, .. })
    ));
    assert!(matches!(
        results[1],
        Err(PassVaultError::EntryAuthenticationFailed { line: 2, .. })
    ));
}

#[test]
fn malformed_line_is_reported_distinctly() {
    let (_dir, key, vault) = vault_paths();
    let session = gate(&key, &vault, 3).bootstrap_or_unlock("hunter2").unwrap();
    session.add_entry("a", "1").unwrap();
    fs::OpenOptions::new()
        .append(true)
        .open(&vault)
        .and_then(|mut f| std::io::Write::write_all(&mut f, b"no-delimiter-here\n"))
        .unwrap();

    let results: Vec<_> = session.list_entries().unwrap().collect();
    assert_eq!(results[0].as_ref().unwrap(), &pair("a", "1"));
    assert!(matches!(
        results[1],
        Err(PassVaultError::MalformedRecord { line: 2, .. })
    ));
}

#[test]
fn invalid_utf8_line_does_not_hide_other_entries() {
    let (_dir, key, vault) = vault_paths();
    let session = gate(&key, &vault, 3).bootstrap_or_unlock("hunter2").unwrap();
    session.add_entry("a", "1").unwrap();
    session.add_entry("b", "2").unwrap();

    // Corrupt the first byte of the second line's label.
    let mut bytes = fs::read(&vault).unwrap();
    let second_line = bytes.iter().position(|&b| b == b'\n').unwrap() + 1;
    bytes[second_line] = 0xFF;
    fs::write(&vault, bytes).unwrap();

    let results: Vec<_> = session.list_entries().unwrap().collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), &pair("a", "1"));
    assert!(matches!(
        results[1],
        Err(PassVaultError::MalformedRecord { line: 2, .. })
    ));
}

#[test]
fn corrupted_key_file_is_malformed_not_wrong_passphrase() {
    let (_dir, key, vault) = vault_paths();
    gate(&key, &vault, 3).bootstrap("hunter2").unwrap();
    fs::write(&key, "passvault-key 1\ngarbage\n").unwrap();

    let result = gate(&key, &vault, 3).unlock("hunter2");
    assert!(matches!(result, Err(PassVaultError::MalformedRecord { .. })));
}

// ---------------------------------------------------------------------------
// Passphrase change
// ---------------------------------------------------------------------------

#[test]
fn change_passphrase_keeps_entries_readable() {
    let (_dir, key, vault) = vault_paths();
    {
        let session = gate(&key, &vault, 3).bootstrap("hunter2").unwrap();
        session.add_entry("github.com", "s3cret").unwrap();
    }
    let vault_before = fs::read(&vault).unwrap();

    gate(&key, &vault, 3)
        .change_passphrase("hunter2", "correct horse")
        .unwrap();

    assert_eq!(fs::read(&vault).unwrap(), vault_before, "entries untouched");

    let mut g = gate(&key, &vault, 3);
    assert!(matches!(
        g.unlock("hunter2"),
        Err(PassVaultError::WrongPassphrase { .. })
    ));
    let session = g.unlock("correct horse").unwrap();
    assert_eq!(collect(&session), vec![pair("github.com", "s3cret")]);
}

#[test]
fn change_passphrase_with_wrong_old_passphrase_changes_nothing() {
    let (_dir, key, vault) = vault_paths();
    gate(&key, &vault, 3).bootstrap("hunter2").unwrap();
    let before = fs::read_to_string(&key).unwrap();

    let result = gate(&key, &vault, 3).change_passphrase("wrong", "correct horse");
    assert!(matches!(
        result,
        Err(PassVaultError::WrongPassphrase { .. })
    ));
    assert_eq!(fs::read_to_string(&key).unwrap(), before);
}

#[test]
fn key_file_records_kdf_used_at_creation() {
    let (_dir, key, vault) = vault_paths();
    gate(&key, &vault, 3).bootstrap("hunter2").unwrap();

    let record = MasterKeyRecord::load(&key).unwrap();
    assert_eq!(
        record.kdf,
        KdfParams::Argon2id {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    );
}
