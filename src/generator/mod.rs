//! Random password generation.
//!
//! Passwords always contain letters; digits and ASCII punctuation are on
//! by default and can be switched off.  Every enabled character class is
//! represented at least once, the remaining characters are drawn from the
//! union of enabled classes, and the result is shuffled.

use rand::seq::{IndexedRandom, SliceRandom};
use zeroize::Zeroizing;

use crate::errors::{PassVaultError, Result};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Longest password `generate` will produce.
pub const MAX_LENGTH: usize = 1024;

/// Options for [`generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: 20,
            digits: true,
            symbols: true,
        }
    }
}

/// Generate a random password.  The result is wiped from memory on drop.
pub fn generate(options: &GeneratorOptions) -> Result<Zeroizing<String>> {
    let mut classes: Vec<&[u8]> = vec![LETTERS];
    if options.digits {
        classes.push(DIGITS);
    }
    if options.symbols {
        classes.push(SYMBOLS);
    }

    if options.length < classes.len() || options.length > MAX_LENGTH {
        return Err(PassVaultError::CommandFailed(format!(
            "password length must be between {} and {MAX_LENGTH}",
            classes.len()
        )));
    }

    let mut rng = rand::rng();
    let pool: Vec<u8> = classes.concat();
    let mut chars: Zeroizing<Vec<u8>> = Zeroizing::new(Vec::with_capacity(options.length));

    // One from each class, then fill from the whole pool.
    for class in &classes {
        if let Some(&c) = class.choose(&mut rng) {
            chars.push(c);
        }
    }
    while chars.len() < options.length {
        if let Some(&c) = pool.choose(&mut rng) {
            chars.push(c);
        }
    }
    chars.shuffle(&mut rng);

    // Every byte comes from an ASCII table.
    let password: String = chars.iter().map(|&b| char::from(b)).collect();
    Ok(Zeroizing::new(password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_requested_length() {
        for length in [3, 8, 20, 64] {
            let pw = generate(&GeneratorOptions {
                length,
                ..GeneratorOptions::default()
            })
            .unwrap();
            assert_eq!(pw.len(), length);
        }
    }

    #[test]
    fn includes_every_enabled_class() {
        let pw = generate(&GeneratorOptions::default()).unwrap();
        assert!(pw.bytes().any(|b| LETTERS.contains(&b)));
        assert!(pw.bytes().any(|b| DIGITS.contains(&b)));
        assert!(pw.bytes().any(|b| SYMBOLS.contains(&b)));
    }

    #[test]
    fn letters_only_when_classes_disabled() {
        let pw = generate(&GeneratorOptions {
            length: 50,
            digits: false,
            symbols: false,
        })
        .unwrap();
        assert!(pw.bytes().all(|b| LETTERS.contains(&b)));
    }

    #[test]
    fn no_symbols_when_disabled() {
        let pw = generate(&GeneratorOptions {
            length: 50,
            digits: true,
            symbols: false,
        })
        .unwrap();
        assert!(pw.bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn rejects_impossible_lengths() {
        let too_short = GeneratorOptions {
            length: 2,
            ..GeneratorOptions::default()
        };
        assert!(generate(&too_short).is_err());

        let too_long = GeneratorOptions {
            length: MAX_LENGTH + 1,
            ..GeneratorOptions::default()
        };
        assert!(generate(&too_long).is_err());
    }

    #[test]
    fn successive_passwords_differ() {
        let a = generate(&GeneratorOptions::default()).unwrap();
        let b = generate(&GeneratorOptions::default()).unwrap();
        assert_ne!(*a, *b);
    }
}
