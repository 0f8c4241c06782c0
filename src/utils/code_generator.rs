//! Short code generation and validation utilities.
//!
//! Codes are independent draws from a 62-character alphanumeric alphabet
//! using the operating system's cryptographically secure random source.

use thiserror::Error;

/// Characters allowed in generated and custom short codes.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated codes when none is configured.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Inclusive length bounds for custom codes.
pub const MIN_CUSTOM_CODE_LENGTH: usize = 3;
pub const MAX_CUSTOM_CODE_LENGTH: usize = 20;

/// Largest multiple of the alphabet size that fits in a byte.
/// Bytes at or above it are rejected so every character is equally likely.
const REJECTION_THRESHOLD: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// The random source could not produce bytes. Not retryable.
#[derive(Debug, Error)]
#[error("random source unavailable: {0}")]
pub struct GeneratorError(String);

/// Produces random short codes of a fixed length.
#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator {
    length: usize,
}

impl CodeGenerator {
    /// Creates a generator. A zero length falls back to [`DEFAULT_CODE_LENGTH`].
    pub fn new(length: usize) -> Self {
        let length = if length == 0 {
            DEFAULT_CODE_LENGTH
        } else {
            length
        };

        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Generates one candidate code.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the system random source fails.
    pub fn generate(&self) -> Result<String, GeneratorError> {
        generate_code(self.length)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

/// Generates a code of `length` characters drawn uniformly from [`ALPHABET`].
///
/// # Errors
///
/// Returns [`GeneratorError`] if the system random source fails.
pub fn generate_code(length: usize) -> Result<String, GeneratorError> {
    let mut code = String::with_capacity(length);
    let mut buffer = [0u8; 32];

    while code.len() < length {
        getrandom::fill(&mut buffer).map_err(|e| GeneratorError(e.to_string()))?;

        for &byte in buffer.iter().filter(|&&b| b < REJECTION_THRESHOLD) {
            if code.len() == length {
                break;
            }
            code.push(ALPHABET[usize::from(byte) % ALPHABET.len()] as char);
        }
    }

    Ok(code)
}

/// Returns true iff `code` is 3-20 characters long and uses only [`ALPHABET`].
///
/// Uniqueness is not checked here.
pub fn is_valid_custom_code(code: &str) -> bool {
    (MIN_CUSTOM_CODE_LENGTH..=MAX_CUSTOM_CODE_LENGTH).contains(&code.len())
        && code.bytes().all(|b| ALPHABET.contains(&b))
}
