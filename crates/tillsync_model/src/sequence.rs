//! Human-readable sequence codes for receipts and returns.
//!
//! A code is a fixed prefix followed by a zero-padded number, e.g. `RCP007`.
//! The next code is derived from the highest number visible locally, so two
//! devices creating records offline can still produce the same code.

use crate::error::{ModelError, ModelResult};

/// Minimum number of digits in a code.
const WIDTH: usize = 3;

/// Parses the numeric suffix of `code`, if it carries `prefix`.
pub fn parse_code(prefix: &str, code: &str) -> Option<u64> {
    let digits = code.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Returns the code following the highest one in `existing`.
///
/// Codes with another prefix or a non-numeric suffix are ignored.
///
/// # Errors
///
/// Returns [`ModelError::SequenceExhausted`] if the highest code is
/// `u64::MAX`.
pub fn next_code<'a>(
    prefix: &str,
    existing: impl IntoIterator<Item = &'a str>,
) -> ModelResult<String> {
    let max = existing
        .into_iter()
        .filter_map(|code| parse_code(prefix, code))
        .max()
        .unwrap_or(0);
    let next = max
        .checked_add(1)
        .ok_or_else(|| ModelError::SequenceExhausted {
            prefix: prefix.to_string(),
        })?;
    Ok(format!("{prefix}{next:0width$}", width = WIDTH))
}
