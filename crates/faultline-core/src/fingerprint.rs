//! Fingerprint generation for grouping events.
//!
//! A fingerprint is the hex-encoded SHA-256 of
//! `normalised_message:project_id:field_1:...:field_n`, where the trailing
//! fields are the payload's discriminator fields (file and line for errors,
//! level for logs). The field order and the delimiter are part of the stored
//! data: changing either re-partitions every existing group.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Separator placed between fingerprint components.
pub const DELIMITER: char = ':';

/// Replacement for every numeric or hexadecimal literal in a message.
pub const PLACEHOLDER: &str = "*";

// Hex literals are tried first so that `0x1F` collapses as one token instead
// of `0` followed by `x1F`.
static NUMERIC_LITERALS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"0[xX][0-9a-fA-F]+|[0-9]+").ok());

/// Collapses every run of decimal digits and every `0x…` literal into a
/// single [`PLACEHOLDER`].
///
/// `"user 42 not found"` and `"user 7 not found"` both normalise to
/// `"user * not found"`.
#[must_use]
pub fn normalise_message(message: &str) -> String {
    match NUMERIC_LITERALS.as_ref() {
        Some(pattern) => pattern.replace_all(message, PLACEHOLDER).into_owned(),
        None => message.to_owned(),
    }
}

/// Computes the grouping key for an event.
///
/// Pure and deterministic: the same `(message, project, fields)` tuple always
/// produces the same 64-character lowercase hex string.
#[must_use]
pub fn compute_fingerprint(message: &str, project_id: Uuid, fields: &[String]) -> String {
    let mut data = normalise_message(message);
    data.push(DELIMITER);
    data.push_str(&project_id.to_string());
    for field in fields {
        data.push(DELIMITER);
        data.push_str(field);
    }

    hex::encode(Sha256::digest(data.as_bytes()))
}
