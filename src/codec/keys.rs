//! Field name sanitization
//!
//! BSON keys are arbitrary strings, record field names are identifiers
//! matching `[A-Za-z][A-Za-z0-9_]*` of at most 63 characters. Decoding maps
//! every key of a document to such an identifier and keeps the names unique.
//! The object-id key `_id` maps to the reserved field `id_`, which the
//! encoder maps back.

use crate::error::{CodecError, Result};

/// Maximum length of a record field name
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// BSON key holding a document's object id
pub const OBJECT_ID_KEY: &str = "_id";

/// Record field that carries the object id
pub const OBJECT_ID_FIELD: &str = "id_";

const FILLER: char = 'x';

/// Convert raw document keys to unique record field names
///
/// # Arguments
/// * `names` - Raw keys in document order
///
/// # Returns
/// * `Result<Vec<String>>` - One identifier per key, in the same order, or
///   `KeyCollisionUnresolvable` when a duplicate cannot get a suffix within
///   the length limit
pub fn sanitize<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>> {
    let mut assigned: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let raw = name.as_ref();
        let unique = make_unique(identifier(raw), &assigned, raw)?;
        assigned.push(unique);
    }
    Ok(assigned)
}

/// Map one raw key to an identifier, ignoring collisions
fn identifier(raw: &str) -> String {
    if raw == OBJECT_ID_KEY {
        return OBJECT_ID_FIELD.to_string();
    }

    let mut chars = raw
        .chars()
        .skip_while(|c| !c.is_ascii_alphanumeric())
        .peekable();
    let mut out = String::with_capacity(raw.len().min(MAX_IDENTIFIER_LEN));
    if chars.peek().is_some_and(char::is_ascii_digit) {
        out.push(FILLER);
    }

    let mut in_separator = false;
    for c in chars {
        if out.len() >= MAX_IDENTIFIER_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_separator = false;
        } else if !in_separator {
            out.push('_');
            in_separator = true;
        }
    }

    if out.is_empty() {
        out.push(FILLER);
    }
    out
}

/// Append the smallest free numeric suffix to `base` if it is taken
fn make_unique(base: String, assigned: &[String], raw: &str) -> Result<String> {
    if !assigned.contains(&base) {
        return Ok(base);
    }

    let mut suffix = 0usize;
    loop {
        let digits = suffix.to_string();
        if base.len() + digits.len() > MAX_IDENTIFIER_LEN {
            return Err(CodecError::KeyCollisionUnresolvable(raw.to_string()).into());
        }
        let candidate = format!("{base}{digits}");
        if !assigned.contains(&candidate) {
            return Ok(candidate);
        }
        suffix += 1;
    }
}
