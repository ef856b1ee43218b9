//! Record payload codec
//!
//! A record travels as one scalar RPC argument: the field map is serialized
//! to a compact JSON object and then percent-escaped.
//!
//! ```text
//! {"age":"42","name":"alice"}  ->  %7B%22age%22%3A%2242%22%2C%22name%22%3A%22alice%22%7D
//! ```
//!
//! Decoding only recovers the field *names*. Values come back as `None`;
//! readers get the shape of the stored record, not its content.

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{FractalError, Result};

/// A record as written by the workload driver: field name -> value
pub type Record = BTreeMap<String, String>;

/// A record as read back: field names with (intentionally) absent values
pub type PartialRecord = BTreeMap<String, Option<String>>;

/// Characters left unescaped, matching `application/x-www-form-urlencoded`
/// minus the `+` for space substitution
const PAYLOAD_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'*');

/// Serialize and escape a record into a transport-safe payload
pub fn encode(record: &Record) -> Result<String> {
    let json = serde_json::to_string(record)?;
    Ok(utf8_percent_encode(&json, PAYLOAD_ESCAPE).to_string())
}

/// Unescape and parse a payload, returning its field names
///
/// Every name maps to `None`. A literal `+` reads as a space, so payloads
/// written with form encoding decode to the same names; `encode` always
/// escapes `+` itself as `%2B`.
pub fn decode(payload: &str) -> Result<PartialRecord> {
    check_escapes(payload)?;

    let payload = payload.replace('+', " ");
    let json = percent_decode_str(&payload)
        .decode_utf8()
        .map_err(|e| FractalError::Decode(format!("payload is not valid UTF-8: {}", e)))?;

    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&json)
        .map_err(|e| FractalError::Decode(format!("payload is not a JSON object: {}", e)))?;

    Ok(object.into_iter().map(|(field, _)| (field, None)).collect())
}

/// Reject `%` not followed by two hex digits
///
/// `percent_decode_str` passes such sequences through untouched, which would
/// hide a truncated or corrupted payload.
fn check_escapes(payload: &str) -> Result<()> {
    let bytes = payload.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() >= i + 3
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(FractalError::Decode(format!(
                    "malformed escape sequence at offset {}",
                    i
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
