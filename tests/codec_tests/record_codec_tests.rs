//! Record Codec Tests
//!
//! Payload escaping and the names-only decode.

use fractal_registry::codec::{decode, encode};
use fractal_registry::{ErrorKind, Record};

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(f, v)| (f.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_encode_single_field() {
    let payload = encode(&record(&[("name", "alice")])).unwrap();
    assert_eq!(payload, "%7B%22name%22%3A%22alice%22%7D");
}

#[test]
fn test_encode_escapes_reserved_characters() {
    let payload = encode(&record(&[("note", "a b&c=d/e?f%g+h")])).unwrap();

    for c in [' ', '&', '=', '/', '?', '+', '"', '{', '}', ':'] {
        assert!(!payload.contains(c), "unescaped {:?} in {}", c, payload);
    }
    // Every '%' starts an escape sequence
    assert!(payload
        .split('%')
        .skip(1)
        .all(|chunk| chunk.len() >= 2 && chunk[..2].chars().all(|c| c.is_ascii_hexdigit())));
}

#[test]
fn test_encode_empty_record() {
    assert_eq!(encode(&Record::new()).unwrap(), "%7B%7D");
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn test_decode_returns_names_without_values() {
    let original = record(&[("field0", "x"), ("field1", "yy"), ("field2", "zzz")]);
    let decoded = decode(&encode(&original).unwrap()).unwrap();

    assert_eq!(decoded.len(), 3);
    assert!(decoded.keys().eq(original.keys()));
    assert!(decoded.values().all(Option::is_none));
}

#[test]
fn test_decode_printable_and_unicode_fields() {
    let original = record(&[
        ("with space", "v 1"),
        ("quote\"d", "\"value\""),
        ("percent%", "100%"),
        ("ünïcödé", "値"),
        ("", "empty name"),
    ]);
    let decoded = decode(&encode(&original).unwrap()).unwrap();

    assert!(decoded.keys().eq(original.keys()));
    assert!(decoded.values().all(Option::is_none));
}

#[test]
fn test_decode_empty_object() {
    assert!(decode("%7B%7D").unwrap().is_empty());
}

#[test]
fn test_decode_ignores_value_types() {
    // {"a":1,"b":null,"c":[true]}
    let decoded = decode("%7B%22a%22%3A1%2C%22b%22%3Anull%2C%22c%22%3A%5Btrue%5D%7D").unwrap();
    assert_eq!(decoded.keys().map(String::as_str).collect::<Vec<_>>(), ["a", "b", "c"]);
}

#[test]
fn test_decode_rejects_non_object() {
    // [1,2]
    let err = decode("%5B1%2C2%5D").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);

    // "text"
    let err = decode("%22text%22").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn test_decode_rejects_garbage() {
    assert_eq!(decode("not json").unwrap_err().kind(), ErrorKind::Decode);
    assert_eq!(decode("").unwrap_err().kind(), ErrorKind::Decode);
}

#[test]
fn test_decode_rejects_truncated_escape() {
    let payload = encode(&record(&[("name", "alice")])).unwrap();
    let truncated = &payload[..payload.len() - 1];
    assert_eq!(decode(truncated).unwrap_err().kind(), ErrorKind::Decode);
}

#[test]
fn test_decode_rejects_invalid_utf8() {
    // {"\xff":"v"}
    let err = decode("%7B%22%FF%22%3A%22v%22%7D").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn test_decode_form_encoded_spaces() {
    // {"first name":"a b"} with spaces written as '+'
    let decoded = decode("%7B%22first+name%22%3A%22a+b%22%7D").unwrap();
    assert_eq!(decoded.keys().map(String::as_str).collect::<Vec<_>>(), ["first name"]);
}
