//! Table-id URL obfuscation
//!
//! Table numbers ride in QR-code URLs as base64 of `tbl_{id}`, so the raw
//! number is not immediately visible. Decoding tolerates legacy plain
//! numbers and passes unrecognized input through unchanged.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

pub fn encode_table_id(table_id: &str) -> String {
    if table_id.is_empty() {
        return String::new();
    }
    STANDARD.encode(format!("tbl_{}", table_id))
}

pub fn decode_table_id(encoded: &str) -> String {
    if encoded.is_empty() {
        return String::new();
    }
    // Plain numbers are legacy links
    if encoded.bytes().all(|b| b.is_ascii_digit()) {
        return encoded.to_string();
    }
    let decoded = STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());
    match decoded {
        Some(text) => match text.strip_prefix("tbl_") {
            Some(id) => id.to_string(),
            None => encoded.to_string(),
        },
        None => encoded.to_string(),
    }
}
