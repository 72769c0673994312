//! Percent encoding for text bodies
//!
//! Matches JavaScript's `encodeURI`: ASCII letters and digits, space and
//! `-_.!~*'();/?:@&=+$,#` are written as is, every other char as uppercase
//! `%XX` escapes of its UTF-8 bytes. Decoding only undoes `%XX` escapes, so a
//! literal `+` stays a `+`.

use super::DecodeError;

const UNRESERVED: &[u8] = b" -_.!~*'();/?:@&=+$,#";
const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode a char span
///
/// # Example
/// ```
/// use textdelta::protocol::uri::encode;
///
/// let text: Vec<char> = "a%b\n\u{e9}".chars().collect();
/// assert_eq!(encode(&text), "a%25b%0A%C3%A9");
/// ```
pub fn encode(text: &[char]) -> String {
    let mut encoded = String::with_capacity(text.len());
    let mut buf = [0u8; 4];

    for &c in text {
        if c.is_ascii_alphanumeric() || (c.is_ascii() && UNRESERVED.contains(&(c as u8))) {
            encoded.push(c);
            continue;
        }
        for &byte in c.encode_utf8(&mut buf).as_bytes() {
            encoded.push('%');
            encoded.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
            encoded.push(HEX_DIGITS[usize::from(byte & 0x0f)] as char);
        }
    }

    encoded
}

/// Undo `%XX` escapes
///
/// # Errors
/// [`DecodeError::InvalidEscape`] for a `%` without two hex digits after it,
/// [`DecodeError::InvalidUtf8`] when the escaped bytes are not UTF-8.
pub fn decode(input: &str) -> Result<String, DecodeError> {
    if !input.contains('%') {
        return Ok(input.to_string());
    }

    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] != b'%' {
            decoded.push(bytes[index]);
            index += 1;
            continue;
        }

        let escape = bytes
            .get(index + 1)
            .and_then(|&hi| hex_value(hi))
            .zip(bytes.get(index + 2).and_then(|&lo| hex_value(lo)));
        let Some((hi, lo)) = escape else {
            return Err(DecodeError::InvalidEscape {
                input: input.to_string(),
                offset: index,
            });
        };
        decoded.push((hi << 4) | lo);
        index += 3;
    }

    String::from_utf8(decoded).map_err(|_| DecodeError::InvalidUtf8 {
        input: input.to_string(),
    })
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
