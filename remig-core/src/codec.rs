//! In-memory rendition of the repair transform.
//!
//! Mirrors PostgreSQL's `encode(bytes, 'escape')` and `decode(text, 'hex')`
//! byte for byte, so the effect of a repair statement can be computed
//! without a server.

use crate::error::HexDecodeError;

/// `encode(bytes, 'escape')`.
///
/// NUL and high-bit bytes become three-digit octal escapes, a backslash is
/// doubled, every other byte is copied unchanged.
pub fn escape_encode(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if b == 0 || b >= 0x80 {
            out.push(b'\\');
            out.push(b'0' + ((b >> 6) & 0o7));
            out.push(b'0' + ((b >> 3) & 0o7));
            out.push(b'0' + (b & 0o7));
        } else if b == b'\\' {
            out.extend_from_slice(b"\\\\");
        } else {
            out.push(b);
        }
    }
    out
}

/// `decode(text, 'hex')`.
///
/// Whitespace between digit pairs is skipped; a pair itself may not be
/// split.
pub fn hex_decode(text: &[u8]) -> Result<Vec<u8>, HexDecodeError> {
    let mut out = Vec::with_capacity(text.len() / 2);
    let mut i = 0;

    while i < text.len() {
        let c = text[i];
        if matches!(c, b' ' | b'\n' | b'\t' | b'\r') {
            i += 1;
            continue;
        }

        let hi = nibble(c, i)?;
        i += 1;
        let Some(&next) = text.get(i) else {
            return Err(HexDecodeError::OddNumberOfDigits);
        };
        let lo = nibble(next, i)?;
        i += 1;

        out.push((hi << 4) | lo);
    }

    Ok(out)
}

/// `DECODE(ENCODE(value, 'escape'), 'hex')` for one column value.
pub fn repair_value(value: Option<&[u8]>) -> Result<Option<Vec<u8>>, HexDecodeError> {
    match value {
        None => Ok(None),
        Some(bytes) => hex_decode(&escape_encode(bytes)).map(Some),
    }
}

fn nibble(c: u8, offset: usize) -> Result<u8, HexDecodeError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(HexDecodeError::InvalidDigit {
            found: c as char,
            offset,
        }),
    }
}
