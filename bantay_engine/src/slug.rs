//! Canonical codec between entity names and URL path segments.
//!
//! Every page that links to an entity detail route and every page that resolves one goes
//! through [`encode`] and [`decode`]. The only information dropped is letter case; the
//! search service compares filter values case-insensitively, so a decoded slug resolves
//! to the same entity as the original name.
//!
//! The escaping matches `encodeURIComponent`: bytes outside the unreserved set
//! `A-Z a-z 0-9 - _ . ! ~ * ' ( )` become `%XX` with uppercase hex digits.

use log::debug;
use thiserror::Error;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Reasons a path segment cannot be percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("percent-escape at byte {0} is cut short")]
    TruncatedEscape(usize),
    #[error("invalid percent-escape '%{escape}' at byte {offset}")]
    InvalidEscape { offset: usize, escape: String },
    #[error("escaped bytes do not form valid UTF-8")]
    InvalidUtf8,
}

/// Bytes that pass through the encoder untouched.
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Turn an entity name into the path segment used in its detail route.
///
/// ```
/// use bantay_engine::slug::encode;
///
/// assert_eq!(encode("ABC Office Supplies Corp."), "abc%20office%20supplies%20corp.");
/// ```
pub fn encode(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    for byte in lowered.bytes() {
        if is_unreserved(byte) {
            slug.push(char::from(byte));
        } else {
            slug.push('%');
            slug.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
            slug.push(char::from(HEX_DIGITS[usize::from(byte & 0x0F)]));
        }
    }
    slug
}

/// Reverse [`encode`], reporting malformed escapes instead of guessing.
///
/// # Errors
/// Fails on a `%` not followed by two hex digits, or on escapes that decode to invalid UTF-8.
pub fn try_decode(slug: &str) -> Result<String, SlugError> {
    let bytes = slug.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'%' {
            decoded.push(bytes[pos]);
            pos += 1;
            continue;
        }
        let (Some(&high), Some(&low)) = (bytes.get(pos + 1), bytes.get(pos + 2)) else {
            return Err(SlugError::TruncatedEscape(pos));
        };
        match (hex_value(high), hex_value(low)) {
            (Some(high), Some(low)) => decoded.push((high << 4) | low),
            _ => {
                return Err(SlugError::InvalidEscape {
                    offset: pos,
                    escape: String::from_utf8_lossy(&bytes[pos + 1..pos + 3]).into_owned(),
                });
            },
        }
        pos += 3;
    }

    String::from_utf8(decoded).map_err(|_| SlugError::InvalidUtf8)
}

/// Turn a detail-route path segment back into a name for lookup.
///
/// Malformed input never fails: the raw segment is returned unchanged, so the caller's
/// search simply finds nothing.
pub fn decode(slug: &str) -> String {
    match try_decode(slug) {
        Ok(name) => name,
        Err(e) => {
            debug!("using raw path segment '{slug}' as lookup name: {e}");
            slug.to_string()
        },
    }
}

/// Whether `segment` can be placed in a URL path without further escaping.
///
/// Rejects whitespace, control characters, `/`, `?`, `#`, and any `%` that does not begin a
/// two-digit hex escape.
pub fn is_url_safe(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.iter().enumerate().all(|(pos, &byte)| match byte {
        b'%' => matches!(
            (bytes.get(pos + 1).copied().and_then(hex_value), bytes.get(pos + 2).copied().and_then(hex_value)),
            (Some(_), Some(_))
        ),
        b'/' | b'?' | b'#' => false,
        _ => !byte.is_ascii_whitespace() && !byte.is_ascii_control(),
    })
}
