//! Content-Transfer-Encoding codecs (RFC 2045).
//!
//! Supports Base64 (single-line and 76-column wrapped) and
//! Quoted-Printable.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length, excluding the CRLF.
pub const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 broken into CRLF-terminated lines of at most
/// [`MAX_LINE_LENGTH`] characters.
///
/// Every line, including the last, ends with CRLF. Empty input yields an
/// empty string.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + 2 * encoded.len().div_ceil(MAX_LINE_LENGTH));

    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(MAX_LINE_LENGTH));
        out.push_str(line);
        out.push_str("\r\n");
        rest = tail;
    }
    out
}

/// Decodes Base64 data, ignoring line breaks and other whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// `\n` and `\r\n` become hard CRLF line breaks. Whitespace at the end of a
/// line is escaped, `=` and non-printable bytes are escaped, and soft line
/// breaks keep every output line within [`MAX_LINE_LENGTH`].
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let data = text.as_bytes();
    let mut out = String::with_capacity(data.len() + data.len() / 8);

    let mut lines = data.split(|&b| b == b'\n').peekable();
    while let Some(line) = lines.next() {
        let hard_break = lines.peek().is_some();
        let line = if hard_break {
            line.strip_suffix(b"\r").unwrap_or(line)
        } else {
            line
        };
        encode_qp_line(line, &mut out);
        if hard_break {
            out.push_str("\r\n");
        }
    }

    out
}

fn encode_qp_line(line: &[u8], out: &mut String) {
    let mut width = 0;
    for (i, &byte) in line.iter().enumerate() {
        let is_last = i + 1 == line.len();
        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            b' ' | b'\t' => !is_last,
            _ => false,
        };
        let token_len = if literal { 1 } else { 3 };

        // Keep one column free for the soft break unless the line ends here.
        let limit = if is_last {
            MAX_LINE_LENGTH
        } else {
            MAX_LINE_LENGTH - 1
        };
        if width + token_len > limit {
            out.push_str("=\r\n");
            width = 0;
        }

        if literal {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "={byte:02X}");
        }
        width += token_len;
    }
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences or the
/// decoded bytes are not UTF-8.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        match &bytes[i + 1..] {
            [b'\r', b'\n', ..] => i += 3,
            [b'\n', ..] => i += 2,
            [hi, lo, ..] => {
                let (Some(hi), Some(lo)) = (hex_value(*hi), hex_value(*lo)) else {
                    return Err(Error::InvalidEncoding(format!(
                        "Invalid hex escape at byte {i}"
                    )));
                };
                out.push((hi << 4) | lo);
                i += 3;
            }
            _ => {
                return Err(Error::InvalidEncoding(
                    "Incomplete escape sequence".to_string(),
                ));
            }
        }
    }

    String::from_utf8(out).map_err(Into::into)
}

fn hex_value(byte: u8) -> Option<u8> {
    char::from(byte)
        .to_digit(16)
        .and_then(|d| u8::try_from(d).ok())
}
