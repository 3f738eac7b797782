//! Multipart body generation (RFC 2046).

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Longest boundary RFC 2046 permits.
const MAX_BOUNDARY_LENGTH: usize = 70;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// One body part of a multipart document, already transfer-encoded.
#[derive(Debug, Clone)]
pub struct Part {
    headers: Headers,
    body: String,
}

impl Part {
    /// Creates a part from headers and an encoded body.
    #[must_use]
    pub const fn new(headers: Headers, body: String) -> Self {
        Self { headers, body }
    }

    /// Creates a `text/plain; charset=utf-8` part with a quoted-printable body.
    #[must_use]
    pub fn text_quoted_printable(text: &str) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", ContentType::text_plain().to_string());
        headers.add(
            "Content-Transfer-Encoding",
            TransferEncoding::QuotedPrintable.to_string(),
        );
        Self::new(headers, encode_quoted_printable(text))
    }

    /// Creates an `application/octet-stream` attachment part with a base64
    /// body wrapped at 76 columns.
    #[must_use]
    pub fn attachment_base64(filename: &str, data: &[u8]) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", ContentType::octet_stream(filename).to_string());
        headers.add("Content-Transfer-Encoding", TransferEncoding::Base64.to_string());
        headers.add(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        );
        Self::new(headers, encode_base64_wrapped(data))
    }

    /// Returns the part headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the encoded part body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

}

/// Builds a `multipart/mixed` body.
///
/// The first part is introduced by `--boundary`, later parts by
/// `CRLF--boundary`, and the body ends with `CRLF--boundary--CRLF`.
#[derive(Debug, Clone)]
pub struct MultipartWriter {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartWriter {
    /// Creates a writer with a freshly generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: generate_boundary(),
            parts: Vec::new(),
        }
    }

    /// Creates a writer with a caller-chosen boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoundary`] if the boundary is empty, longer
    /// than 70 characters, ends in a space or uses characters outside the
    /// RFC 2046 boundary alphabet.
    pub fn with_boundary(boundary: impl Into<String>) -> Result<Self> {
        let boundary = boundary.into();
        validate_boundary(&boundary)?;
        Ok(Self {
            boundary,
            parts: Vec::new(),
        })
    }

    /// Returns the boundary token.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the `multipart/mixed` content type naming this boundary.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        ContentType::multipart_mixed(self.boundary.clone())
    }

    /// Appends a part.
    pub fn add_part(&mut self, part: Part) -> &mut Self {
        self.parts.push(part);
        self
    }

    /// Returns the number of parts added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if no parts were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Serializes all parts followed by the closing delimiter.
    #[must_use]
    pub fn finish(self) -> String {
        let boundary = &self.boundary;
        let mut out = String::new();

        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push_str("\r\n");
            }
            out.push_str("--");
            out.push_str(boundary);
            out.push_str("\r\n");
            out.push_str(&part.headers.to_string());
            out.push_str("\r\n");
            out.push_str(&part.body);
        }

        out.push_str("\r\n--");
        out.push_str(boundary);
        out.push_str("--\r\n");
        out
    }
}

impl Default for MultipartWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates a boundary token unique per call.
///
/// The token combines the current millisecond timestamp with a random v4
/// UUID. It starts with `=_`, a sequence quoted-printable output never
/// contains, so it cannot collide with an encoded text part.
#[must_use]
pub fn generate_boundary() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    format!("=_{millis:x}_{}", uuid::Uuid::new_v4().simple())
}

fn validate_boundary(boundary: &str) -> Result<()> {
    let valid_char = |c: char| c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c);

    if boundary.is_empty()
        || boundary.len() > MAX_BOUNDARY_LENGTH
        || boundary.ends_with(' ')
        || !boundary.chars().all(valid_char)
    {
        return Err(Error::InvalidBoundary(boundary.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::{decode_base64, decode_quoted_printable};
    use std::collections::HashSet;

    #[test]
    fn test_generate_boundary_unique() {
        let boundaries: HashSet<String> = (0..100).map(|_| generate_boundary()).collect();
        assert_eq!(boundaries.len(), 100);
        for boundary in &boundaries {
            assert!(boundary.starts_with("=_"));
            validate_boundary(boundary).unwrap();
        }
    }

    #[test]
    fn test_with_boundary_validation() {
        assert!(MultipartWriter::with_boundary("simple-boundary").is_ok());
        assert!(MultipartWriter::with_boundary("").is_err());
        assert!(MultipartWriter::with_boundary("trailing ").is_err());
        assert!(MultipartWriter::with_boundary("semi;colon").is_err());
        assert!(MultipartWriter::with_boundary("x".repeat(71)).is_err());
    }

    #[test]
    fn test_text_part_headers() {
        let part = Part::text_quoted_printable("Grüße");
        assert_eq!(
            part.headers().get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(
            part.headers().get("Content-Transfer-Encoding"),
            Some("quoted-printable")
        );
        assert_eq!(decode_quoted_printable(part.body()).unwrap(), "Grüße");
    }

    #[test]
    fn test_attachment_part_headers() {
        let part = Part::attachment_base64("log.adi", b"<EOR>");
        assert_eq!(
            part.headers().get("Content-Type"),
            Some("application/octet-stream; name=\"log.adi\"")
        );
        assert_eq!(
            part.headers().get("Content-Disposition"),
            Some("attachment; filename=\"log.adi\"")
        );
        assert_eq!(
            part.headers().get("Content-Transfer-Encoding"),
            Some("base64")
        );
        assert_eq!(decode_base64(part.body()).unwrap(), b"<EOR>");
    }

    #[test]
    fn test_finish_framing() {
        let mut writer = MultipartWriter::with_boundary("XYZ").unwrap();
        writer
            .add_part(Part::text_quoted_printable("hello"))
            .add_part(Part::attachment_base64("a.adi", b"abc"));
        assert_eq!(writer.len(), 2);

        let body = writer.finish();
        let expected = concat!(
            "--XYZ\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "hello",
            "\r\n--XYZ\r\n",
            "Content-Type: application/octet-stream; name=\"a.adi\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "Content-Disposition: attachment; filename=\"a.adi\"\r\n",
            "\r\n",
            "YWJj\r\n",
            "\r\n--XYZ--\r\n",
        );
        assert_eq!(body, expected);
    }

    #[test]
    fn test_content_type_matches_boundary() {
        let writer = MultipartWriter::new();
        let ct = writer.content_type();
        assert_eq!(ct.boundary(), Some(writer.boundary()));
        assert!(writer.is_empty());
    }
}
