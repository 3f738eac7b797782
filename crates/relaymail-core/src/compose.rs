//! Multipart message composition.
//!
//! Turns a subject, body and record set into a `multipart/mixed` message
//! with a quoted-printable text part and a base64 attachment produced by an
//! [`AttachmentCompositor`].

use chrono::{DateTime, Utc};
use relaymail_mime::{Headers, MultipartWriter, Part, format_date, generate_boundary};
use relaymail_smtp::identity::local_identity;

use crate::config::EmailConfig;

/// Attachment filename layout; the timestamp is UTC.
const FILENAME_FORMAT: &str = "%Y%m%d%H%M%S-export.adi";

/// Errors raised while composing a message.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// Neither the request nor the configuration names a sender.
    #[error("email from address cannot be empty")]
    MissingSender,

    /// Neither the request nor the configuration names a recipient.
    #[error("email TO address cannot be empty")]
    MissingRecipients,

    /// A header value contains CR or LF.
    #[error("email {0} cannot contain line breaks")]
    LineBreak(&'static str),

    /// No records were supplied for the attachment.
    #[error("record set cannot be empty")]
    EmptyRecords,

    /// The attachment compositor failed.
    #[error("Failed to compose attachment: {0}")]
    Compositor(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// MIME framing failed.
    #[error("Failed to encode message: {0}")]
    Encode(#[from] relaymail_mime::Error),
}

/// Turns structured records into the attachment text.
pub trait AttachmentCompositor {
    /// Record type consumed.
    type Record;
    /// Failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Renders the records as attachment text.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be rendered.
    fn compose(&self, records: &[Self::Record]) -> Result<String, Self::Error>;
}

/// Caller-supplied message fields; blank fields fall back to configuration.
#[derive(Debug, Clone, Default)]
pub struct ComposeRequest {
    /// Sender address.
    pub from: String,
    /// Recipients, in order.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl ComposeRequest {
    /// Creates an empty request that uses every configured default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the body text.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// A fully serialized message plus the values the transport needs.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    /// Resolved sender.
    pub from: String,
    /// Resolved recipients.
    pub to: Vec<String>,
    /// Top-level headers in serialization order.
    pub headers: Headers,
    /// Multipart boundary used in the body.
    pub boundary: String,
    /// Attachment filename.
    pub filename: String,
    /// Headers, blank line and multipart body.
    pub message: String,
}

/// Builds multipart messages with defaults taken from configuration.
#[derive(Debug, Clone)]
pub struct Composer {
    from: String,
    to: String,
    subject: String,
    body: String,
    identity: String,
}

impl Composer {
    /// Creates a composer using the configuration's default sender,
    /// recipients, subject and body.
    #[must_use]
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            from: config.from.clone(),
            to: config.to.clone(),
            subject: config.subject.clone(),
            body: config.body.clone(),
            identity: local_identity(),
        }
    }

    /// Overrides the host part of generated `Message-ID`s.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Composes a message timestamped now.
    ///
    /// # Errors
    ///
    /// See [`Composer::build_at`].
    pub fn build<C: AttachmentCompositor>(
        &self,
        request: ComposeRequest,
        records: &[C::Record],
        compositor: &C,
    ) -> Result<ComposedMessage, ComposeError> {
        self.build_at(request, records, compositor, Utc::now())
    }

    /// Composes a message using `now` for the `Date` header and the
    /// attachment filename.
    ///
    /// # Errors
    ///
    /// Returns an error if no sender or recipient can be resolved, a header
    /// value contains a line break, the record set is empty, the compositor fails, or MIME framing fails.
    /// Nothing is returned on error.
    pub fn build_at<C: AttachmentCompositor>(
        &self,
        request: ComposeRequest,
        records: &[C::Record],
        compositor: &C,
        now: DateTime<Utc>,
    ) -> Result<ComposedMessage, ComposeError> {
        let from = non_empty(&request.from)
            .or_else(|| non_empty(&self.from))
            .ok_or(ComposeError::MissingSender)?
            .to_string();

        let mut to: Vec<String> = request
            .to
            .iter()
            .filter_map(|addr| non_empty(addr))
            .map(str::to_string)
            .collect();
        if to.is_empty() {
            to = split_recipients(&self.to);
        }
        if to.is_empty() {
            return Err(ComposeError::MissingRecipients);
        }

        let subject = non_empty(&request.subject).unwrap_or(self.subject.as_str());
        let body = non_empty(&request.body).unwrap_or(self.body.as_str());

        single_line("From", &from)?;
        for addr in &to {
            single_line("To", addr)?;
        }
        single_line("Subject", subject)?;

        if records.is_empty() {
            return Err(ComposeError::EmptyRecords);
        }
        let attachment = compositor
            .compose(records)
            .map_err(|e| ComposeError::Compositor(Box::new(e)))?;

        let filename = now.format(FILENAME_FORMAT).to_string();

        let mut multipart = MultipartWriter::with_boundary(generate_boundary())?;
        multipart
            .add_part(Part::text_quoted_printable(body))
            .add_part(Part::attachment_base64(&filename, attachment.as_bytes()));
        let boundary = multipart.boundary().to_string();

        let mut headers = Headers::new();
        headers.add("From", from.as_str());
        headers.add("To", to.join(", "));
        headers.add("Subject", subject);
        headers.add("Date", format_date(now));
        headers.add("Message-ID", self.message_id());
        headers.add("MIME-Version", "1.0");
        headers.add("Content-Type", multipart.content_type().to_string());

        let message = format!("{headers}\r\n{}", multipart.finish());

        Ok(ComposedMessage {
            from,
            to,
            headers,
            boundary,
            filename,
            message,
        })
    }

    fn message_id(&self) -> String {
        format!("<{}@{}>", uuid::Uuid::new_v4().simple(), self.identity)
    }
}

/// Splits a recipient list on commas, semicolons and whitespace.
///
/// Empty entries are dropped.
#[must_use]
pub fn split_recipients(list: &str) -> Vec<String> {
    list.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn single_line(header: &'static str, value: &str) -> Result<(), ComposeError> {
    if value.contains(['\r', '\n']) {
        return Err(ComposeError::LineBreak(header));
    }
    Ok(())
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use relaymail_mime::encoding::{decode_base64, decode_quoted_printable};

    /// Joins callsigns into a minimal log export.
    struct CallsignLog;

    impl AttachmentCompositor for CallsignLog {
        type Record = &'static str;
        type Error = std::fmt::Error;

        fn compose(&self, records: &[Self::Record]) -> Result<String, Self::Error> {
            Ok(records
                .iter()
                .map(|call| format!("<CALL:{}>{call}<EOR>\n", call.len()))
                .collect())
        }
    }

    struct Broken;

    impl AttachmentCompositor for Broken {
        type Record = u8;
        type Error = std::io::Error;

        fn compose(&self, _: &[u8]) -> Result<String, Self::Error> {
            Err(std::io::Error::other("record 3 has no band"))
        }
    }

    fn config() -> EmailConfig {
        EmailConfig {
            from: "station@example.com".into(),
            to: "log@example.org; qsl@example.net".into(),
            subject: "Log export".into(),
            body: "Attached is the latest log.".into(),
            ..EmailConfig::default()
        }
    }

    fn composer() -> Composer {
        Composer::new(&config()).with_identity("shack")
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 14, 5, 9).unwrap()
    }

    fn body_of(message: &str) -> &str {
        message.split_once("\r\n\r\n").unwrap().1
    }

    #[test]
    fn test_defaults_from_config() {
        let composed = composer()
            .build_at(ComposeRequest::new(), &["K1ABC"], &CallsignLog, at())
            .unwrap();

        assert_eq!(composed.from, "station@example.com");
        assert_eq!(composed.to, vec!["log@example.org", "qsl@example.net"]);
        assert_eq!(composed.headers.get("Subject"), Some("Log export"));
        assert_eq!(
            composed.headers.get("To"),
            Some("log@example.org, qsl@example.net")
        );
        assert_eq!(composed.filename, "20240601140509-export.adi");
    }

    #[test]
    fn test_explicit_fields_win() {
        let request = ComposeRequest::new()
            .from(" op@example.com ")
            .to(" a@example.com ")
            .to("")
            .subject("Contest log")
            .body("See attached.");
        let composed = composer()
            .build_at(request, &["K1ABC"], &CallsignLog, at())
            .unwrap();

        assert_eq!(composed.from, "op@example.com");
        assert_eq!(composed.to, vec!["a@example.com"]);
        assert_eq!(composed.headers.get("Subject"), Some("Contest log"));
        assert!(composed.message.contains("See attached."));
    }

    #[test]
    fn test_blank_subject_falls_back() {
        let request = ComposeRequest::new().subject("   ").body("\n");
        let composed = composer()
            .build_at(request, &["K1ABC"], &CallsignLog, at())
            .unwrap();
        assert_eq!(composed.headers.get("Subject"), Some("Log export"));
        assert!(composed.message.contains("Attached is the latest log."));
    }

    #[test]
    fn test_header_order_and_values() {
        let composed = composer()
            .build_at(ComposeRequest::new(), &["K1ABC"], &CallsignLog, at())
            .unwrap();

        let names: Vec<&str> = composed.headers.names().collect();
        assert_eq!(
            names,
            vec![
                "From",
                "To",
                "Subject",
                "Date",
                "Message-ID",
                "MIME-Version",
                "Content-Type"
            ]
        );
        assert_eq!(
            composed.headers.get("Date"),
            Some("Sat, 01 Jun 2024 14:05:09 +0000")
        );
        let id = composed.headers.get("Message-ID").unwrap();
        assert!(id.starts_with('<') && id.ends_with("@shack>"));
        assert!(composed.message.starts_with("From: station@example.com\r\n"));
    }

    #[test]
    fn test_boundary_matches_body() {
        let composed = composer()
            .build_at(ComposeRequest::new(), &["K1ABC"], &CallsignLog, at())
            .unwrap();

        assert_eq!(
            composed.headers.get("Content-Type").unwrap(),
            format!("multipart/mixed; boundary=\"{}\"", composed.boundary)
        );

        let body = body_of(&composed.message);
        let delimiter = format!("--{}\r\n", composed.boundary);
        assert!(body.starts_with(&delimiter));
        assert_eq!(body.matches(&delimiter).count(), 2);
        assert!(body.ends_with(&format!("\r\n--{}--\r\n", composed.boundary)));
    }

    #[test]
    fn test_parts_decode() {
        let composed = composer()
            .build_at(
                ComposeRequest::new().body("73 de Grüße"),
                &["K1ABC", "W9XYZ"],
                &CallsignLog,
                at(),
            )
            .unwrap();

        let body = body_of(&composed.message);
        let sections: Vec<&str> = body.split(&format!("--{}", composed.boundary)).collect();
        // Leading empty preamble, two parts, closing "--\r\n".
        assert_eq!(sections.len(), 4);

        let (text_headers, text) = sections[1].split_once("\r\n\r\n").unwrap();
        assert!(text_headers.contains("Content-Transfer-Encoding: quoted-printable"));
        let text = text.strip_suffix("\r\n").unwrap();
        assert_eq!(decode_quoted_printable(text).unwrap(), "73 de Grüße");

        let (file_headers, file) = sections[2].split_once("\r\n\r\n").unwrap();
        assert!(file_headers.contains(
            "Content-Disposition: attachment; filename=\"20240601140509-export.adi\""
        ));
        assert!(file_headers.contains("name=\"20240601140509-export.adi\""));
        let decoded = decode_base64(file).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "<CALL:5>K1ABC<EOR>\n<CALL:5>W9XYZ<EOR>\n"
        );
    }

    #[test]
    fn test_boundaries_differ_between_calls() {
        let composer = composer();
        let first = composer
            .build_at(ComposeRequest::new(), &["K1ABC"], &CallsignLog, at())
            .unwrap();
        let second = composer
            .build_at(ComposeRequest::new(), &["K1ABC"], &CallsignLog, at())
            .unwrap();
        assert_ne!(first.boundary, second.boundary);
        assert_ne!(
            first.headers.get("Message-ID"),
            second.headers.get("Message-ID")
        );
    }

    #[test]
    fn test_missing_sender() {
        let composer = Composer::new(&EmailConfig {
            from: " ".into(),
            ..config()
        });
        let err = composer
            .build(ComposeRequest::new(), &["K1ABC"], &CallsignLog)
            .unwrap_err();
        assert!(matches!(err, ComposeError::MissingSender));
    }

    #[test]
    fn test_missing_recipients() {
        let composer = Composer::new(&EmailConfig {
            to: " ,; ".into(),
            ..config()
        });
        let err = composer
            .build(ComposeRequest::new(), &["K1ABC"], &CallsignLog)
            .unwrap_err();
        assert!(matches!(err, ComposeError::MissingRecipients));
        assert_eq!(err.to_string(), "email TO address cannot be empty");
    }

    #[test]
    fn test_line_breaks_in_headers_rejected() {
        let cases = [
            (ComposeRequest::new().subject("Log\r\nBcc: x@example.com"), "Subject"),
            (ComposeRequest::new().from("op@example.com\nBcc: x@example.com"), "From"),
            (ComposeRequest::new().to("a@example.com\rBcc: x@example.com"), "To"),
        ];
        for (request, header) in cases {
            let err = composer()
                .build_at(request, &["K1ABC"], &CallsignLog, at())
                .unwrap_err();
            assert!(matches!(err, ComposeError::LineBreak(h) if h == header), "{err:?}");
        }

        let composer = Composer::new(&EmailConfig {
            subject: "Log\nexport".into(),
            ..config()
        });
        let err = composer
            .build(ComposeRequest::new(), &["K1ABC"], &CallsignLog)
            .unwrap_err();
        assert_eq!(err.to_string(), "email Subject cannot contain line breaks");
    }

    #[test]
    fn test_empty_records() {
        let err = composer()
            .build(ComposeRequest::new(), &[], &CallsignLog)
            .unwrap_err();
        assert!(matches!(err, ComposeError::EmptyRecords));
    }

    #[test]
    fn test_compositor_failure_keeps_source() {
        let err = composer()
            .build(ComposeRequest::new(), &[1, 2, 3], &Broken)
            .unwrap_err();
        assert!(matches!(err, ComposeError::Compositor(_)));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "record 3 has no band");
    }

    #[test]
    fn test_split_recipients() {
        assert_eq!(
            split_recipients("a@x.org, b@x.org;c@x.org\td@x.org"),
            vec!["a@x.org", "b@x.org", "c@x.org", "d@x.org"]
        );
        assert!(split_recipients(" ;, ").is_empty());
    }

    proptest! {
        #[test]
        fn split_recipients_never_yields_separators(list in "[a-z@.,; \t]{0,64}") {
            for addr in split_recipients(&list) {
                prop_assert!(!addr.is_empty());
                prop_assert!(!addr.contains([',', ';', ' ', '\t']));
            }
        }
    }
}
