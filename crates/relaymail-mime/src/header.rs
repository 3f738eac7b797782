//! MIME header handling.

use chrono::{DateTime, Utc};
use std::fmt;

/// RFC 5322 date layout with a fixed `+0000` zone.
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// Ordered collection of email headers.
///
/// Names are matched case-insensitively but keep the spelling and position
/// of their first insertion, so serialization reproduces the order the
/// headers were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.headers[idx].1.push(value),
            None => self.headers.push((name, vec![value])),
        }
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|idx| self.headers[idx].1.first().map(String::as_str))
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Returns the header names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Display for Headers {
    /// Writes every header as `Name: value` terminated by CRLF. Repeated
    /// values of one name are joined with `, `.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, values) in &self.headers {
            write!(f, "{name}: {}\r\n", values.join(", "))?;
        }
        Ok(())
    }
}

/// Formats a timestamp for the `Date` header.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// let when = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
/// assert_eq!(relaymail_mime::format_date(when), "Tue, 05 Mar 2024 07:08:09 +0000");
/// ```
#[must_use]
pub fn format_date(when: DateTime<Utc>) -> String {
    when.format(DATE_FORMAT).to_string()
}
