//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Server returned error response.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Protocol error (unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Invalid `host:port` relay address.
    #[error("Invalid relay address {addr:?}: {reason}")]
    InvalidRelay {
        /// The offending address.
        addr: String,
        /// Why it could not be split.
        reason: &'static str,
    },

    /// Connection establishment did not finish within the dial timeout.
    #[error("Timed out after {0:?} connecting to relay")]
    Timeout(Duration),

    /// Peer closed the connection while a reply was expected.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Feature not supported by server.
    #[error("Server does not support {0}; TLS required")]
    NotSupported(String),
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::SmtpError { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::SmtpError { code, .. } if *code >= 400 && *code < 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_classification() {
        assert!(Error::smtp_error(550, "no such user").is_permanent());
        assert!(Error::smtp_error(451, "try later").is_transient());
        assert!(!Error::ConnectionClosed.is_permanent());
        assert!(!Error::Timeout(Duration::from_secs(1)).is_transient());
    }

    #[test]
    fn starttls_missing_message() {
        let err = Error::NotSupported("STARTTLS".into());
        assert_eq!(
            err.to_string(),
            "Server does not support STARTTLS; TLS required"
        );
    }
}
