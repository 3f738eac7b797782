//! SMTP command builder.

use crate::types::Address;

/// Commands issued during a submission session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// HELO, used when the server refuses EHLO.
    Helo {
        /// Client identity.
        identity: String,
    },
    /// EHLO, announces the client and requests the extension list.
    Ehlo {
        /// Client identity.
        identity: String,
    },
    /// STARTTLS
    StartTls,
    /// AUTH PLAIN with its SASL initial response.
    AuthPlain {
        /// Initial response, already base64 encoded
        initial_response: String,
    },
    /// MAIL FROM
    MailFrom {
        /// Envelope sender
        from: Address,
    },
    /// RCPT TO
    RcptTo {
        /// Envelope recipient
        to: Address,
    },
    /// DATA
    Data,
    /// QUIT
    Quit,
}

impl Command {
    /// Serializes the command to a CRLF terminated line.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::Helo { identity } => format!("HELO {identity}"),
            Self::Ehlo { identity } => format!("EHLO {identity}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::AuthPlain { initial_response } => format!("AUTH PLAIN {initial_response}"),
            Self::MailFrom { from } => format!("MAIL FROM:<{from}>"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Quit => "QUIT".to_string(),
        };

        let mut buf = line.into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns the command verb, used when logging failures.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Helo { .. } => "HELO",
            Self::Ehlo { .. } => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::AuthPlain { .. } => "AUTH",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::Data => "DATA",
            Self::Quit => "QUIT",
        }
    }
}
