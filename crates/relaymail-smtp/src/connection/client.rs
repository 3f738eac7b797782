//! Type-state SMTP client.

use std::marker::PhantomData;

use base64::Engine;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::{Connector, ServerInfo, SmtpStream};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, Extension, Reply, ReplyCode};

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
///
/// `S` is the underlying byte stream; production code uses [`SmtpStream`].
#[derive(Debug)]
pub struct Client<S, State> {
    stream: BufReader<S>,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl<S, State> Client<S, State> {
    /// Returns what the server announced in its greeting and last EHLO.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S, Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut stream = BufReader::new(stream);
        let greeting = read_reply(&mut stream).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(greeting.into_error());
        }

        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                ..ServerInfo::default()
            },
            _state: PhantomData,
        })
    }

    /// Announces the client and refreshes the server's extension list.
    ///
    /// Falls back to HELO (with an empty extension list) when the server
    /// rejects EHLO with a permanent error.
    ///
    /// # Errors
    ///
    /// Returns an error if both EHLO and HELO are rejected.
    pub async fn hello(mut self, identity: &str) -> Result<Self> {
        let reply = self
            .send_command(&Command::Ehlo {
                identity: identity.to_string(),
            })
            .await?;

        if reply.is_success() {
            self.server_info.extensions = reply
                .message
                .iter()
                .skip(1)
                .map(|line| Extension::parse(line))
                .collect();
            return Ok(self);
        }
        if !reply.code.is_permanent() {
            return Err(reply.into_error());
        }

        tracing::debug!(code = %reply.code, "EHLO rejected, falling back to HELO");
        let reply = self
            .send_command(&Command::Helo {
                identity: identity.to_string(),
            })
            .await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }
        self.server_info.extensions.clear();
        Ok(self)
    }

    /// Authenticates using the PLAIN mechanism with an initial response.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let credentials = format!("\0{username}\0{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        let reply = self
            .send_command(&Command::AuthPlain {
                initial_response: encoded,
            })
            .await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }

        Ok(self.transition())
    }

    /// Starts a mail transaction without authentication (if server allows).
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<S, MailTransaction>> {
        self.expect_success(&Command::MailFrom { from }).await?;
        Ok(self.transition())
    }
}

impl Client<SmtpStream, Connected> {
    /// Upgrades the connection to TLS using STARTTLS.
    ///
    /// The caller must announce itself again afterwards; capabilities seen
    /// before the upgrade are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if STARTTLS was not advertised, or an
    /// error if the command or the handshake fails.
    pub async fn starttls(mut self, connector: &Connector, host: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let reply = self.send_command(&Command::StartTls).await?;
        if reply.code != ReplyCode::SERVICE_READY {
            return Err(reply.into_error());
        }

        // Bytes received before the handshake must not leak into the TLS session.
        if !self.stream.buffer().is_empty() {
            return Err(Error::Protocol(
                "Unexpected data after STARTTLS reply".into(),
            ));
        }

        let stream = connector.upgrade(self.stream.into_inner(), host).await?;
        Ok(Self {
            stream: BufReader::new(stream),
            server_info: ServerInfo {
                hostname: self.server_info.hostname,
                ..ServerInfo::default()
            },
            _state: PhantomData,
        })
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S, Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<S, MailTransaction>> {
        self.expect_success(&Command::MailFrom { from }).await?;
        Ok(self.transition())
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S, MailTransaction> {
    /// Adds the first recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<S, RecipientAdded>> {
        self.expect_success(&Command::RcptTo { to }).await?;
        Ok(self.transition())
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S, RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        self.expect_success(&Command::RcptTo { to }).await?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<S, Data>> {
        let reply = self.send_command(&Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(reply.into_error());
        }
        Ok(self.transition())
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S, Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// dot-stuffed and the terminating `.` line is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<S, Connected>> {
        let framed = frame_data(message);
        write_flush(&mut self.stream, &framed).await?;

        let reply = read_reply(&mut self.stream).await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }

        Ok(self.transition())
    }
}

// Common implementation for all states
impl<S: AsyncRead + AsyncWrite + Unpin, State> Client<S, State> {
    async fn send_command(&mut self, cmd: &Command) -> Result<Reply> {
        tracing::trace!(verb = cmd.verb(), "C:");
        write_flush(&mut self.stream, &cmd.serialize()).await?;
        read_reply(&mut self.stream).await
    }

    async fn expect_success(&mut self, cmd: &Command) -> Result<()> {
        let reply = self.send_command(cmd).await?;
        if reply.is_success() {
            Ok(())
        } else {
            Err(reply.into_error())
        }
    }

    fn transition<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(&Command::Quit).await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }
        Ok(())
    }
}

async fn write_flush<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    data: &[u8],
) -> Result<()> {
    let inner = stream.get_mut();
    inner.write_all(data).await?;
    inner.flush().await?;
    Ok(())
}

async fn read_reply<S: AsyncRead + Unpin>(stream: &mut BufReader<S>) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if stream.read_line(&mut line).await? == 0 {
            return Err(Error::ConnectionClosed);
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(line);
        lines.push(line.to_string());
        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

/// Normalizes line endings, dot-stuffs and terminates a DATA payload.
fn frame_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 5);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    if !message.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }
    out.extend_from_slice(b".\r\n");
    out
}
