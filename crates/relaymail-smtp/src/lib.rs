//! # relaymail-smtp
//!
//! SMTP submission client used by relaymail to hand messages to a relay.
//!
//! ## Features
//!
//! - **Type-state session**: compile-time enforcement of the
//!   EHLO → AUTH → MAIL → RCPT → DATA ordering
//! - **TLS always**: implicit TLS first, STARTTLS as the only fallback;
//!   plaintext submission is refused
//! - **Bounded dialing**: connection establishment runs under a dial timeout
//! - **Authentication**: `AUTH PLAIN` with an initial response
//!
//! ## Quick Start
//!
//! ```ignore
//! use relaymail_smtp::{Connector, Credentials, Envelope, deliver};
//! use relaymail_smtp::addr::join_host_port;
//! use std::time::Duration;
//!
//! # async fn run() -> relaymail_smtp::Result<()> {
//! let addr = join_host_port("smtp.example.com", 587);
//! let creds = Credentials::new("user@example.com", "secret");
//! let to = vec!["log@example.org".to_string()];
//!
//! let envelope = Envelope {
//!     addr: &addr,
//!     credentials: Some(&creds),
//!     from: "user@example.com",
//!     recipients: &to,
//!     payload: b"Subject: hi\r\n\r\nHello\r\n",
//! };
//! deliver(&envelope, &Connector::new(Duration::from_secs(10))).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌──────────────┐
//! │  Connected   │ ─── auth_plain() ───→ Authenticated
//! └──────────────┘                            │
//!        │                                    │
//!        └─── mail_from() ───→ MailTransaction ───→ RecipientAdded ───→ Data
//! ```
//!
//! ## Modules
//!
//! - [`addr`]: IPv6-safe `host:port` handling
//! - [`command`]: SMTP command builders
//! - [`connection`]: Connector, streams and the type-state client
//! - [`identity`]: client identity for EHLO
//! - [`parser`]: Reply parser
//! - [`transport`]: TLS negotiation and the full submission sequence
//! - [`types`]: Addresses, extensions, replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod addr;
pub mod command;
pub mod connection;
mod error;
pub mod identity;
pub mod parser;
pub mod transport;
pub mod types;

pub use connection::{
    Authenticated, Client, Connected, Connector, Data, MailTransaction, RecipientAdded,
    ServerInfo, SmtpStream,
};
pub use error::{Error, Result};
pub use transport::{Credentials, Envelope, deliver};
pub use types::{Address, Extension, Reply, ReplyCode};
