//! # relaymail-core
//!
//! Outbound email service for relaymail.
//!
//! This crate provides:
//! - Email configuration, its sources and validation
//! - One-shot service initialization
//! - Multipart message composition with a generated attachment
//! - Delivery to a single relay with bounded retries
//!
//! ## Example
//!
//! ```ignore
//! use relaymail_core::{ComposeRequest, JsonFileConfig, Mailer};
//!
//! let mailer = Mailer::builder()
//!     .config_provider(JsonFileConfig::new("config.json"))
//!     .build();
//! mailer.initialize()?;
//!
//! mailer
//!     .compose_and_send(ComposeRequest::new(), &records, &AdifCompositor)
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod compose;
pub mod config;
mod error;
pub mod lifecycle;
pub mod mailer;
pub mod transport;
pub mod validation;

pub use compose::{
    AttachmentCompositor, ComposeError, ComposeRequest, ComposedMessage, Composer,
    split_recipients,
};
pub use config::{
    ConfigError, ConfigProvider, EmailConfig, JsonFileConfig, RetryPolicy, Settings, StaticConfig,
};
pub use error::{Error, Result};
pub use lifecycle::{InitError, Lifecycle, ServiceState};
pub use mailer::{Mailer, MailerBuilder, OutgoingMessage};
pub use transport::{SmtpTransport, Transport};
pub use validation::{ValidationError, validate};
