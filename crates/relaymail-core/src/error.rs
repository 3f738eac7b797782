//! Error types for the core library.

use thiserror::Error;

use crate::compose::ComposeError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The service has not completed initialization.
    #[error("email service is not initialized")]
    NotInitialized,

    /// Neither the message nor the configuration names a sender.
    #[error("email from address cannot be empty")]
    MissingSender,

    /// Message composition failed.
    #[error("Composition failed: {0}")]
    Compose(#[from] ComposeError),

    /// The sender or a recipient is unusable; no attempt was made.
    #[error(transparent)]
    InvalidEnvelope(relaymail_smtp::Error),

    /// Every delivery attempt failed; `source` is the last attempt's error.
    #[error("Failed to send email after {attempts} attempt(s)")]
    Delivery {
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        #[source]
        source: relaymail_smtp::Error,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
