//! Email configuration validation.

use relaymail_smtp::addr::{join_host_port, split_host_port};

use crate::config::EmailConfig;

/// Validation error for email configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Host is empty after trimming.
    EmptyHost,
    /// Host contains a space.
    HostContainsSpaces,
    /// Port is outside 1-65535.
    InvalidPort,
    /// Host and port do not form a usable authority.
    InvalidHostPort,
    /// Sender address is empty after trimming.
    EmptyFrom,
    /// Username set without a password.
    MissingPassword,
    /// Password set without a username.
    MissingUsername,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyHost => "email host cannot be empty",
            Self::HostContainsSpaces => "email host cannot contain spaces",
            Self::InvalidPort => "email port must be between 1 and 65535",
            Self::InvalidHostPort => "invalid host or port for email config",
            Self::EmptyFrom => "email from address cannot be empty",
            Self::MissingPassword => "email password must be set when username is provided",
            Self::MissingUsername => "email username must be set when password is provided",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyHost | Self::HostContainsSpaces => "host",
            Self::InvalidPort => "port",
            Self::InvalidHostPort => "host_port",
            Self::EmptyFrom => "from",
            Self::MissingPassword => "password",
            Self::MissingUsername => "username",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Validate an email configuration.
///
/// Rules are checked in a fixed order and the first violation is returned.
/// Address syntax is not checked beyond emptiness.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate(config: &EmailConfig) -> Result<(), ValidationError> {
    let host = config.host.trim();
    if host.is_empty() {
        return Err(ValidationError::EmptyHost);
    }
    if host.contains(' ') {
        return Err(ValidationError::HostContainsSpaces);
    }

    let port = u16::try_from(config.port)
        .ok()
        .filter(|&port| port != 0)
        .ok_or(ValidationError::InvalidPort)?;

    if split_host_port(&join_host_port(host, port)).is_err() {
        return Err(ValidationError::InvalidHostPort);
    }

    if config.from.trim().is_empty() {
        return Err(ValidationError::EmptyFrom);
    }

    let username = config.username.trim();
    let password = config.password.trim();
    if !username.is_empty() && password.is_empty() {
        return Err(ValidationError::MissingPassword);
    }
    if username.is_empty() && !password.is_empty() {
        return Err(ValidationError::MissingUsername);
    }

    Ok(())
}
