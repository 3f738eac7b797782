//! Email configuration model types.

use std::fmt;
use std::time::Duration;

use relaymail_smtp::Credentials;
use relaymail_smtp::addr::join_host_port;
use relaymail_smtp::connection::DEFAULT_DIAL_TIMEOUT;
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, validate};

/// Shortest dial timeout accepted from configuration.
pub const MIN_DIAL_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest dial timeout accepted from configuration.
pub const MAX_DIAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Email service configuration as supplied by a [`ConfigProvider`](super::ConfigProvider).
///
/// Numeric fields are wide and signed. Out-of-range values are rejected by
/// validation or clamped when the delivery parameters are derived.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Whether delivery is switched on.
    pub enabled: bool,
    /// Relay hostname or IP literal.
    pub host: String,
    /// Relay port (valid range 1-65535).
    pub port: u32,
    /// Default sender address.
    pub from: String,
    /// Login name; empty disables authentication.
    pub username: String,
    /// Password paired with `username`.
    pub password: String,
    /// Default recipients, separated by commas, semicolons or whitespace.
    pub to: String,
    /// Default subject line.
    pub subject: String,
    /// Default body text.
    pub body: String,
    /// Dial timeout in seconds; zero or negative selects the default.
    pub smtp_dial_timeout_sec: i64,
    /// Additional attempts after the first; negative means none.
    pub smtp_retry_count: i64,
    /// Seconds to wait between attempts; negative means none.
    pub smtp_retry_delay_sec: i64,
}

impl EmailConfig {
    /// Dial timeout derived from `smtp_dial_timeout_sec`.
    ///
    /// Zero or negative selects [`DEFAULT_DIAL_TIMEOUT`]; anything else is
    /// clamped to [`MIN_DIAL_TIMEOUT`]..=[`MAX_DIAL_TIMEOUT`].
    #[must_use]
    pub fn dial_timeout(&self) -> Duration {
        if self.smtp_dial_timeout_sec <= 0 {
            return DEFAULT_DIAL_TIMEOUT;
        }
        Duration::from_secs(self.smtp_dial_timeout_sec.unsigned_abs())
            .clamp(MIN_DIAL_TIMEOUT, MAX_DIAL_TIMEOUT)
    }

    /// Retry policy derived from `smtp_retry_count` and `smtp_retry_delay_sec`.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let retries = u32::try_from(self.smtp_retry_count.max(0)).unwrap_or(u32::MAX);
        RetryPolicy {
            attempts: retries.saturating_add(1),
            delay: Duration::from_secs(self.smtp_retry_delay_sec.max(0).unsigned_abs()),
        }
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from", &self.from)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("body", &self.body)
            .field("smtp_dial_timeout_sec", &self.smtp_dial_timeout_sec)
            .field("smtp_retry_count", &self.smtp_retry_count)
            .field("smtp_retry_delay_sec", &self.smtp_retry_delay_sec)
            .finish()
    }
}

/// How many times to attempt a delivery and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, always at least one.
    pub attempts: u32,
    /// Constant pause before every attempt after the first.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Validated, immutable snapshot taken at initialization.
#[derive(Debug, Clone)]
pub struct Settings {
    config: EmailConfig,
    addr: String,
    credentials: Option<Credentials>,
    dial_timeout: Duration,
    retry: RetryPolicy,
}

impl Settings {
    /// Validates a configuration and derives the delivery parameters.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn from_config(config: EmailConfig) -> Result<Self, ValidationError> {
        validate(&config)?;

        let port = u16::try_from(config.port).map_err(|_| ValidationError::InvalidPort)?;
        let addr = join_host_port(config.host.trim(), port);

        let username = config.username.trim();
        let credentials = (!username.is_empty())
            .then(|| Credentials::new(username, config.password.trim()));

        Ok(Self {
            addr,
            credentials,
            dial_timeout: config.dial_timeout(),
            retry: config.retry_policy(),
            config,
        })
    }

    /// The validated configuration record.
    #[must_use]
    pub const fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// Whether delivery is switched on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Relay host, trimmed.
    #[must_use]
    pub fn host(&self) -> &str {
        self.config.host.trim()
    }

    /// Relay authority in `host:port` form, IPv6-safe.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Credentials, present only when a username is configured.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Bound on connection establishment.
    #[must_use]
    pub const fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    /// Attempt count and inter-attempt delay.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}
