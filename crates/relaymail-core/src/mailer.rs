//! The email service: initialization, retried delivery and composition.

use std::sync::Arc;

use relaymail_smtp::Envelope;
use tracing::{error, info, warn};

use crate::compose::{AttachmentCompositor, ComposeRequest, ComposedMessage, Composer};
use crate::config::{ConfigProvider, Settings};
use crate::error::{Error, Result};
use crate::lifecycle::{InitError, Lifecycle, ServiceState};
use crate::transport::{SmtpTransport, Transport};

/// A message ready for delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Envelope sender; blank uses the configured sender.
    pub from: String,
    /// Envelope recipients, in order.
    pub to: Vec<String>,
    /// Fully framed RFC 5322 message.
    pub payload: Vec<u8>,
}

impl OutgoingMessage {
    /// Creates a message sent from the configured sender.
    #[must_use]
    pub fn new(to: Vec<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            from: String::new(),
            to,
            payload: payload.into(),
        }
    }

    /// Sets an explicit envelope sender.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }
}

impl From<ComposedMessage> for OutgoingMessage {
    fn from(composed: ComposedMessage) -> Self {
        Self {
            from: composed.from,
            to: composed.to,
            payload: composed.message.into_bytes(),
        }
    }
}

/// Builder for [`Mailer`].
pub struct MailerBuilder<T = SmtpTransport> {
    provider: Option<Arc<dyn ConfigProvider>>,
    transport: T,
}

impl MailerBuilder {
    /// Creates a builder using [`SmtpTransport`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: None,
            transport: SmtpTransport::default(),
        }
    }
}

impl Default for MailerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> MailerBuilder<T> {
    /// Sets the configuration source consulted by [`Mailer::initialize`].
    #[must_use]
    pub fn config_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Replaces the transport.
    #[must_use]
    pub fn transport<U: Transport>(self, transport: U) -> MailerBuilder<U> {
        MailerBuilder {
            provider: self.provider,
            transport,
        }
    }

    /// Builds an uninitialized mailer.
    #[must_use]
    pub fn build(self) -> Mailer<T> {
        Mailer {
            provider: self.provider,
            lifecycle: Lifecycle::new(),
            transport: self.transport,
        }
    }
}

/// Outbound email service.
///
/// Call [`initialize`](Self::initialize) once; afterwards
/// [`send`](Self::send) may be called from any number of tasks.
pub struct Mailer<T: Transport = SmtpTransport> {
    provider: Option<Arc<dyn ConfigProvider>>,
    lifecycle: Lifecycle,
    transport: T,
}

impl Mailer {
    /// Returns a builder using [`SmtpTransport`].
    #[must_use]
    pub fn builder() -> MailerBuilder {
        MailerBuilder::new()
    }
}

impl<T: Transport> Mailer<T> {
    /// Fetches and validates configuration. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if no provider was configured, the provider fails,
    /// or validation fails. After a failure the service stays disabled.
    pub fn initialize(&self) -> std::result::Result<(), InitError> {
        self.lifecycle
            .initialize(self.provider.as_deref())
            .map(|_| ())
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.lifecycle.state()
    }

    /// Returns true if initialized and enabled in configuration.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.lifecycle
            .settings()
            .is_some_and(|settings| settings.is_enabled())
    }

    /// Returns a composer seeded with the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before a successful `initialize`.
    pub fn composer(&self) -> Result<Composer> {
        let settings = self.settings()?;
        Ok(Composer::new(settings.config()))
    }

    /// Delivers a message, retrying per the configured policy.
    ///
    /// A disabled service logs a warning and returns `Ok(())` without
    /// contacting the relay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before a successful `initialize`,
    /// [`Error::MissingSender`] if no sender can be resolved,
    /// [`Error::InvalidEnvelope`] if the relay address, sender or a recipient
    /// is unusable, and
    /// [`Error::Delivery`] carrying the final attempt's error once every
    /// attempt has failed.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let settings = self.settings()?;
        if !settings.is_enabled() {
            warn!("email service is disabled in the config");
            return Ok(());
        }

        let from = [message.from.as_str(), settings.config().from.as_str()]
            .into_iter()
            .map(str::trim)
            .find(|from| !from.is_empty())
            .ok_or(Error::MissingSender)?;

        let envelope = Envelope {
            addr: settings.addr(),
            credentials: settings.credentials(),
            from,
            recipients: &message.to,
            payload: &message.payload,
        };
        envelope.validate().map_err(Error::InvalidEnvelope)?;

        let host = settings.host();
        let addr = settings.addr();
        let policy = settings.retry_policy();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self
                .transport
                .deliver(&envelope, settings.dial_timeout())
                .await
            {
                Ok(()) => {
                    info!(host, addr, attempt, "email sent");
                    return Ok(());
                }
                Err(e) => {
                    error!(host, addr, attempt, error = %e, "email send failed");
                    if attempt >= policy.attempts {
                        return Err(Error::Delivery {
                            attempts: attempt,
                            source: e,
                        });
                    }
                }
            }

            if !policy.delay.is_zero() {
                tokio::time::sleep(policy.delay).await;
            }
        }
    }

    /// Composes a message with the configured defaults and sends it.
    ///
    /// # Errors
    ///
    /// Returns composition errors unchanged (wrapped in [`Error::Compose`])
    /// and otherwise behaves like [`send`](Self::send).
    pub async fn compose_and_send<C: AttachmentCompositor>(
        &self,
        request: ComposeRequest,
        records: &[C::Record],
        compositor: &C,
    ) -> Result<()> {
        let composed = self.composer()?.build(request, records, compositor)?;
        self.send(&composed.into()).await
    }

    fn settings(&self) -> Result<&Arc<Settings>> {
        self.lifecycle.settings().ok_or(Error::NotInitialized)
    }
}

impl<T: Transport> std::fmt::Debug for Mailer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("has_provider", &self.provider.is_some())
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}
