//! Delivery seam between the service and the SMTP client.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use relaymail_smtp::connection::default_tls_config;
use relaymail_smtp::{Connector, Envelope};
use rustls::ClientConfig;

/// Delivers one envelope to the relay.
///
/// The service calls this once per attempt; implementations must not retry
/// on their own.
pub trait Transport: Send + Sync {
    /// Performs one delivery attempt.
    fn deliver(
        &self,
        envelope: &Envelope<'_>,
        dial_timeout: Duration,
    ) -> impl Future<Output = relaymail_smtp::Result<()>> + Send;
}

/// Production transport: implicit TLS, then mandatory STARTTLS.
#[derive(Clone)]
pub struct SmtpTransport {
    tls: Arc<ClientConfig>,
}

impl SmtpTransport {
    /// Creates a transport trusting the bundled web PKI roots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tls_config(default_tls_config())
    }

    /// Creates a transport with a caller-supplied TLS configuration.
    #[must_use]
    pub const fn with_tls_config(tls: Arc<ClientConfig>) -> Self {
        Self { tls }
    }
}

impl Default for SmtpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport").finish_non_exhaustive()
    }
}

impl Transport for SmtpTransport {
    async fn deliver(
        &self,
        envelope: &Envelope<'_>,
        dial_timeout: Duration,
    ) -> relaymail_smtp::Result<()> {
        let connector = Connector::with_tls_config(dial_timeout, Arc::clone(&self.tls));
        relaymail_smtp::deliver(envelope, &connector).await
    }
}
