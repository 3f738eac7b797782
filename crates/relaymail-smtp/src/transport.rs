//! Submission to a relay: implicit TLS first, mandatory STARTTLS otherwise.
//!
//! ```text
//! connect_tls ──ok──────────────────────────────┐
//!      │ err                                     ▼
//!      └─► connect_plain ─► EHLO ─► STARTTLS ─► EHLO ─► [AUTH] ─► MAIL ─► RCPT* ─► DATA ─► QUIT
//! ```
//!
//! Plaintext delivery is never attempted: a relay that offers neither
//! implicit TLS nor STARTTLS fails the attempt.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::addr::split_host_port;
use crate::connection::{Client, Connected, Connector, SmtpStream};
use crate::error::{Error, Result};
use crate::identity::local_identity;
use crate::types::Address;

/// Username/password pair for `AUTH PLAIN`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Secret.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One message ready for submission.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    /// Relay authority as produced by [`join_host_port`](crate::addr::join_host_port).
    pub addr: &'a str,
    /// Credentials, when the relay requires authentication.
    pub credentials: Option<&'a Credentials>,
    /// Envelope sender.
    pub from: &'a str,
    /// Envelope recipients, in order.
    pub recipients: &'a [String],
    /// Fully framed RFC 5322 message.
    pub payload: &'a [u8],
}

impl Envelope<'_> {
    /// Checks the relay address, sender and recipients without dialing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRelay`] for an unusable `addr` and
    /// [`Error::InvalidAddress`] for a bad sender, a bad recipient or an
    /// empty recipient list.
    pub fn validate(&self) -> Result<()> {
        split_host_port(self.addr)?;
        self.addresses().map(|_| ())
    }

    fn addresses(&self) -> Result<(Address, Vec<Address>)> {
        let from = Address::new(self.from)?;
        let recipients = self
            .recipients
            .iter()
            .map(Address::new)
            .collect::<Result<Vec<_>>>()?;
        if recipients.is_empty() {
            return Err(Error::InvalidAddress("No recipients specified".into()));
        }
        Ok((from, recipients))
    }
}

/// Delivers one message, negotiating TLS as described in the module docs.
///
/// # Errors
///
/// Returns an error if an address is unusable, no secure channel can be
/// established, or the relay rejects any step up to and including the end of
/// DATA. A failed QUIT after the message was accepted is not an error.
pub async fn deliver(envelope: &Envelope<'_>, connector: &Connector) -> Result<()> {
    let (host, _) = split_host_port(envelope.addr)?;
    let (from, recipients) = envelope.addresses()?;

    let identity = local_identity();
    let submission = Submission {
        identity: &identity,
        credentials: envelope.credentials,
        from,
        recipients,
        payload: envelope.payload,
    };

    let stream = match connector.connect_tls(envelope.addr, host).await {
        Ok(stream) => {
            tracing::debug!(addr = envelope.addr, "implicit TLS established");
            stream
        }
        Err(e) => {
            tracing::debug!(addr = envelope.addr, error = %e, "implicit TLS failed, trying STARTTLS");
            connector.connect_plain(envelope.addr).await?
        }
    };

    negotiate(stream, host, connector, submission).await
}

/// Validated envelope plus the identity to announce.
struct Submission<'a> {
    identity: &'a str,
    credentials: Option<&'a Credentials>,
    from: Address,
    recipients: Vec<Address>,
    payload: &'a [u8],
}

async fn negotiate(
    stream: SmtpStream,
    host: &str,
    connector: &Connector,
    submission: Submission<'_>,
) -> Result<()> {
    let secured = stream.is_tls();
    let client = Client::from_stream(stream).await?;
    tracing::debug!(relay = %client.server_info().hostname, secured, "greeting received");
    let mut client = client.hello(submission.identity).await?;

    if !secured {
        client = client
            .starttls(connector, host)
            .await?
            .hello(submission.identity)
            .await?;
        tracing::debug!(host, "STARTTLS upgrade complete");
    }

    transmit(client, submission).await
}

/// Runs AUTH through QUIT on an announced (and secured) session.
async fn transmit<S>(client: Client<S, Connected>, submission: Submission<'_>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut recipients = submission.recipients.into_iter();
    let Some(first) = recipients.next() else {
        return Err(Error::InvalidAddress("No recipients specified".into()));
    };

    let client = match submission.credentials {
        Some(creds) => {
            client
                .auth_plain(&creds.username, &creds.password)
                .await?
                .mail_from(submission.from)
                .await?
        }
        None => client.mail_from(submission.from).await?,
    };

    let mut client = client.rcpt_to(first).await?;
    for rcpt in recipients {
        client = client.rcpt_to(rcpt).await?;
    }

    let client = client.data().await?.send_message(submission.payload).await?;

    // The relay has committed the message; a retry here would duplicate it.
    if let Err(e) = client.quit().await {
        tracing::debug!(error = %e, "QUIT failed after message was accepted");
    }
    Ok(())
}
