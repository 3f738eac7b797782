//! Relay connections: plain TCP or TLS, established under a dial timeout.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::error::{Error, Result};

/// Dial timeout used when none is configured.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(TcpStream),
    /// TLS-encrypted connection.
    Tls(Box<TlsStream<TcpStream>>),
}

impl SmtpStream {
    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for SmtpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SmtpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Opens relay connections.
///
/// Holds the dial timeout and the TLS client configuration so callers can
/// substitute their own trust roots.
#[derive(Clone)]
pub struct Connector {
    dial_timeout: Duration,
    tls: TlsConnector,
}

impl Connector {
    /// Creates a connector trusting the bundled web PKI roots.
    #[must_use]
    pub fn new(dial_timeout: Duration) -> Self {
        Self::with_tls_config(dial_timeout, default_tls_config())
    }

    /// Creates a connector with a caller-supplied TLS configuration.
    #[must_use]
    pub fn with_tls_config(dial_timeout: Duration, config: Arc<ClientConfig>) -> Self {
        Self {
            dial_timeout,
            tls: TlsConnector::from(config),
        }
    }

    /// Returns the dial timeout.
    #[must_use]
    pub const fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    /// Opens a plain TCP connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or the dial timeout elapses.
    pub async fn connect_plain(&self, addr: &str) -> Result<SmtpStream> {
        let tcp = self
            .bounded(async { Ok::<_, Error>(TcpStream::connect(addr).await?) })
            .await?;
        Ok(SmtpStream::Tcp(tcp))
    }

    /// Opens a TLS connection from the first byte (implicit TLS).
    ///
    /// The TCP connect and the handshake share the dial timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or TLS handshake fails, or the
    /// dial timeout elapses.
    pub async fn connect_tls(&self, addr: &str, host: &str) -> Result<SmtpStream> {
        let server_name = server_name(host)?;
        let tls = self
            .bounded(async {
                let tcp = TcpStream::connect(addr).await?;
                Ok::<_, Error>(self.tls.connect(server_name, tcp).await?)
            })
            .await?;
        Ok(SmtpStream::Tls(Box::new(tls)))
    }

    /// Upgrades a TCP stream to TLS after a successful STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already TLS or the handshake fails.
    pub async fn upgrade(&self, stream: SmtpStream, host: &str) -> Result<SmtpStream> {
        let SmtpStream::Tcp(tcp) = stream else {
            return Err(Error::Protocol("Already using TLS".into()));
        };
        let tls = self.tls.connect(server_name(host)?, tcp).await?;
        Ok(SmtpStream::Tls(Box::new(tls)))
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.dial_timeout, fut)
            .await
            .map_err(|_| Error::Timeout(self.dial_timeout))?
    }
}

impl Default for Connector {
    fn default() -> Self {
        Self::new(DEFAULT_DIAL_TIMEOUT)
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("dial_timeout", &self.dial_timeout)
            .finish_non_exhaustive()
    }
}

fn server_name(host: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {host}")))
}

/// Creates a TLS client configuration with the bundled web PKI roots.
#[must_use]
pub fn default_tls_config() -> Arc<ClientConfig> {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}
