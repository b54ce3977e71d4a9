use std::io;
use std::time::Duration;

use tokio_rustls::rustls;
use tokio_tungstenite::tungstenite;

/// Failure delivered to a [`WebSocketClient`](crate::WebSocketClient)
/// callback or returned by a transport capability.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Resolution succeeded with no addresses.
    #[error("host not found: {0}")]
    HostNotFound(String),
    /// The resolver itself failed.
    #[error("name resolution failed: {0}")]
    Resolve(#[source] io::Error),
    /// TCP connect did not finish within the connect timeout.
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
    /// Socket failure outside the TLS handshake.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    /// The host is not a valid TLS server name.
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),
    /// rustls rejected the client configuration.
    #[error("TLS configuration error: {0}")]
    TlsConfig(#[from] rustls::Error),
    /// The CA bundle could not be read or parsed.
    #[error("failed to load CA certificates: {0}")]
    CaCertificate(#[source] io::Error),
    /// The TLS handshake failed.
    #[error("TLS handshake failed: {0}")]
    Tls(#[source] io::Error),
    /// Upgrade or framing failure from tungstenite.
    #[error("websocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),
    /// The peer closed the connection.
    #[error("connection closed")]
    Closed,
    /// The read loop was stopped by a local close.
    #[error("operation cancelled")]
    Cancelled,
    /// `send` or `close` while the connection is not open.
    #[error("not connected")]
    NotConnected,
    /// `connect` was already called on this client.
    #[error("connect already called on this client")]
    AlreadyStarted,
    /// A stream capability was called out of stage order.
    #[error("invalid stream state: {0}")]
    InvalidState(&'static str),
}

impl TransportError {
    /// True when the error marks a locally initiated cancellation rather
    /// than a transport fault.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<tungstenite::Error> for TransportError {
    fn from(error: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(error))
    }
}
