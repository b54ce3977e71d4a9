//! Capability seams the connection state machine drives.
//!
//! Production code plugs in [`DnsResolver`](crate::DnsResolver) and
//! [`TlsWebSocketStream`](crate::TlsWebSocketStream); tests plug in the
//! doubles from [`mock`](crate::mock). Every method completes exactly once
//! and is awaited on the task that owns the connection, so neither trait
//! needs `Send`.

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::TransportError;

/// Name resolution for the connect target.
#[async_trait(?Send)]
pub trait Resolver {
    /// Resolve `host` and `service` (a port number) to candidate addresses.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::HostNotFound`] when the name has no
    /// addresses, or [`TransportError::Resolve`] when the lookup itself fails.
    async fn resolve(&mut self, host: &str, service: &str) -> Result<Vec<SocketAddr>, TransportError>;
}

/// Layered byte stream: TCP, then TLS, then WebSocket framing.
///
/// The layers are established strictly in call order. After
/// [`ws_handshake`](Self::ws_handshake) one call to
/// [`write`](Self::write) sends one text message and one call to
/// [`read`](Self::read) receives one.
#[async_trait(?Send)]
pub trait WsStream {
    /// Open the TCP connection.
    ///
    /// # Errors
    ///
    /// Returns the socket error from the connect attempt.
    async fn connect(&mut self, address: SocketAddr) -> Result<(), TransportError>;

    /// Run the TLS client handshake, using `server_name` for SNI and
    /// certificate verification.
    ///
    /// # Errors
    ///
    /// Returns an error when the name is invalid or the handshake fails.
    async fn tls_handshake(&mut self, server_name: &str) -> Result<(), TransportError>;

    /// Upgrade to WebSocket against `host` and `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the server rejects the upgrade.
    async fn ws_handshake(&mut self, host: &str, path: &str) -> Result<(), TransportError>;

    /// Send `message` as one text message and return the bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream is not open or the write fails.
    async fn write(&mut self, message: &str) -> Result<usize, TransportError>;

    /// Wait for the next message and append its payload to `buffer`,
    /// returning the number of bytes appended.
    ///
    /// Must be cancel-safe: dropping the future before it completes loses
    /// no data.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] once the peer has closed, or the
    /// transport error that ended the stream.
    async fn read(&mut self, buffer: &mut Vec<u8>) -> Result<usize, TransportError>;

    /// Run the WebSocket close handshake.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream is not open or the close fails.
    async fn close(&mut self, reason: &str) -> Result<(), TransportError>;
}
