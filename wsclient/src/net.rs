//! Production transport: tokio DNS, TCP, rustls and tungstenite.

use std::fs::File;
use std::io::BufReader;
use std::mem;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{self, ClientConfig, RootCertStore};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::error::TransportError;
use crate::transport::{Resolver, WsStream};

type SecureWebSocket = WebSocketStream<TlsStream<TcpStream>>;

// =============================================================================
// RESOLVER
// =============================================================================

/// System resolver backed by `tokio::net::lookup_host`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DnsResolver;

#[async_trait(?Send)]
impl Resolver for DnsResolver {
    async fn resolve(&mut self, host: &str, service: &str) -> Result<Vec<SocketAddr>, TransportError> {
        let addresses: Vec<SocketAddr> = tokio::net::lookup_host(format!("{host}:{service}"))
            .await
            .map_err(TransportError::Resolve)?
            .collect();
        if addresses.is_empty() {
            return Err(TransportError::HostNotFound(host.to_owned()));
        }
        tracing::debug!(%host, count = addresses.len(), "resolved host");
        Ok(addresses)
    }
}

// =============================================================================
// STREAM
// =============================================================================

enum Layer {
    Idle,
    Tcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    WebSocket(Box<SecureWebSocket>),
    Closed,
}

/// `wss://` stream: TCP, then rustls, then a tungstenite client handshake.
pub struct TlsWebSocketStream {
    tls: Arc<ClientConfig>,
    layer: Layer,
}

impl TlsWebSocketStream {
    /// A stream that will use `tls` for its handshake.
    #[must_use]
    pub fn new(tls: Arc<ClientConfig>) -> Self {
        Self { tls, layer: Layer::Idle }
    }

    fn websocket(&mut self) -> Result<&mut SecureWebSocket, TransportError> {
        match &mut self.layer {
            Layer::WebSocket(ws) => Ok(ws),
            Layer::Closed => Err(TransportError::Closed),
            _ => Err(TransportError::NotConnected),
        }
    }
}

#[async_trait(?Send)]
impl WsStream for TlsWebSocketStream {
    async fn connect(&mut self, address: SocketAddr) -> Result<(), TransportError> {
        if !matches!(self.layer, Layer::Idle) {
            return Err(TransportError::InvalidState("connect on a stream that is already in use"));
        }
        let tcp = TcpStream::connect(address).await?;
        tcp.set_nodelay(true)?;
        self.layer = Layer::Tcp(tcp);
        Ok(())
    }

    async fn tls_handshake(&mut self, server_name: &str) -> Result<(), TransportError> {
        let tcp = match mem::replace(&mut self.layer, Layer::Closed) {
            Layer::Tcp(tcp) => tcp,
            other => {
                self.layer = other;
                return Err(TransportError::InvalidState("TLS handshake before TCP connect"));
            }
        };
        let name = ServerName::try_from(server_name.to_owned())
            .map_err(|_| TransportError::InvalidServerName(server_name.to_owned()))?;
        let tls = TlsConnector::from(Arc::clone(&self.tls))
            .connect(name, tcp)
            .await
            .map_err(TransportError::Tls)?;
        self.layer = Layer::Tls(Box::new(tls));
        Ok(())
    }

    async fn ws_handshake(&mut self, host: &str, path: &str) -> Result<(), TransportError> {
        let tls = match mem::replace(&mut self.layer, Layer::Closed) {
            Layer::Tls(tls) => tls,
            other => {
                self.layer = other;
                return Err(TransportError::InvalidState("websocket handshake before TLS"));
            }
        };
        let (ws, response) = tokio_tungstenite::client_async(format!("wss://{host}{path}"), *tls).await?;
        tracing::debug!(status = %response.status(), %host, %path, "websocket upgrade accepted");
        self.layer = Layer::WebSocket(Box::new(ws));
        Ok(())
    }

    async fn write(&mut self, message: &str) -> Result<usize, TransportError> {
        let ws = self.websocket()?;
        ws.send(Message::text(message.to_owned())).await?;
        Ok(message.len())
    }

    async fn read(&mut self, buffer: &mut Vec<u8>) -> Result<usize, TransportError> {
        let ws = self.websocket()?;
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    buffer.extend_from_slice(text.as_bytes());
                    return Ok(text.len());
                }
                Some(Ok(Message::Binary(bytes))) => {
                    buffer.extend_from_slice(&bytes);
                    return Ok(bytes.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(?frame, "server closed websocket");
                    return Err(TransportError::Closed);
                }
                // Ping, Pong and raw frames; tungstenite answers pings itself.
                Some(Ok(_)) => {}
                Some(Err(error)) => return Err(error.into()),
                None => return Err(TransportError::Closed),
            }
        }
    }

    async fn close(&mut self, reason: &str) -> Result<(), TransportError> {
        let ws = self.websocket()?;
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: reason.to_owned().into(),
        };
        let result = ws.close(Some(frame)).await;
        self.layer = Layer::Closed;
        result.map_err(TransportError::from)
    }
}

// =============================================================================
// TLS CONFIG
// =============================================================================

/// Client TLS config trusting the webpki roots plus, optionally, every
/// certificate in the PEM bundle at `ca_file`.
///
/// # Errors
///
/// Returns [`TransportError::CaCertificate`] when the bundle cannot be read
/// and [`TransportError::TlsConfig`] when rustls rejects a certificate.
pub fn client_tls_config(ca_file: Option<&Path>) -> Result<Arc<ClientConfig>, TransportError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(path) = ca_file {
        let file = File::open(path).map_err(TransportError::CaCertificate)?;
        let mut added = 0usize;
        for cert in rustls_pemfile::certs(&mut BufReader::new(file)) {
            roots.add(cert.map_err(TransportError::CaCertificate)?)?;
            added += 1;
        }
        tracing::info!(path = %path.display(), added, "loaded CA bundle");
    }

    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tls_config_builds_from_webpki_roots() {
        client_tls_config(None).expect("tls config");
    }

    #[test]
    fn missing_ca_bundle_is_reported() {
        let err = client_tls_config(Some(Path::new("/nonexistent/netmon-ca.pem"))).expect_err("bundle should be missing");
        assert!(matches!(err, TransportError::CaCertificate(_)));
    }

    #[tokio::test]
    async fn fresh_stream_refuses_io_before_handshake() {
        let mut stream = TlsWebSocketStream::new(client_tls_config(None).expect("tls config"));
        let mut buffer = Vec::new();
        assert!(matches!(stream.read(&mut buffer).await, Err(TransportError::NotConnected)));
        assert!(matches!(stream.write("x").await, Err(TransportError::NotConnected)));
        assert!(matches!(
            stream.tls_handshake("example.com").await,
            Err(TransportError::InvalidState(_))
        ));
    }
}
