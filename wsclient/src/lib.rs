//! Secure WebSocket client with callback completion.
//!
//! DESIGN
//! ======
//! The connection logic in [`WebSocketClient`] only talks to the
//! [`Resolver`] and [`WsStream`] traits. [`DnsResolver`] and
//! [`TlsWebSocketStream`] are the real network; the `mock` module (tests and
//! the `test-util` feature) swaps in scripted doubles so every stage and
//! failure path can be driven deterministically.

mod client;
mod error;
mod net;
mod state;
mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{DEFAULT_CONNECT_TIMEOUT, Target, WebSocketClient};
pub use error::TransportError;
pub use net::{DnsResolver, TlsWebSocketStream, client_tls_config};
pub use state::ConnectionState;
pub use transport::{Resolver, WsStream};
