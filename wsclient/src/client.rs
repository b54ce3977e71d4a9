//! Callback-driven secure WebSocket client.
//!
//! DESIGN
//! ======
//! A [`WebSocketClient`] is a cheap handle over shared single-threaded state.
//! `connect` spawns one local driver task that owns the resolver, the stream
//! and the read buffer for the whole life of the connection. `send` and
//! `close` never touch the stream; they queue an operation for the driver,
//! or, when the client is not open, complete their callback with
//! `NotConnected` on a fresh local task.
//!
//! LIFECYCLE
//! =========
//! 1. `connect` → Resolving, spawn driver
//! 2. Driver: resolve → connect (timeout) → TLS → WebSocket → Open
//! 3. Open: `select!` over queued operations and the next read
//! 4. Local close → Closed and `on_disconnect(Cancelled)`
//! 5. Any other read error → Errored, loop stops, `on_disconnect` is not called
//!
//! Every callback runs on the `LocalSet` that drives the client, so no two
//! callbacks of one client ever run at the same time.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::error::TransportError;
use crate::state::ConnectionState;
use crate::transport::{Resolver, WsStream};

/// Connect timeout used unless overridden.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const CLOSE_REASON: &str = "client closing";

type OnConnect = Box<dyn FnOnce(Result<(), TransportError>)>;
type OnMessage = Box<dyn FnMut(String)>;
type OnDisconnect = Box<dyn FnOnce(TransportError)>;
type OnSend = Box<dyn FnOnce(Result<usize, TransportError>)>;
type OnClose = Box<dyn FnOnce(Result<(), TransportError>)>;

/// Where to connect: `wss://{host}:{port}{path}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub path: String,
    pub port: u16,
}

impl Target {
    /// `path` is the request path of the upgrade, starting with `/`.
    #[must_use]
    pub fn new(host: impl Into<String>, path: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            port,
        }
    }
}

// =============================================================================
// HANDLE
// =============================================================================

struct Transport {
    resolver: Box<dyn Resolver>,
    stream: Box<dyn WsStream>,
}

enum Op {
    Send { message: String, on_send: OnSend },
    Close { on_close: OnClose },
}

impl Op {
    fn reject(self, error: TransportError) {
        match self {
            Self::Send { on_send, .. } => on_send(Err(error)),
            Self::Close { on_close } => on_close(Err(error)),
        }
    }
}

struct Inner {
    target: Target,
    connect_timeout: Cell<Duration>,
    state: watch::Sender<ConnectionState>,
    transport: RefCell<Option<Transport>>,
    ops: RefCell<Option<mpsc::UnboundedSender<Op>>>,
}

impl Inner {
    fn advance(&self, next: ConnectionState) {
        let mut previous = next;
        let moved = self.state.send_if_modified(|state| {
            previous = *state;
            if state.can_advance_to(next) {
                *state = next;
                true
            } else {
                false
            }
        });
        if moved {
            tracing::debug!(host = %self.target.host, from = %previous, to = %next, "connection state changed");
        } else {
            tracing::warn!(host = %self.target.host, from = %previous, to = %next, "ignored illegal state transition");
        }
    }

    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }
}

/// Single-use secure WebSocket connection with completion callbacks.
///
/// Clones share the same connection. Must be used from inside a
/// [`tokio::task::LocalSet`].
#[derive(Clone)]
pub struct WebSocketClient {
    inner: Rc<Inner>,
}

impl WebSocketClient {
    /// An idle client for `target`. Nothing touches the network until
    /// [`connect`](Self::connect).
    #[must_use]
    pub fn new(target: Target, resolver: impl Resolver + 'static, stream: impl WsStream + 'static) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            inner: Rc::new(Inner {
                target,
                connect_timeout: Cell::new(DEFAULT_CONNECT_TIMEOUT),
                state,
                transport: RefCell::new(Some(Transport {
                    resolver: Box::new(resolver),
                    stream: Box::new(stream),
                })),
                ops: RefCell::new(None),
            }),
        }
    }

    /// Bound on the TCP connect stage. Takes effect for a later `connect`.
    #[must_use]
    pub fn with_connect_timeout(self, timeout: Duration) -> Self {
        self.inner.connect_timeout.set(timeout);
        self
    }

    /// Where this client connects.
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.inner.target
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Receiver that observes every state change, including the silent
    /// move to `Errored` when the read loop dies.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Start the single connection attempt.
    ///
    /// `on_connect` fires exactly once. `on_message` fires once per received
    /// message while the connection is open. `on_disconnect` fires at most
    /// once, and only when the read loop is stopped by [`close`](Self::close).
    ///
    /// A second call completes its own `on_connect` with
    /// [`TransportError::AlreadyStarted`] and leaves the first attempt alone.
    pub fn connect<C, M, D>(&self, on_connect: C, on_message: M, on_disconnect: D)
    where
        C: FnOnce(Result<(), TransportError>) + 'static,
        M: FnMut(String) + 'static,
        D: FnOnce(TransportError) + 'static,
    {
        let transport = if self.state() == ConnectionState::Idle {
            self.inner.transport.borrow_mut().take()
        } else {
            None
        };
        let Some(transport) = transport else {
            tracing::warn!(host = %self.inner.target.host, "connect called twice on one client");
            tokio::task::spawn_local(async move { on_connect(Err(TransportError::AlreadyStarted)) });
            return;
        };

        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        *self.inner.ops.borrow_mut() = Some(ops_tx);
        self.inner.advance(ConnectionState::Resolving);

        tokio::task::spawn_local(drive(
            Rc::clone(&self.inner),
            transport,
            ops_rx,
            Box::new(on_connect),
            Box::new(on_message),
            Box::new(on_disconnect),
        ));
    }

    /// Send one text message. `on_send` receives the number of bytes
    /// written, or `NotConnected` when the client is not open.
    pub fn send<F>(&self, message: impl Into<String>, on_send: F)
    where
        F: FnOnce(Result<usize, TransportError>) + 'static,
    {
        self.submit(Op::Send {
            message: message.into(),
            on_send: Box::new(on_send),
        });
    }

    /// Run the close handshake. Stops the read loop, which then reports
    /// `Cancelled` through `on_disconnect`.
    pub fn close<F>(&self, on_close: F)
    where
        F: FnOnce(Result<(), TransportError>) + 'static,
    {
        self.submit(Op::Close {
            on_close: Box::new(on_close),
        });
    }

    fn submit(&self, op: Op) {
        let op = match self.inner.ops.borrow().as_ref() {
            Some(ops) if self.state() == ConnectionState::Open => {
                let closing = matches!(op, Op::Close { .. });
                match ops.send(op) {
                    Ok(()) => {
                        if closing {
                            self.inner.advance(ConnectionState::Closing);
                        }
                        return;
                    }
                    Err(mpsc::error::SendError(op)) => op,
                }
            }
            _ => op,
        };
        tokio::task::spawn_local(async move { op.reject(TransportError::NotConnected) });
    }
}

// =============================================================================
// DRIVER
// =============================================================================

async fn drive(
    inner: Rc<Inner>,
    mut transport: Transport,
    mut ops: mpsc::UnboundedReceiver<Op>,
    on_connect: OnConnect,
    mut on_message: OnMessage,
    on_disconnect: OnDisconnect,
) {
    if let Err(error) = establish(&inner, &mut transport).await {
        inner.advance(ConnectionState::Errored);
        on_connect(Err(error));
        drain(&inner, &mut ops);
        return;
    }

    inner.advance(ConnectionState::Open);
    tracing::info!(host = %inner.target.host, path = %inner.target.path, "websocket connection open");
    on_connect(Ok(()));

    let mut on_disconnect = Some(on_disconnect);
    let mut buffer = Vec::new();
    let stream = &mut transport.stream;

    loop {
        buffer.clear();
        tokio::select! {
            biased;
            op = ops.recv() => {
                let Some(op) = op else { break };
                match op {
                    Op::Send { message, on_send } => {
                        let result = stream.write(&message).await;
                        if let Err(error) = &result {
                            tracing::warn!(%error, "websocket write failed");
                        }
                        on_send(result);
                    }
                    Op::Close { on_close } => {
                        let result = stream.close(CLOSE_REASON).await;
                        inner.advance(if result.is_ok() { ConnectionState::Closed } else { ConnectionState::Errored });
                        on_close(result);
                        if let Some(on_disconnect) = on_disconnect.take() {
                            on_disconnect(TransportError::Cancelled);
                        }
                        break;
                    }
                }
            }
            read = stream.read(&mut buffer) => match read {
                Ok(_) => match String::from_utf8(std::mem::take(&mut buffer)) {
                    Ok(message) => on_message(message),
                    Err(error) => tracing::warn!(%error, "dropping non-UTF-8 websocket payload"),
                },
                Err(error) if error.is_cancelled() => {
                    inner.advance(ConnectionState::Closed);
                    if let Some(on_disconnect) = on_disconnect.take() {
                        on_disconnect(error);
                    }
                    break;
                }
                Err(error) => {
                    tracing::warn!(host = %inner.target.host, %error, "read loop stopped");
                    inner.advance(ConnectionState::Errored);
                    break;
                }
            },
        }
    }

    drain(&inner, &mut ops);
}

async fn establish(inner: &Inner, transport: &mut Transport) -> Result<(), TransportError> {
    let target = &inner.target;
    let service = target.port.to_string();

    let addresses = transport
        .resolver
        .resolve(&target.host, &service)
        .await
        .inspect_err(|error| stage_failed("resolve", target, error))?;
    let Some(&address) = addresses.first() else {
        let error = TransportError::HostNotFound(target.host.clone());
        stage_failed("resolve", target, &error);
        return Err(error);
    };

    inner.advance(ConnectionState::Connecting);
    let limit = inner.connect_timeout.get();
    tokio::time::timeout(limit, transport.stream.connect(address))
        .await
        .unwrap_or(Err(TransportError::Timeout(limit)))
        .inspect_err(|error| stage_failed("connect", target, error))?;
    tracing::debug!(%address, "tcp connected");

    inner.advance(ConnectionState::TlsHandshaking);
    transport
        .stream
        .tls_handshake(&target.host)
        .await
        .inspect_err(|error| stage_failed("tls", target, error))?;

    inner.advance(ConnectionState::WsHandshaking);
    transport
        .stream
        .ws_handshake(&target.host, &target.path)
        .await
        .inspect_err(|error| stage_failed("websocket", target, error))?;

    Ok(())
}

fn stage_failed(stage: &'static str, target: &Target, error: &TransportError) {
    tracing::warn!(stage, host = %target.host, port = target.port, %error, "connection stage failed");
}

/// Refuse further operations and fail whatever is still queued.
fn drain(inner: &Inner, ops: &mut mpsc::UnboundedReceiver<Op>) {
    inner.ops.borrow_mut().take();
    ops.close();
    while let Ok(op) = ops.try_recv() {
        op.reject(TransportError::NotConnected);
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
