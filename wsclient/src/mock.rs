//! Deterministic transport doubles.
//!
//! Both doubles append every call they receive to a shared [`Journal`], so a
//! test can assert exactly which stages ran and in what order. Reads are fed
//! through a [`ReadFeed`]; once the feed is drained, `read` stays pending
//! until the caller drops it, the same way an idle socket behaves.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::transport::{Resolver, WsStream};

/// One recorded capability call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Resolve { host: String, service: String },
    Connect(SocketAddr),
    TlsHandshake(String),
    WsHandshake { host: String, path: String },
    Write(String),
    Close,
}

/// Ordered record of calls, shared between doubles and the test.
#[derive(Clone, Debug, Default)]
pub struct Journal(Rc<RefCell<Vec<Call>>>);

impl Journal {
    fn record(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    /// Payloads of every `write` seen so far.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Write(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

pub struct MockResolver {
    journal: Journal,
    outcome: Option<Result<Vec<SocketAddr>, TransportError>>,
}

impl MockResolver {
    #[must_use]
    pub fn resolving_to(journal: &Journal, addresses: Vec<SocketAddr>) -> Self {
        Self {
            journal: journal.clone(),
            outcome: Some(Ok(addresses)),
        }
    }

    #[must_use]
    pub fn failing(journal: &Journal, error: TransportError) -> Self {
        Self {
            journal: journal.clone(),
            outcome: Some(Err(error)),
        }
    }
}

#[async_trait(?Send)]
impl Resolver for MockResolver {
    async fn resolve(&mut self, host: &str, service: &str) -> Result<Vec<SocketAddr>, TransportError> {
        self.journal.record(Call::Resolve {
            host: host.to_owned(),
            service: service.to_owned(),
        });
        self.outcome
            .take()
            .unwrap_or_else(|| Err(TransportError::InvalidState("mock resolver called twice")))
    }
}

// =============================================================================
// STREAM
// =============================================================================

/// Test side of a [`MockStream`]'s read queue.
#[derive(Clone)]
pub struct ReadFeed(mpsc::UnboundedSender<Result<Vec<u8>, TransportError>>);

impl ReadFeed {
    /// Queue one text message.
    pub fn push(&self, message: &str) {
        self.push_bytes(message.as_bytes());
    }

    /// Queue one message with an arbitrary payload.
    pub fn push_bytes(&self, payload: &[u8]) {
        let _ = self.0.send(Ok(payload.to_vec()));
    }

    /// Queue a read failure.
    pub fn fail(&self, error: TransportError) {
        let _ = self.0.send(Err(error));
    }
}

#[derive(Default)]
struct Faults {
    connect: Option<TransportError>,
    hang_connect: bool,
    tls: Option<TransportError>,
    ws: Option<TransportError>,
    write: Option<TransportError>,
    close: Option<TransportError>,
}

pub struct MockStream {
    journal: Journal,
    reads: mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>,
    faults: Faults,
    closed: bool,
}

impl MockStream {
    /// A stream whose every stage succeeds, plus the feed for its reads.
    #[must_use]
    pub fn new(journal: &Journal) -> (Self, ReadFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = Self {
            journal: journal.clone(),
            reads: rx,
            faults: Faults::default(),
            closed: false,
        };
        (stream, ReadFeed(tx))
    }

    #[must_use]
    pub fn failing_connect(mut self, error: TransportError) -> Self {
        self.faults.connect = Some(error);
        self
    }

    /// `connect` never completes.
    #[must_use]
    pub fn hanging_connect(mut self) -> Self {
        self.faults.hang_connect = true;
        self
    }

    #[must_use]
    pub fn failing_tls(mut self, error: TransportError) -> Self {
        self.faults.tls = Some(error);
        self
    }

    #[must_use]
    pub fn failing_ws(mut self, error: TransportError) -> Self {
        self.faults.ws = Some(error);
        self
    }

    /// The next `write` fails; later writes succeed again.
    #[must_use]
    pub fn failing_write(mut self, error: TransportError) -> Self {
        self.faults.write = Some(error);
        self
    }

    #[must_use]
    pub fn failing_close(mut self, error: TransportError) -> Self {
        self.faults.close = Some(error);
        self
    }
}

fn outcome(fault: &mut Option<TransportError>) -> Result<(), TransportError> {
    fault.take().map_or(Ok(()), Err)
}

#[async_trait(?Send)]
impl WsStream for MockStream {
    async fn connect(&mut self, address: SocketAddr) -> Result<(), TransportError> {
        self.journal.record(Call::Connect(address));
        if self.faults.hang_connect {
            std::future::pending::<()>().await;
        }
        outcome(&mut self.faults.connect)
    }

    async fn tls_handshake(&mut self, server_name: &str) -> Result<(), TransportError> {
        self.journal.record(Call::TlsHandshake(server_name.to_owned()));
        outcome(&mut self.faults.tls)
    }

    async fn ws_handshake(&mut self, host: &str, path: &str) -> Result<(), TransportError> {
        self.journal.record(Call::WsHandshake {
            host: host.to_owned(),
            path: path.to_owned(),
        });
        outcome(&mut self.faults.ws)
    }

    async fn write(&mut self, message: &str) -> Result<usize, TransportError> {
        self.journal.record(Call::Write(message.to_owned()));
        if self.closed {
            return Err(TransportError::Closed);
        }
        outcome(&mut self.faults.write).map(|()| message.len())
    }

    async fn read(&mut self, buffer: &mut Vec<u8>) -> Result<usize, TransportError> {
        match self.reads.recv().await {
            Some(Ok(payload)) => {
                buffer.extend_from_slice(&payload);
                Ok(payload.len())
            }
            Some(Err(error)) => Err(error),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self, _reason: &str) -> Result<(), TransportError> {
        self.journal.record(Call::Close);
        self.closed = true;
        outcome(&mut self.faults.close)
    }
}
