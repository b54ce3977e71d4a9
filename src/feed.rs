//! STOMP session over a [`WebSocketClient`].
//!
//! DESIGN
//! ======
//! The session owns no I/O. It plugs three callbacks into the client and
//! turns every decoded frame into a [`FeedEvent`] on an unbounded channel,
//! where `main` (or a test) consumes it. The network topology consumer sits
//! behind that channel and only ever sees `Message` events.
//!
//! LIFECYCLE
//! =========
//! 1. Open → send `STOMP` (accept-version 1.2, host, optional login)
//! 2. `CONNECTED` → `Connected`, then `SUBSCRIBE` when a destination is set
//! 3. `MESSAGE` / `ERROR` / `RECEIPT` → matching events
//! 4. Unparseable payload → `Rejected`, session continues

use stomp::{Command, Frame, HeaderName, Headers, StompError};
use tokio::sync::mpsc;
use uuid::Uuid;
use wsclient::{TransportError, WebSocketClient};

use crate::config::{Credentials, FeedConfig};

/// Only protocol version offered in `accept-version`.
pub const STOMP_VERSION: &str = "1.2";

/// What the session needs beyond the transport target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    /// Virtual host named in the `STOMP` frame.
    pub host: String,
    pub credentials: Option<Credentials>,
    pub destination: Option<String>,
}

impl From<&FeedConfig> for SessionOptions {
    fn from(config: &FeedConfig) -> Self {
        Self {
            host: config.host.clone(),
            credentials: config.credentials.clone(),
            destination: config.destination.clone(),
        }
    }
}

#[derive(Debug)]
pub enum FeedEvent {
    /// The broker accepted the session.
    Connected { version: String, session: Option<String> },
    /// A `SUBSCRIBE` frame for `destination` was written.
    Subscribed { destination: String, id: String },
    Message { destination: String, body: String },
    Error { message: String },
    Receipt { id: String },
    /// A payload that is not a valid STOMP frame.
    Rejected(StompError),
    ConnectFailed(TransportError),
    Disconnected(TransportError),
}

/// Attach a STOMP session to `client` and start connecting.
pub fn start(client: &WebSocketClient, options: SessionOptions, events: mpsc::UnboundedSender<FeedEvent>) {
    let on_connect = {
        let client = client.clone();
        let options = options.clone();
        let events = events.clone();
        move |result: Result<(), TransportError>| match result {
            Ok(()) => send_frame(&client, Command::Stomp, &connect_headers(&options)),
            Err(error) => {
                tracing::warn!(%error, "feed connection failed");
                let _ = events.send(FeedEvent::ConnectFailed(error));
            }
        }
    };

    let on_message = {
        let client = client.clone();
        let events = events.clone();
        move |payload: String| handle_payload(&client, &options, &events, &payload)
    };

    let on_disconnect = move |error: TransportError| {
        tracing::info!(%error, "feed disconnected");
        let _ = events.send(FeedEvent::Disconnected(error));
    };

    client.connect(on_connect, on_message, on_disconnect);
}

fn handle_payload(
    client: &WebSocketClient,
    options: &SessionOptions,
    events: &mpsc::UnboundedSender<FeedEvent>,
    payload: &str,
) {
    let frame = match Frame::parse(payload.as_bytes()) {
        Ok(frame) => frame,
        Err(error) => {
            tracing::warn!(%error, len = payload.len(), "rejected inbound frame");
            let _ = events.send(FeedEvent::Rejected(error));
            return;
        }
    };

    let event = match frame.command() {
        Command::Connected => {
            let version = frame.header(HeaderName::Version).unwrap_or_default().to_owned();
            let session = frame.header(HeaderName::Session).map(str::to_owned);
            tracing::info!(%version, session = session.as_deref().unwrap_or("-"), "stomp session established");
            if let Some(destination) = &options.destination {
                subscribe(client, destination, events);
            }
            FeedEvent::Connected { version, session }
        }
        Command::Message => FeedEvent::Message {
            destination: frame.header(HeaderName::Destination).unwrap_or_default().to_owned(),
            body: String::from_utf8_lossy(frame.body()).into_owned(),
        },
        Command::Error => {
            let message = frame
                .header(HeaderName::Message)
                .map_or_else(|| String::from_utf8_lossy(frame.body()).into_owned(), str::to_owned);
            tracing::warn!(%message, "broker sent ERROR");
            FeedEvent::Error { message }
        }
        Command::Receipt => FeedEvent::Receipt {
            id: frame.header(HeaderName::ReceiptId).unwrap_or_default().to_owned(),
        },
        other => {
            tracing::debug!(command = %other, "ignoring unexpected frame");
            return;
        }
    };
    let _ = events.send(event);
}

fn connect_headers(options: &SessionOptions) -> Headers {
    let mut headers = Headers::new();
    headers.insert(HeaderName::AcceptVersion, STOMP_VERSION.to_owned());
    headers.insert(HeaderName::Host, options.host.clone());
    if let Some(credentials) = &options.credentials {
        headers.insert(HeaderName::Login, credentials.login.clone());
        headers.insert(HeaderName::Passcode, credentials.passcode.clone());
    }
    headers
}

fn subscribe(client: &WebSocketClient, destination: &str, events: &mpsc::UnboundedSender<FeedEvent>) {
    let id = Uuid::new_v4().to_string();
    let mut headers = Headers::new();
    headers.insert(HeaderName::Destination, destination.to_owned());
    headers.insert(HeaderName::Id, id.clone());
    headers.insert(HeaderName::Ack, "auto".to_owned());

    let text = match encode(Command::Subscribe, &headers) {
        Ok(text) => text,
        Err(error) => {
            tracing::error!(%error, %destination, "could not encode SUBSCRIBE");
            return;
        }
    };

    let events = events.clone();
    let destination = destination.to_owned();
    client.send(text, move |result| match result {
        Ok(_) => {
            tracing::info!(%destination, %id, "subscribed");
            let _ = events.send(FeedEvent::Subscribed { destination, id });
        }
        Err(error) => tracing::warn!(%error, %destination, "SUBSCRIBE write failed"),
    });
}

fn send_frame(client: &WebSocketClient, command: Command, headers: &Headers) {
    match encode(command, headers) {
        Ok(text) => client.send(text, move |result| {
            if let Err(error) = result {
                tracing::warn!(%error, %command, "frame write failed");
            }
        }),
        Err(error) => {
            tracing::error!(%error, %command, "could not encode frame; closing");
            client.close(|_| {});
        }
    }
}

fn encode(command: Command, headers: &Headers) -> Result<String, StompError> {
    let bytes = stomp::serialize(command, headers, b"")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
