mod config;
mod feed;

use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use wsclient::{ConnectionState, DnsResolver, Target, TlsWebSocketStream, TransportError, WebSocketClient};

use config::{Cli, FeedConfig};
use feed::{FeedEvent, SessionOptions};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("TLS setup failed: {0}")]
    Tls(#[from] TransportError),
    #[error("could not connect to the feed: {0}")]
    Connect(TransportError),
    #[error("broker rejected the session: {0}")]
    Broker(String),
    #[error("feed connection dropped")]
    Dropped,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt::init();

    let config = FeedConfig::try_from(Cli::parse())?;
    LocalSet::new().run_until(run(config)).await
}

async fn run(config: FeedConfig) -> Result<(), AppError> {
    let tls = wsclient::client_tls_config(config.ca_cert.as_deref())?;
    let target = Target::new(config.host.clone(), config.path.clone(), config.port);
    let client = WebSocketClient::new(target, DnsResolver, TlsWebSocketStream::new(tls))
        .with_connect_timeout(config.connect_timeout);

    let (tx, mut events) = mpsc::unbounded_channel();
    let mut states = client.watch_state();
    tracing::info!(host = %config.host, port = config.port, path = %config.path, "connecting to feed");
    feed::start(&client, SessionOptions::from(&config), tx);

    let mut listening = true;
    let mut closing = false;
    let mut failure = None;

    loop {
        tokio::select! {
            biased;
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    FeedEvent::ConnectFailed(error) => return Err(AppError::Connect(error)),
                    FeedEvent::Error { message } => {
                        failure = Some(AppError::Broker(message));
                        closing = true;
                        client.close(log_close);
                    }
                    FeedEvent::Disconnected(error) => {
                        tracing::info!(%error, "feed closed");
                        break;
                    }
                    other => log_event(other),
                }
            }
            result = tokio::signal::ctrl_c(), if listening => {
                if let Err(error) = result {
                    tracing::warn!(%error, "could not listen for interrupt");
                    listening = false;
                    continue;
                }
                let state = client.state();
                match on_interrupt(state, closing) {
                    Interrupt::Close => {
                        tracing::info!("interrupt received, closing feed");
                        closing = true;
                        client.close(log_close);
                    }
                    Interrupt::Stop => {
                        tracing::info!(%state, "interrupt received, stopping");
                        break;
                    }
                }
            }
            changed = states.wait_for(|state| state.is_terminal()) => {
                let errored = changed.map_or(true, |state| *state == ConnectionState::Errored);
                if errored && failure.is_none() {
                    failure = Some(AppError::Dropped);
                }
                break;
            }
        }
    }

    failure.map_or(Ok(()), Err)
}

/// What a Ctrl-C does to the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Interrupt {
    /// Start the close handshake and keep waiting for it.
    Close,
    /// Leave the run loop now.
    Stop,
}

/// Only an open connection can be closed gracefully. Before that, and on a
/// second interrupt while closing, the run loop stops at once.
fn on_interrupt(state: ConnectionState, closing: bool) -> Interrupt {
    if state == ConnectionState::Open && !closing {
        Interrupt::Close
    } else {
        Interrupt::Stop
    }
}

fn log_event(event: FeedEvent) {
    match event {
        FeedEvent::Connected { version, session } => {
            tracing::info!(%version, session = session.as_deref().unwrap_or("-"), "feed session open");
        }
        FeedEvent::Subscribed { destination, id } => tracing::info!(%destination, %id, "receiving network events"),
        FeedEvent::Message { destination, body } => {
            tracing::info!(%destination, bytes = body.len(), "network event");
            tracing::debug!(%body, "network event payload");
        }
        FeedEvent::Receipt { id } => tracing::debug!(%id, "receipt"),
        FeedEvent::Rejected(error) => tracing::warn!(%error, "skipping malformed frame"),
        other => tracing::debug!(?other, "feed event"),
    }
}

fn log_close(result: Result<(), TransportError>) {
    if let Err(error) = result {
        tracing::warn!(%error, "close handshake failed");
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
