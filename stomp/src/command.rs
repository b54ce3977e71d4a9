use std::fmt;
use std::str::FromStr;

use crate::error::StompError;
use crate::header::HeaderName;

/// STOMP frame command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Command {
    /// Roll back a transaction.
    Abort,
    /// Acknowledge a message.
    Ack,
    /// Start a transaction.
    Begin,
    /// Commit a transaction.
    Commit,
    /// Open a session (STOMP 1.0 spelling).
    Connect,
    /// Broker reply accepting a session.
    Connected,
    /// End the session.
    Disconnect,
    /// Broker-side failure report.
    Error,
    /// Payload delivered for a subscription.
    Message,
    /// Reject a message.
    Nack,
    /// Broker confirmation of a frame that asked for one.
    Receipt,
    /// Publish to a destination.
    Send,
    /// Open a session (STOMP 1.2 spelling).
    Stomp,
    /// Start receiving from a destination.
    Subscribe,
    /// Stop receiving from a subscription.
    Unsubscribe,
    /// Sentinel for unparseable input and for failed frames.
    #[default]
    Unknown,
}

impl Command {
    /// Every command that has a wire spelling.
    pub const ALL: [Self; 15] = [
        Self::Abort,
        Self::Ack,
        Self::Begin,
        Self::Commit,
        Self::Connect,
        Self::Connected,
        Self::Disconnect,
        Self::Error,
        Self::Message,
        Self::Nack,
        Self::Receipt,
        Self::Send,
        Self::Stomp,
        Self::Subscribe,
        Self::Unsubscribe,
    ];

    /// Wire spelling of the command. `Unknown` spells a token that never
    /// parses back.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abort => "ABORT",
            Self::Ack => "ACK",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Disconnect => "DISCONNECT",
            Self::Error => "ERROR",
            Self::Message => "MESSAGE",
            Self::Nack => "NACK",
            Self::Receipt => "RECEIPT",
            Self::Send => "SEND",
            Self::Stomp => "STOMP",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Unknown => "UNKNOWN COMMAND",
        }
    }

    /// Map a raw command line to a command. Matching is exact and
    /// case-sensitive; anything else is `Unknown`.
    #[must_use]
    pub fn from_wire(raw: &[u8]) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|command| command.as_str().as_bytes() == raw)
            .unwrap_or(Self::Unknown)
    }

    /// Headers a frame with this command must carry, or `None` for
    /// `Unknown`, which has no validation rules.
    #[must_use]
    pub fn required_headers(self) -> Option<&'static [HeaderName]> {
        use HeaderName as H;

        let required: &'static [HeaderName] = match self {
            Self::Connect | Self::Stomp => &[H::AcceptVersion, H::Host],
            Self::Connected => &[H::Version],
            Self::Send => &[H::Destination],
            Self::Subscribe => &[H::Destination, H::Id],
            Self::Unsubscribe | Self::Ack | Self::Nack => &[H::Id],
            Self::Begin | Self::Commit | Self::Abort => &[H::Transaction],
            Self::Message => &[H::Destination, H::MessageId, H::Subscription],
            Self::Receipt => &[H::ReceiptId],
            Self::Disconnect | Self::Error => &[],
            Self::Unknown => return None,
        };
        Some(required)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = StompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_wire(s.as_bytes()) {
            Self::Unknown => Err(StompError::CommandInvalid),
            command => Ok(command),
        }
    }
}
