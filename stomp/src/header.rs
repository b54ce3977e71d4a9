use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::StompError;

/// Header map of a frame. One value per key; ordering is incidental.
pub type Headers = BTreeMap<HeaderName, String>;

/// Whitelisted STOMP header key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderName {
    /// `accept-version`
    AcceptVersion,
    /// `ack`
    Ack,
    /// `content-length`: exact body size in bytes.
    ContentLength,
    /// `content-type`
    ContentType,
    /// `destination`
    Destination,
    /// `heart-beat`
    HeartBeat,
    /// `host`: virtual host of the session.
    Host,
    /// `id`: subscription or message id.
    Id,
    /// `login`
    Login,
    /// `message`: short text of an `ERROR` frame.
    Message,
    /// `message-id`
    MessageId,
    /// `passcode`
    Passcode,
    /// `receipt`: ask the broker for a `RECEIPT`.
    Receipt,
    /// `receipt-id`
    ReceiptId,
    /// `session`
    Session,
    /// `subscription`
    Subscription,
    /// `transaction`
    Transaction,
    /// `server`
    Server,
    /// `version`: protocol version the broker chose.
    Version,
    #[default]
    Unknown,
}

impl HeaderName {
    /// Every header name that has a wire spelling.
    pub const ALL: [Self; 19] = [
        Self::AcceptVersion,
        Self::Ack,
        Self::ContentLength,
        Self::ContentType,
        Self::Destination,
        Self::HeartBeat,
        Self::Host,
        Self::Id,
        Self::Login,
        Self::Message,
        Self::MessageId,
        Self::Passcode,
        Self::Receipt,
        Self::ReceiptId,
        Self::Session,
        Self::Subscription,
        Self::Transaction,
        Self::Server,
        Self::Version,
    ];

    /// Wire spelling of the key. `Unknown` spells a key that never parses
    /// back.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AcceptVersion => "accept-version",
            Self::Ack => "ack",
            Self::ContentLength => "content-length",
            Self::ContentType => "content-type",
            Self::Destination => "destination",
            Self::HeartBeat => "heart-beat",
            Self::Host => "host",
            Self::Id => "id",
            Self::Login => "login",
            Self::Message => "message",
            Self::MessageId => "message-id",
            Self::Passcode => "passcode",
            Self::Receipt => "receipt",
            Self::ReceiptId => "receipt-id",
            Self::Session => "session",
            Self::Subscription => "subscription",
            Self::Transaction => "transaction",
            Self::Server => "server",
            Self::Version => "version",
            Self::Unknown => "unknown header",
        }
    }

    /// Map a raw header key to a name. Exact, case-sensitive match.
    #[must_use]
    pub fn from_wire(raw: &[u8]) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str().as_bytes() == raw)
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderName {
    type Err = StompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_wire(s.as_bytes()) {
            Self::Unknown => Err(StompError::HeaderInvalidKey),
            name => Ok(name),
        }
    }
}
