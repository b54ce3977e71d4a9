use std::fmt;

/// Lifecycle of one connection attempt.
///
/// States only move forward. `Closed` and `Errored` are terminal; a client
/// that reaches either is spent and a new one must be built to retry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Built, `connect` not called yet.
    #[default]
    Idle,
    /// Looking up the host.
    Resolving,
    /// TCP connect to the first address, under the connect timeout.
    Connecting,
    /// TLS client handshake.
    TlsHandshaking,
    /// WebSocket upgrade.
    WsHandshaking,
    /// Reading; `send` and `close` are accepted.
    Open,
    /// Close handshake in progress.
    Closing,
    /// Closed by the local side.
    Closed,
    /// A stage, a read, or the close handshake failed.
    Errored,
}

impl ConnectionState {
    /// `Closed` or `Errored`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Errored || next.rank() > self.rank()
    }

    /// Lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Connecting => "connecting",
            Self::TlsHandshaking => "tls_handshaking",
            Self::WsHandshaking => "ws_handshaking",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Resolving => 1,
            Self::Connecting => 2,
            Self::TlsHandshaking => 3,
            Self::WsHandshaking => 4,
            Self::Open => 5,
            Self::Closing => 6,
            Self::Closed => 7,
            Self::Errored => 8,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionState as S;

    #[test]
    fn handshake_stages_advance_in_order() {
        let path = [
            S::Idle,
            S::Resolving,
            S::Connecting,
            S::TlsHandshaking,
            S::WsHandshaking,
            S::Open,
            S::Closing,
            S::Closed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
            assert!(!pair[1].can_advance_to(pair[0]), "{} -> {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn any_live_state_can_fail() {
        for state in [S::Idle, S::Resolving, S::Connecting, S::TlsHandshaking, S::WsHandshaking, S::Open, S::Closing] {
            assert!(state.can_advance_to(S::Errored), "{state}");
        }
    }

    #[test]
    fn terminal_states_have_no_successor() {
        for state in [S::Closed, S::Errored] {
            assert!(state.is_terminal());
            assert!(!state.can_advance_to(S::Errored));
            assert!(!state.can_advance_to(S::Idle));
        }
        assert!(!S::Open.is_terminal());
    }

    #[test]
    fn no_state_advances_to_itself() {
        assert!(!S::Open.can_advance_to(S::Open));
        assert!(!S::Resolving.can_advance_to(S::Resolving));
    }
}
