use super::*;

#[test]
fn interrupt_closes_an_open_feed() {
    assert_eq!(on_interrupt(ConnectionState::Open, false), Interrupt::Close);
}

#[test]
fn interrupt_before_the_feed_opens_stops_immediately() {
    for state in [
        ConnectionState::Idle,
        ConnectionState::Resolving,
        ConnectionState::Connecting,
        ConnectionState::TlsHandshaking,
        ConnectionState::WsHandshaking,
    ] {
        assert_eq!(on_interrupt(state, false), Interrupt::Stop, "state {state}");
    }
}

#[test]
fn second_interrupt_while_closing_stops_immediately() {
    assert_eq!(on_interrupt(ConnectionState::Open, true), Interrupt::Stop);
    assert_eq!(on_interrupt(ConnectionState::Closing, true), Interrupt::Stop);
}
