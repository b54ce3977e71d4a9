use super::*;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::LocalSet;
use tokio::time::timeout;
use wsclient::Target;
use wsclient::mock::{Journal, MockResolver, MockStream, ReadFeed};

const HOST: &str = "ltnm.learncppthroughprojects.com";
const CONNECTED: &str = "CONNECTED\nversion:1.2\nsession:42\n\n\0";

struct Session {
    client: WebSocketClient,
    journal: Journal,
    feed: ReadFeed,
    events: mpsc::UnboundedReceiver<FeedEvent>,
}

impl Session {
    fn start(options: SessionOptions) -> Self {
        let journal = Journal::default();
        let resolver = MockResolver::resolving_to(&journal, vec![SocketAddr::from(([127, 0, 0, 1], 443))]);
        let (stream, feed) = MockStream::new(&journal);
        let client = WebSocketClient::new(Target::new(HOST, "/network-events", 443), resolver, stream);
        let (tx, events) = mpsc::unbounded_channel();
        start(&client, options, tx);
        Self { client, journal, feed, events }
    }

    async fn next(&mut self) -> FeedEvent {
        timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("feed event timed out")
            .expect("feed channel closed unexpectedly")
    }

    /// Play the broker's CONNECTED reply and wait for the session to see it.
    async fn establish(&mut self) -> FeedEvent {
        self.feed.push(CONNECTED);
        self.next().await
    }

    fn written_frame(&self, index: usize) -> Frame {
        let writes = self.journal.writes();
        let text = writes.get(index).expect("frame should have been written");
        Frame::parse(text.as_bytes()).expect("written frame should parse")
    }
}

fn options(destination: Option<&str>) -> SessionOptions {
    SessionOptions {
        host: HOST.into(),
        credentials: None,
        destination: destination.map(str::to_owned),
    }
}

async fn local<F: std::future::Future>(future: F) -> F::Output {
    LocalSet::new().run_until(future).await
}

#[tokio::test]
async fn session_opens_with_a_stomp_frame() {
    local(async {
        let mut session = Session::start(SessionOptions {
            credentials: Some(Credentials { login: "log1".into(), passcode: "pass1".into() }),
            ..options(None)
        });
        session.establish().await;

        let frame = session.written_frame(0);
        assert_eq!(frame.command(), Command::Stomp);
        assert_eq!(frame.header(HeaderName::AcceptVersion), Some(STOMP_VERSION));
        assert_eq!(frame.header(HeaderName::Host), Some(HOST));
        assert_eq!(frame.header(HeaderName::Login), Some("log1"));
        assert_eq!(frame.header(HeaderName::Passcode), Some("pass1"));
    })
    .await;
}

#[tokio::test]
async fn anonymous_session_sends_no_credentials() {
    local(async {
        let mut session = Session::start(options(None));
        session.establish().await;

        let frame = session.written_frame(0);
        assert_eq!(frame.header(HeaderName::Login), None);
        assert_eq!(frame.header(HeaderName::Passcode), None);
    })
    .await;
}

#[tokio::test]
async fn connected_frame_reports_version_and_session() {
    local(async {
        let mut session = Session::start(options(None));
        let event = session.establish().await;
        assert!(
            matches!(&event, FeedEvent::Connected { version, session: id } if version == "1.2" && id.as_deref() == Some("42")),
            "unexpected {event:?}"
        );
        assert_eq!(session.journal.writes().len(), 1);
    })
    .await;
}

#[tokio::test]
async fn connected_session_subscribes_to_the_destination() {
    local(async {
        let mut session = Session::start(options(Some("/passengers")));
        assert!(matches!(session.establish().await, FeedEvent::Connected { .. }));

        let event = session.next().await;
        let FeedEvent::Subscribed { destination, id } = event else {
            panic!("expected Subscribed, got {event:?}");
        };
        assert_eq!(destination, "/passengers");

        let frame = session.written_frame(1);
        assert_eq!(frame.command(), Command::Subscribe);
        assert_eq!(frame.header(HeaderName::Destination), Some("/passengers"));
        assert_eq!(frame.header(HeaderName::Id), Some(id.as_str()));
        assert_eq!(frame.header(HeaderName::Ack), Some("auto"));
    })
    .await;
}

#[tokio::test]
async fn message_frames_become_message_events() {
    local(async {
        let mut session = Session::start(options(None));
        session.establish().await;

        session
            .feed
            .push("MESSAGE\ndestination:/passengers\nmessage-id:7\nsubscription:0\n\n{\"events\":[]}\0");
        let event = session.next().await;
        assert!(
            matches!(&event, FeedEvent::Message { destination, body } if destination == "/passengers" && body == "{\"events\":[]}"),
            "unexpected {event:?}"
        );
    })
    .await;
}

#[tokio::test]
async fn broker_error_is_surfaced() {
    local(async {
        let mut session = Session::start(options(None));
        session.feed.push("ERROR\nmessage:ValidationInvalidAuth\n\n\0");
        let event = session.next().await;
        assert!(
            matches!(&event, FeedEvent::Error { message } if message == "ValidationInvalidAuth"),
            "unexpected {event:?}"
        );
    })
    .await;
}

#[tokio::test]
async fn error_without_message_header_uses_the_body() {
    local(async {
        let mut session = Session::start(options(None));
        session.feed.push("ERROR\n\nbad login\0");
        let event = session.next().await;
        assert!(matches!(&event, FeedEvent::Error { message } if message == "bad login"), "unexpected {event:?}");
    })
    .await;
}

#[tokio::test]
async fn receipt_is_reported() {
    local(async {
        let mut session = Session::start(options(None));
        session.feed.push("RECEIPT\nreceipt-id:77\n\n\0");
        let event = session.next().await;
        assert!(matches!(&event, FeedEvent::Receipt { id } if id == "77"), "unexpected {event:?}");
    })
    .await;
}

#[tokio::test]
async fn invalid_payload_is_rejected_and_session_continues() {
    local(async {
        let mut session = Session::start(options(None));
        session.feed.push("NOPE\n\n\0");
        session.feed.push(CONNECTED);

        assert!(matches!(session.next().await, FeedEvent::Rejected(StompError::CommandInvalid)));
        assert!(matches!(session.next().await, FeedEvent::Connected { .. }));
    })
    .await;
}

#[tokio::test]
async fn connect_failure_is_reported() {
    local(async {
        let journal = Journal::default();
        let resolver = MockResolver::failing(&journal, TransportError::HostNotFound(HOST.into()));
        let (stream, _feed) = MockStream::new(&journal);
        let client = WebSocketClient::new(Target::new(HOST, "/network-events", 443), resolver, stream);
        let (tx, mut events) = mpsc::unbounded_channel();
        start(&client, options(None), tx);

        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("feed event timed out")
            .expect("feed channel closed unexpectedly");
        assert!(matches!(event, FeedEvent::ConnectFailed(TransportError::HostNotFound(_))));
        assert!(journal.writes().is_empty());
    })
    .await;
}

#[tokio::test]
async fn local_close_reports_disconnect() {
    local(async {
        let mut session = Session::start(options(None));
        session.establish().await;

        let (closed_tx, mut closed) = mpsc::unbounded_channel();
        session.client.close(move |result| {
            let _ = closed_tx.send(result);
        });
        let result = timeout(Duration::from_secs(5), closed.recv())
            .await
            .expect("close callback timed out")
            .expect("close callback dropped");
        assert!(result.is_ok(), "close failed: {result:?}");

        let event = session.next().await;
        assert!(matches!(event, FeedEvent::Disconnected(TransportError::Cancelled)), "unexpected {event:?}");
    })
    .await;
}

#[test]
fn options_follow_the_validated_config() {
    let config = FeedConfig {
        host: HOST.into(),
        port: 443,
        path: "/network-events".into(),
        credentials: None,
        destination: Some("/passengers".into()),
        ca_cert: None,
        connect_timeout: Duration::from_secs(5),
    };
    assert_eq!(SessionOptions::from(&config), options(Some("/passengers")));
}
