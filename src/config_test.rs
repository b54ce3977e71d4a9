use super::*;

fn parse(args: &[&str]) -> Result<FeedConfig, ConfigError> {
    let argv = std::iter::once("netmon").chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv).expect("arguments should parse");
    FeedConfig::try_from(cli)
}

#[test]
fn defaults_point_at_the_public_feed() {
    let config = parse(&[]).expect("defaults should validate");
    assert_eq!(config.host, DEFAULT_HOST);
    assert_eq!(config.port, 443);
    assert_eq!(config.path, DEFAULT_PATH);
    assert_eq!(config.credentials, None);
    assert_eq!(config.destination, None);
    assert_eq!(config.ca_cert, None);
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
}

#[test]
fn flags_override_defaults() {
    let config = parse(&[
        "--host",
        "feed.example.test",
        "--port",
        "8443",
        "--path",
        "/events",
        "--login",
        "user",
        "--passcode",
        "secret",
        "--destination",
        "/passengers",
        "--ca-cert",
        "/etc/netmon/ca.pem",
        "--connect-timeout-secs",
        "2",
    ])
    .expect("overrides should validate");

    assert_eq!(config.host, "feed.example.test");
    assert_eq!(config.port, 8443);
    assert_eq!(config.path, "/events");
    assert_eq!(
        config.credentials,
        Some(Credentials { login: "user".into(), passcode: "secret".into() })
    );
    assert_eq!(config.destination.as_deref(), Some("/passengers"));
    assert_eq!(config.ca_cert, Some(PathBuf::from("/etc/netmon/ca.pem")));
    assert_eq!(config.connect_timeout, Duration::from_secs(2));
}

#[test]
fn path_without_leading_slash_is_rejected() {
    let err = parse(&["--path", "events"]).expect_err("path should be rejected");
    assert_eq!(err, ConfigError::InvalidPath("events".into()));
}

#[test]
fn login_without_passcode_is_rejected() {
    assert_eq!(parse(&["--login", "user"]), Err(ConfigError::PartialCredentials));
    assert_eq!(parse(&["--passcode", "secret"]), Err(ConfigError::PartialCredentials));
}

#[test]
fn zero_timeout_is_rejected() {
    assert_eq!(parse(&["--connect-timeout-secs", "0"]), Err(ConfigError::ZeroTimeout));
}

#[test]
fn blank_host_is_rejected() {
    assert_eq!(parse(&["--host", "  "]), Err(ConfigError::EmptyHost));
}

#[test]
fn empty_destination_means_no_subscription() {
    let config = parse(&["--destination", ""]).expect("empty destination should validate");
    assert_eq!(config.destination, None);
}

#[test]
fn non_numeric_port_fails_to_parse() {
    let result = Cli::try_parse_from(["netmon", "--port", "https"]);
    assert!(result.is_err());
}
