//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_HOST: &str = "ltnm.learncppthroughprojects.com";
pub const DEFAULT_PATH: &str = "/network-events";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("path must start with '/': {0}")]
    InvalidPath(String),
    #[error("--login and --passcode must be given together")]
    PartialCredentials,
    #[error("connect timeout must be at least one second")]
    ZeroTimeout,
}

#[derive(Parser, Debug)]
#[command(name = "netmon", about = "Live transit network feed over STOMP and secure WebSockets")]
pub struct Cli {
    #[arg(long, env = "NETMON_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = "NETMON_PORT", default_value_t = 443)]
    pub port: u16,

    #[arg(long, env = "NETMON_PATH", default_value = DEFAULT_PATH)]
    pub path: String,

    #[arg(long, env = "NETMON_LOGIN")]
    pub login: Option<String>,

    #[arg(long, env = "NETMON_PASSCODE")]
    pub passcode: Option<String>,

    /// Subscribe to this destination once the session is up.
    #[arg(long, env = "NETMON_DESTINATION")]
    pub destination: Option<String>,

    /// Extra PEM bundle trusted on top of the webpki roots.
    #[arg(long, env = "NETMON_CA_CERT")]
    pub ca_cert: Option<PathBuf>,

    #[arg(long, env = "NETMON_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub passcode: String,
}

/// Validated feed settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub credentials: Option<Credentials>,
    pub destination: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub connect_timeout: Duration,
}

impl TryFrom<Cli> for FeedConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if !cli.path.starts_with('/') {
            return Err(ConfigError::InvalidPath(cli.path));
        }
        let credentials = match (cli.login, cli.passcode) {
            (Some(login), Some(passcode)) => Some(Credentials { login, passcode }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialCredentials),
        };
        if cli.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            host: cli.host,
            port: cli.port,
            path: cli.path,
            credentials,
            destination: cli.destination.filter(|destination| !destination.is_empty()),
            ca_cert: cli.ca_cert,
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
