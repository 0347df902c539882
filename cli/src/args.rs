use std::{path::PathBuf, time::Duration};

use clap::Parser;
use uavlink_core::{endpoint::Endpoint, session::SessionOptions, state::DEFAULT_LOG_CAPACITY};

use crate::prelude::*;

/// Terminal client for a single vehicle telemetry link.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// full backend URL; takes precedence over --host/--port
    #[arg(short, long)]
    pub url: Option<String>,

    #[arg(long, default_value = "localhost")]
    pub host: String,

    #[arg(short, long, default_value_t = 14555)]
    pub port: u16,

    /// reconnect this many seconds after the link closes
    #[arg(long = "retry-secs")]
    pub retry_secs: Option<u64>,

    #[arg(long = "connect-timeout-secs")]
    pub connect_timeout_secs: Option<u64>,

    /// log lines kept in memory, 0 keeps everything
    #[arg(long = "log-capacity", default_value_t = DEFAULT_LOG_CAPACITY)]
    pub log_capacity: usize,

    #[arg(long = "log-dir", default_value = "logs")]
    pub log_dir: PathBuf,
}

impl Args {
    pub fn endpoint(&self) -> Result<Endpoint> {
        let endpoint = match &self.url {
            Some(url) => Endpoint::parse(url)?,
            None => Endpoint::from_host_port(&self.host, self.port)?,
        };
        Ok(endpoint)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            retry_delay: self.retry_secs.map(Duration::from_secs),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn log_capacity(&self) -> Option<usize> {
        (self.log_capacity > 0).then_some(self.log_capacity)
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["uavlink"]);
        assert_eq!(args.endpoint().unwrap().as_str(), "ws://localhost:14555");
        assert_eq!(args.session_options(), SessionOptions::default());
        assert_eq!(args.log_capacity(), Some(DEFAULT_LOG_CAPACITY));
    }

    #[test]
    fn test_url_wins_over_host_port() {
        let args = Args::parse_from(["uavlink", "--url", "wss://uav.example:9000", "--port", "1"]);
        let endpoint = args.endpoint().unwrap();
        assert_eq!(endpoint.as_str(), "wss://uav.example:9000");
        assert!(endpoint.is_secure());
    }

    #[test]
    fn test_options_and_unbounded_logs() {
        let args = Args::parse_from([
            "uavlink",
            "--retry-secs",
            "3",
            "--connect-timeout-secs",
            "10",
            "--log-capacity",
            "0",
        ]);
        let options = args.session_options();
        assert_eq!(options.retry_delay, Some(Duration::from_secs(3)));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(args.log_capacity(), None);
    }

    #[test]
    fn test_bad_url() {
        let args = Args::parse_from(["uavlink", "--url", "ftp://nope"]);
        assert!(matches!(args.endpoint(), Err(Error::Lib(_))));
    }
}
