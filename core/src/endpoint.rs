use std::str::FromStr;

use derive_more::Display;

use crate::prelude::*;

/// Address of the remote vehicle link, always normalized to a `ws://` or
/// `wss://` URL. Two endpoints are the same endpoint iff their normalized
/// URLs are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{url}")]
pub struct Endpoint {
    url: String,
    host: String,
    secure: bool,
}

impl Endpoint {
    pub fn from_host_port(host: &str, port: u16) -> Result<Self> {
        if host.contains(':') && !host.starts_with('[') {
            // bare ipv6 literal
            return Self::parse(&format!("ws://[{host}]:{port}"));
        }
        Self::parse(&format!("ws://{host}:{port}"))
    }

    /// Accepts `ws://`, `wss://`, `http://` and `https://` URLs, or a bare
    /// `host[:port][/path]` which is treated as `ws://`.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidEndpoint {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty"));
        }

        let (secure, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
                "ws" | "http" => (false, rest),
                "wss" | "https" => (true, rest),
                _ => return Err(invalid("unsupported scheme")),
            },
            None => (false, trimmed),
        };

        let (authority, tail) = rest.split_at(rest.find(['/', '?', '#']).unwrap_or(rest.len()));
        let (host, port) = split_authority(authority).ok_or_else(|| invalid("malformed host"))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        if let Some(port) = port {
            port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
        }

        // fragments never reach the server and a bare "/" path is the same resource
        let tail = tail.split('#').next().unwrap_or_default();
        let tail = if tail == "/" { "" } else { tail };
        let authority = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => format!("{userinfo}@{}", host_port.to_ascii_lowercase()),
            None => authority.to_ascii_lowercase(),
        };

        let scheme = if secure { "wss" } else { "ws" };
        Ok(Self {
            url: format!("{scheme}://{authority}{tail}"),
            host: host.to_ascii_lowercase(),
            secure,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// host and optional port text, ipv6 literals come back without brackets
fn split_authority(authority: &str) -> Option<(&str, Option<&str>)> {
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        return match after {
            "" => Some((host, None)),
            _ => after.strip_prefix(':').map(|port| (host, Some(port))),
        };
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => Some((host, Some(port))),
        None => Some((authority, None)),
    }
}
