use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// TCP address of the simulator export socket.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Builds an endpoint from a host name (or address) and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(formatter, "[{}]:{}", self.host, self.port)
        } else {
            write!(formatter, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    /// Accepts `host:port`, `[v6]:port`, or the same prefixed with `tcp://`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let url = if trimmed.contains("://") {
            Url::parse(trimmed)
        } else {
            Url::parse(&format!("tcp://{trimmed}"))
        }
        .map_err(|source| EndpointParseError::Invalid {
            input: input.to_owned(),
            source,
        })?;

        if url.scheme() != "tcp" {
            return Err(EndpointParseError::UnsupportedScheme(url.scheme().to_owned()));
        }
        let raw_host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| EndpointParseError::MissingHost(input.to_owned()))?;
        let port = url
            .port()
            .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
        Ok(Self::new(
            raw_host.trim_start_matches('[').trim_end_matches(']'),
            port,
        ))
    }
}

/// Errors encountered while parsing an [`Endpoint`] from text.
#[derive(Debug, Error)]
pub enum EndpointParseError {
    /// The text is not a valid `host:port` pair.
    #[error("invalid endpoint '{input}': {source}")]
    Invalid {
        /// Original input.
        input: String,
        /// Underlying URL parse failure.
        #[source]
        source: url::ParseError,
    },
    /// Only TCP endpoints are supported.
    #[error("unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),
    /// Host was missing.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// Port was missing.
    #[error("missing port in '{0}'")]
    MissingPort(String),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("127.0.0.1:7790", "127.0.0.1", 7790)]
    #[case("tcp://sim.local:9000", "sim.local", 9000)]
    #[case("[::1]:7790", "::1", 7790)]
    fn parses_host_and_port(#[case] input: &str, #[case] host: &str, #[case] port: u16) {
        let endpoint: Endpoint = input.parse().expect("endpoint should parse");
        assert_eq!(endpoint.host(), host);
        assert_eq!(endpoint.port(), port);
    }

    #[rstest]
    #[case("127.0.0.1")]
    #[case("udp://127.0.0.1:7790")]
    #[case("host:notaport")]
    fn rejects_incomplete_endpoints(#[case] input: &str) {
        assert!(input.parse::<Endpoint>().is_err(), "{input} should fail");
    }

    #[test]
    fn display_round_trips() {
        for text in ["127.0.0.1:7790", "[::1]:7790"] {
            let endpoint: Endpoint = text.parse().expect("endpoint should parse");
            assert_eq!(endpoint.to_string(), text);
        }
    }
}
