use std::fmt;
use std::str::FromStr;

use url::Url;

/// Port a bare `host` address is assumed to listen on
pub const DEFAULT_PEER_PORT: u16 = 5000;

#[derive(Debug, thiserror::Error)]
#[error("invalid peer address '{input}': {reason}")]
pub struct AddressError {
    pub input: String,
    pub reason: String,
}

/// Where a peer node can be reached
///
/// Accepts `host`, `host:port` or `http://host[:port]`. A bare host gets
/// [`DEFAULT_PEER_PORT`]; an explicit `http://` URL keeps normal URL port
/// rules. Only plain HTTP is spoken between nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddress {
    base: Url,
}

impl PeerAddress {
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        Self::parse_with_default_port(input, DEFAULT_PEER_PORT)
    }

    pub fn parse_with_default_port(input: &str, default_port: u16) -> Result<Self, AddressError> {
        let err = |reason: &str| AddressError {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(err("address is empty"));
        }

        let explicit_scheme = trimmed.contains("://");
        let candidate = if explicit_scheme {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        let mut base = Url::parse(&candidate).map_err(|e| err(&e.to_string()))?;
        if base.scheme() != "http" {
            return Err(err("only http:// peers are supported"));
        }
        if base.host_str().map(str::is_empty).unwrap_or(true) {
            return Err(err("missing host"));
        }
        if base.path() != "/" || base.query().is_some() || base.fragment().is_some() {
            return Err(err("address must not contain a path, query or fragment"));
        }
        if !base.username().is_empty() || base.password().is_some() {
            return Err(err("address must not contain credentials"));
        }
        if !explicit_scheme && base.port().is_none() {
            base.set_port(Some(default_port))
                .map_err(|_| err("cannot set port"))?;
        }

        Ok(Self { base })
    }

    /// Full URL of an endpoint on this peer, e.g. `endpoint("public-key")`
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

impl FromStr for PeerAddress {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.base.host_str().unwrap_or_default();
        match self.base.port_or_known_default() {
            Some(port) => write!(f, "{}:{}", host, port),
            None => f.write_str(host),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bare_host_gets_default_port() {
        let addr = PeerAddress::parse("192.168.1.20").unwrap();
        assert_eq!(addr.to_string(), "192.168.1.20:5000");
        assert_eq!(
            addr.endpoint("/public-key").as_str(),
            "http://192.168.1.20:5000/public-key"
        );
    }

    #[test]
    fn test_host_and_port() {
        let addr = PeerAddress::parse("localhost:8123").unwrap();
        assert_eq!(addr.to_string(), "localhost:8123");
        assert_eq!(addr.endpoint("/upload").as_str(), "http://localhost:8123/upload");
    }

    #[test]
    fn test_explicit_url() {
        let addr = PeerAddress::parse("http://example.org").unwrap();
        assert_eq!(addr.to_string(), "example.org:80");

        let addr = PeerAddress::parse("http://example.org:9000/").unwrap();
        assert_eq!(addr.to_string(), "example.org:9000");
    }

    #[test]
    fn test_ipv6() {
        let addr = PeerAddress::parse("[::1]:7000").unwrap();
        assert_eq!(addr.endpoint("/upload").as_str(), "http://[::1]:7000/upload");
    }

    #[test]
    fn test_rejects_bad_addresses() {
        for input in [
            "",
            "   ",
            "https://example.org",
            "ftp://example.org",
            "http://example.org/some/path",
            "http://user:pw@example.org",
            "host:notaport",
        ] {
            assert!(PeerAddress::parse(input).is_err(), "accepted {:?}", input);
        }
    }
}
