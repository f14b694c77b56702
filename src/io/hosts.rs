//! Redundant host list and combined connection string.

use std::fmt;

/// Port used by the capture server when none is given.
pub const DEFAULT_PORT: u16 = 801;

/// One capture-server address, with an optional explicit port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEndpoint {
    pub host: String,
    /// Port text as written (`host:port`), if any.
    pub port: Option<String>,
}

impl HostEndpoint {
    /// Parse `host`, `host:port` or `[v6]:port`. Surrounding whitespace is
    /// ignored and an empty port (`host:`) inherits the default.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        let (host, port) = match entry.rsplit_once(':') {
            // Bare IPv6 literal: every colon belongs to the address
            Some((host, _)) if host.contains(':') && !host.ends_with(']') => (entry, None),
            Some((host, port)) => {
                let port = port.trim();
                (host.trim(), (!port.is_empty()).then(|| port.to_string()))
            }
            None => (entry, None),
        };
        if host.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            port,
        })
    }

    /// `host:port`, inheriting `default_port` when no port was given.
    pub fn address(&self, default_port: u16) -> String {
        match &self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => format!("{}:{}", self.host, default_port),
        }
    }
}

/// Ordered list of redundant hosts sharing one default port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostList {
    endpoints: Vec<HostEndpoint>,
    default_port: u16,
}

impl HostList {
    /// Build from individual entries. Empty entries are dropped.
    pub fn new<S: AsRef<str>>(entries: &[S], default_port: u16) -> Self {
        let endpoints = entries
            .iter()
            .flat_map(|e| e.as_ref().split(';'))
            .filter_map(HostEndpoint::parse)
            .collect();
        Self {
            endpoints,
            default_port,
        }
    }

    /// Parse a `;`-separated host string.
    pub fn parse(hosts: &str, default_port: u16) -> Self {
        Self::new(&[hosts], default_port)
    }

    pub fn endpoints(&self) -> &[HostEndpoint] {
        &self.endpoints
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Combined connection string: `host:port;host:port`.
    pub fn connection_string(&self) -> String {
        self.endpoints
            .iter()
            .map(|e| e.address(self.default_port))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for HostList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.connection_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_applied() {
        let hosts = HostList::parse("localhost", DEFAULT_PORT);
        assert_eq!(hosts.connection_string(), "localhost:801");
    }

    #[test]
    fn test_explicit_ports_preserved() {
        let hosts = HostList::parse(" 10.0.0.1 ; 10.0.0.2:802;vicon-b", 801);
        assert_eq!(
            hosts.connection_string(),
            "10.0.0.1:801;10.0.0.2:802;vicon-b:801"
        );
    }

    #[test]
    fn test_entries_and_empty_segments() {
        let hosts = HostList::new(&["a", "", "b:9000;;c"], 1234);
        assert_eq!(hosts.endpoints().len(), 3);
        assert_eq!(hosts.to_string(), "a:1234;b:9000;c:1234");
        assert!(HostList::parse("  ", 801).is_empty());
    }

    #[test]
    fn test_empty_port_inherits_default() {
        let hosts = HostList::parse("vicon-a:;vicon-b", 801);
        assert_eq!(hosts.connection_string(), "vicon-a:801;vicon-b:801");
        assert_eq!(hosts.endpoints()[0].port, None);
    }

    #[test]
    fn test_ipv6_entries() {
        let hosts = HostList::parse("[fe80::1]:802;[::1];::1", 801);
        assert_eq!(hosts.connection_string(), "[fe80::1]:802;[::1]:801;::1:801");
        assert_eq!(hosts.endpoints()[0].host, "[fe80::1]");
        assert_eq!(hosts.endpoints()[2].host, "::1");
    }
}
