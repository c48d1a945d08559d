//! Cluster membership as reported by the configuration endpoint

use std::fmt;
use std::str::FromStr;

use crate::utils::ProtocolError;

/// A cluster member address (also used for the bootstrap endpoint)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub host: String,
    pub port: u16,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Address {
    type Err = String;

    /// Parse a single `host:port` pair
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port_str) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("missing port in address {:?}", s))?;
        if host.is_empty() {
            return Err(format!("empty host in address {:?}", s));
        }
        let port = port_str
            .parse()
            .map_err(|_| format!("invalid port in address {:?}", s))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

/// Cluster membership snapshot
///
/// Produced fresh on every successful discovery call; never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    /// Configuration generation counter reported by the server
    pub version: u64,
    /// Member addresses in the order the server listed them
    pub nodes: Vec<Address>,
}

impl ClusterInfo {
    /// Fallback membership: the bootstrap endpoint as the sole member,
    /// generation 0. Used when `ignore_cluster_errors` suppresses a
    /// parse failure.
    pub fn fallback(bootstrap: Address) -> Self {
        Self {
            version: 0,
            nodes: vec![bootstrap],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Parse the body of a `CONFIG cluster` block.
    ///
    /// The body is exactly two logical lines: a decimal generation counter,
    /// then a whitespace-separated list of `<name>|<ip>|<port>` entries.
    /// The node name is discarded; only the ip/port pair is kept.
    pub fn from_config_body(lines: &[String]) -> Result<Self, ProtocolError> {
        let mut logical = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty());

        let generation_line = logical
            .next()
            .ok_or_else(|| ProtocolError::Parse("missing generation counter".to_string()))?;
        let nodes_line = logical
            .next()
            .ok_or_else(|| ProtocolError::Parse("missing node list".to_string()))?;
        if logical.next().is_some() {
            return Err(ProtocolError::Parse(
                "unexpected trailing data in config block".to_string(),
            ));
        }

        let version = generation_line.parse().map_err(|_| {
            ProtocolError::Parse(format!("invalid generation counter: {:?}", generation_line))
        })?;

        let mut nodes = Vec::new();
        for entry in nodes_line.split_whitespace() {
            nodes.push(parse_node_entry(entry)?);
        }

        Ok(Self { version, nodes })
    }
}

/// Parse a single `<name>|<ip>|<port>` node entry
fn parse_node_entry(entry: &str) -> Result<Address, ProtocolError> {
    let fields: Vec<&str> = entry.split('|').collect();
    match fields.as_slice() {
        [_name, ip, port] if !ip.is_empty() => {
            let port = port.parse().map_err(|_| {
                ProtocolError::Parse(format!("invalid port in node entry: {:?}", entry))
            })?;
            Ok(Address::new(*ip, port))
        }
        _ => Err(ProtocolError::Parse(format!(
            "malformed node entry: {:?}",
            entry
        ))),
    }
}
