//! Cluster nodes and routing keys

use std::fmt;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use crate::error::{FractalError, Result};

/// Key used to pick the responsible node: `/{table}/{key}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingKey(String);

impl RoutingKey {
    /// Derive the routing key of a record
    pub fn new(table: &str, key: &str) -> Self {
        let mut routing = String::with_capacity(table.len() + key.len() + 2);
        routing.push('/');
        routing.push_str(table);
        routing.push('/');
        routing.push_str(key);
        Self(routing)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoutingKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A resolved registry node endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterNode {
    /// Host as configured (name or literal address)
    host: String,

    /// Resolved address
    addr: IpAddr,

    /// RPC port
    port: u16,
}

impl ClusterNode {
    /// Resolve `host` and build the node
    ///
    /// IPv4 results are preferred when a name resolves to several addresses.
    pub fn resolve(host: &str, port: u16) -> Result<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(FractalError::Resolution {
                host: host.to_string(),
                reason: "empty host".to_string(),
            });
        }

        let candidates: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| FractalError::Resolution {
                host: host.to_string(),
                reason: e.to_string(),
            })?
            .collect();

        let addr = candidates
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| candidates.first())
            .map(|a| a.ip())
            .ok_or_else(|| FractalError::Resolution {
                host: host.to_string(),
                reason: "no addresses returned".to_string(),
            })?;

        Ok(Self {
            host: host.to_string(),
            addr,
            port,
        })
    }

    /// Build a node from an already resolved address
    pub fn from_addr(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            addr: addr.ip(),
            port: addr.port(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

impl fmt::Display for ClusterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
