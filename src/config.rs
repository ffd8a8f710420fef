//! Agent and server configuration.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::oid::Oid;

/// Maximum concurrent TCP clients.
pub const MAX_CLIENTS: usize = 16;
/// Maximum varbinds in one request.
pub const MAX_REQUEST_OIDS: usize = 20;
/// Maximum disks exported in dskTable.
pub const MAX_DISKS: usize = 4;
/// Maximum interfaces exported in ifTable.
pub const MAX_INTERFACES: usize = 8;
/// Maximum MIB entries, and values in one response.
pub const MAX_VALUES: usize = 2048;
/// Largest request or response on the wire.
pub const MAX_PACKET_SIZE: usize = 2048;
/// Longest accepted community string.
pub const MAX_COMMUNITY_LEN: usize = 63;
/// Smallest buffer a TCP stream needs before framing is attempted.
pub const MIN_PACKET_SIZE: usize = 25;
/// Default SNMP agent port.
pub const DEFAULT_PORT: u16 = 161;
/// TCP listen backlog.
pub const LISTEN_BACKLOG: i32 = 128;

pub use crate::oid::MAX_SUBIDS;

/// What the agent reports about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// sysDescr
    pub description: String,
    /// sysContact
    pub contact: String,
    /// sysLocation
    pub location: String,
    /// sysObjectID
    pub vendor: Oid,
    /// When set, requests carrying another community are dropped.
    pub community: Option<String>,
    /// Interface names exported in ifTable, in row order.
    pub interfaces: Vec<String>,
    /// Mount points exported in dskTable, in row order.
    pub disks: Vec<String>,
    /// Period of the dynamic value refresh.
    pub timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            contact: String::new(),
            location: String::new(),
            vendor: crate::oid!(1, 3, 6, 1, 4, 1),
            community: None,
            interfaces: Vec::new(),
            disks: vec!["/".to_string()],
            timeout: Duration::from_secs(1),
        }
    }
}

impl AgentConfig {
    /// Check the configured lists and strings against the agent's limits.
    pub fn validate(&self) -> Result<()> {
        if self.interfaces.len() > MAX_INTERFACES {
            return Err(Error::config(format!(
                "{} interfaces configured, at most {MAX_INTERFACES} supported",
                self.interfaces.len()
            )));
        }
        if self.disks.len() > MAX_DISKS {
            return Err(Error::config(format!(
                "{} disks configured, at most {MAX_DISKS} supported",
                self.disks.len()
            )));
        }
        if let Some(community) = &self.community
            && (community.is_empty() || community.len() > MAX_COMMUNITY_LEN)
        {
            return Err(Error::config(format!(
                "community must be 1 to {MAX_COMMUNITY_LEN} characters"
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be positive"));
        }
        self.vendor
            .validate()
            .map_err(|kind| Error::config(format!("vendor OID {}: {kind}", self.vendor)))?;
        Ok(())
    }
}

/// Address family of the server sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressFamily {
    Ipv4,
    /// Dual-stack IPv6, also accepting IPv4-mapped peers.
    #[default]
    Ipv6,
}

impl AddressFamily {
    /// Wildcard address of this family on `port`.
    pub fn any(self, port: u16) -> SocketAddr {
        match self {
            AddressFamily::Ipv4 => SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            AddressFamily::Ipv6 => SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)),
        }
    }
}

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub udp_addr: SocketAddr,
    pub tcp_addr: SocketAddr,
    /// Restrict both sockets to one network device (Linux only).
    pub bind_device: Option<String>,
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(AddressFamily::default(), DEFAULT_PORT, None)
    }
}

impl ServerConfig {
    /// Listen on the wildcard address of `family`. The TCP port defaults to
    /// the UDP port.
    pub fn new(family: AddressFamily, udp_port: u16, tcp_port: Option<u16>) -> Self {
        Self {
            udp_addr: family.any(udp_port),
            tcp_addr: family.any(tcp_port.unwrap_or(udp_port)),
            bind_device: None,
            backlog: LISTEN_BACKLOG,
        }
    }

    /// Listen on explicit addresses.
    pub fn with_addrs(udp_addr: SocketAddr, tcp_addr: SocketAddr) -> Self {
        Self {
            udp_addr,
            tcp_addr,
            bind_device: None,
            backlog: LISTEN_BACKLOG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let agent = AgentConfig::default();
        assert_eq!(agent.vendor.to_string(), ".1.3.6.1.4.1");
        assert_eq!(agent.disks, vec!["/"]);
        assert_eq!(agent.timeout, Duration::from_secs(1));
        assert!(agent.validate().is_ok());

        let server = ServerConfig::default();
        assert_eq!(server.udp_addr, "[::]:161".parse().unwrap());
        assert_eq!(server.tcp_addr, "[::]:161".parse().unwrap());
    }

    #[test]
    fn test_tcp_port_follows_udp_port() {
        let server = ServerConfig::new(AddressFamily::Ipv4, 1161, None);
        assert_eq!(server.tcp_addr, "0.0.0.0:1161".parse().unwrap());
        let server = ServerConfig::new(AddressFamily::Ipv4, 1161, Some(1162));
        assert_eq!(server.tcp_addr.port(), 1162);
    }

    #[test]
    fn test_validate_limits() {
        let config = AgentConfig {
            interfaces: (0..=MAX_INTERFACES).map(|i| format!("eth{i}")).collect(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let config = AgentConfig {
            disks: vec!["/".into(); MAX_DISKS + 1],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AgentConfig {
            community: Some("x".repeat(MAX_COMMUNITY_LEN + 1)),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AgentConfig {
            community: Some("public".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
