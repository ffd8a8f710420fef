//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{AddressFamily, AgentConfig, DEFAULT_PORT, ServerConfig};
use crate::error::Result;

use super::FileConfig;

/// Configuration file read when `-f` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/snmpbug.json";

/// Minimal SNMP v1/v2c agent.
#[derive(Debug, Parser)]
#[command(name = "snmpbug", version, disable_version_flag = true)]
pub struct Args {
    /// Listen on IPv4 only.
    #[arg(short = '4', long = "use-ipv4", conflicts_with = "use_ipv6")]
    pub use_ipv4: bool,

    /// Listen on IPv6, accepting IPv4-mapped peers (default).
    #[arg(short = '6', long = "use-ipv6")]
    pub use_ipv6: bool,

    /// Interfaces exported in ifTable, comma separated.
    #[arg(short = 'i', long = "interfaces", value_name = "IFS", value_delimiter = ',')]
    pub interfaces: Vec<String>,

    /// Bind both sockets to one network device.
    #[arg(short = 'I', long = "listen", value_name = "DEV")]
    pub listen: Option<String>,

    /// UDP port.
    #[arg(short = 'p', long = "udp-port", default_value_t = DEFAULT_PORT)]
    pub udp_port: u16,

    /// TCP port (defaults to the UDP port).
    #[arg(short = 'P', long = "tcp-port")]
    pub tcp_port: Option<u16>,

    /// JSON configuration file; a missing file is ignored.
    #[arg(short = 'f', long = "config", value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log at debug level.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Log at trace level.
    #[arg(short = 'D', long = "trace")]
    pub trace: bool,

    /// Print version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: (),
}

impl Args {
    /// Log level used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.trace {
            "trace"
        } else if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    pub fn address_family(&self) -> AddressFamily {
        if self.use_ipv4 {
            AddressFamily::Ipv4
        } else {
            AddressFamily::Ipv6
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::new(self.address_family(), self.udp_port, self.tcp_port);
        config.bind_device = self.listen.clone();
        config
    }

    /// Merge the configuration file with the command line. Interfaces given
    /// on the command line replace those from the file.
    pub fn agent_config(&self, file: Option<FileConfig>) -> Result<AgentConfig> {
        let mut config = file.unwrap_or_default().into_agent_config()?;
        if !self.interfaces.is_empty() {
            config.interfaces = self
                .interfaces
                .iter()
                .filter(|name| !name.is_empty())
                .cloned()
                .collect();
        }
        Ok(config)
    }
}
