//! JSON configuration file.
//!
//! ```json
//! {
//!     "description": "Edge router",
//!     "contact": "noc@example.net",
//!     "location": "Rack 4",
//!     "authentication": true,
//!     "community": "public",
//!     "timeout": 1,
//!     "vendor": ".1.3.6.1.4.1.12345",
//!     "disk-table": ["/", "/var"],
//!     "iface-table": ["eth0", "eth1"]
//! }
//! ```
//!
//! Every key is optional.

use std::io;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::oid::Oid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub location: Option<String>,
    pub contact: Option<String>,
    pub description: Option<String>,
    /// Enforce `community`; defaults to on.
    pub authentication: Option<bool>,
    pub community: Option<String>,
    /// Refresh period in seconds.
    pub timeout: Option<u64>,
    pub vendor: Option<String>,
    pub disk_table: Option<Vec<String>>,
    pub iface_table: Option<Vec<String>>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::config(format!("invalid configuration: {e}")))
    }

    /// Read `path`. A file that does not exist yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(target: "snmpbug::config", { path = %path.display() }, "no configuration file");
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::config(format!("cannot read {}: {e}", path.display())));
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Overlay the file's values on [`AgentConfig::default`].
    pub fn into_agent_config(self) -> Result<AgentConfig> {
        let mut config = AgentConfig::default();
        if let Some(description) = self.description {
            config.description = description;
        }
        if let Some(contact) = self.contact {
            config.contact = contact;
        }
        if let Some(location) = self.location {
            config.location = location;
        }
        if let Some(vendor) = self.vendor {
            config.vendor = Oid::parse(&vendor)?;
        }
        if self.authentication.unwrap_or(true) {
            config.community = self.community;
        }
        if let Some(seconds) = self.timeout {
            config.timeout = Duration::from_secs(seconds);
        }
        if let Some(disks) = self.disk_table {
            config.disks = disks;
        }
        if let Some(interfaces) = self.iface_table {
            config.interfaces = interfaces;
        }
        config.validate()?;
        Ok(config)
    }
}
