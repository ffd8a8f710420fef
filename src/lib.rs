//! # snmpbug
//!
//! A small SNMP v1/v2c agent. It answers GET, GETNEXT and GETBULK requests
//! from a read-only MIB describing the host it runs on: the system,
//! interfaces, ip, tcp and udp groups, host uptime, and the UCD memory,
//! disk, load and CPU statistics.
//! Requests arrive over UDP or TCP; everything runs on one task.
//!
//! ## Layers
//!
//! - [`oid`], [`ber`], [`value`], [`varbind`], [`pdu`], [`message`]: the wire
//!   format. Decoding is strict and bounded; encoding goes through a checked
//!   buffer that refuses to grow past a limit.
//! - [`mib`]: an ordered, fixed-capacity table of pre-encoded values built
//!   from declarative definitions. Dynamic cells are re-sampled from a
//!   [`host::HostInfo`] provider.
//! - [`engine`]: turns one request packet into at most one response packet.
//! - [`server`]: owns the MIB, the sockets and the TCP client table, and runs
//!   the event loop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use snmpbug::config::{AddressFamily, AgentConfig, ServerConfig};
//! use snmpbug::host::ProcHost;
//! use snmpbug::server::Server;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> snmpbug::Result<()> {
//!     let agent = AgentConfig {
//!         description: "lab router".into(),
//!         community: Some("public".into()),
//!         interfaces: vec!["eth0".into()],
//!         ..Default::default()
//!     };
//!     let listen = ServerConfig::new(AddressFamily::Ipv4, 1161, None);
//!     let mut server = Server::bind(&listen, agent, Box::new(ProcHost::new())).await?;
//!     server.run().await
//! }
//! ```

// The Error enum carries OIDs inline for diagnostics.
#![allow(clippy::result_large_err)]

pub mod ber;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod message;
pub mod mib;
pub mod oid;
pub mod pdu;
pub mod server;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::{AddressFamily, AgentConfig, ServerConfig};
pub use engine::Engine;
pub use error::{
    DecodeErrorKind, EncodeErrorKind, Error, ErrorStatus, MibErrorKind, OidErrorKind, Result,
};
pub use host::{HostInfo, HostSnapshot, ProcHost, StaticHost};
pub use message::CommunityMessage;
pub use mib::MibStore;
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use server::Server;
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;
