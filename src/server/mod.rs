//! The agent's event loop.
//!
//! A [`Server`] owns everything a running agent needs: the MIB, the host
//! data source, one UDP socket, one TCP listener and the table of TCP
//! clients. [`Server::run`] multiplexes them on the current task until the
//! cancellation token fires.
//!
//! # Example
//!
//! ```rust,no_run
//! use snmpbug::config::{AgentConfig, ServerConfig};
//! use snmpbug::host::ProcHost;
//! use snmpbug::server::Server;
//!
//! # async fn example() -> snmpbug::Result<()> {
//! let mut server = Server::bind(
//!     &ServerConfig::default(),
//!     AgentConfig::default(),
//!     Box::new(ProcHost::new()),
//! )
//! .await?;
//! let cancel = server.cancel();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     cancel.cancel();
//! });
//! server.run().await
//! # }
//! ```

mod connection;

pub use connection::{Connection, ConnectionTable, Direction, FrameBuffer};

use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::{TcpListener, UdpSocket};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::{AgentConfig, MAX_PACKET_SIZE, ServerConfig};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::host::HostInfo;
use crate::message::FrameStatus;
use crate::mib::{MibStore, standard_definitions};
use crate::util::{bind_tcp_listener, bind_udp_socket, display_addr};

/// One octet past the largest accepted request, so oversized datagrams
/// fill the buffer and can be told apart from a request of exactly
/// [`MAX_PACKET_SIZE`].
const UDP_RECV_SIZE: usize = MAX_PACKET_SIZE + 1;

/// A bound SNMP agent.
pub struct Server {
    engine: Engine,
    mib: MibStore,
    host: Box<dyn HostInfo>,
    udp: UdpSocket,
    listener: TcpListener,
    connections: ConnectionTable,
    refresh: Interval,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("udp", &self.udp.local_addr().ok())
            .field("tcp", &self.listener.local_addr().ok())
            .field("entries", &self.mib.len())
            .field("connections", &self.connections.len())
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Validate the configuration, build the MIB and bind both sockets.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn bind(
        server: &ServerConfig,
        agent: AgentConfig,
        host: Box<dyn HostInfo>,
    ) -> Result<Self> {
        agent.validate()?;

        let snapshot = host.snapshot(&agent.interfaces, &agent.disks);
        let mib = MibStore::build(&standard_definitions(&agent, &snapshot), &snapshot)?;
        tracing::debug!(target: "snmpbug::server", { entries = mib.len() }, "MIB built");

        let device = server.bind_device.as_deref();
        let udp = bind_udp_socket(server.udp_addr, device).map_err(|source| Error::Bind {
            addr: server.udp_addr,
            source,
        })?;
        let listener = bind_tcp_listener(server.tcp_addr, device, server.backlog).map_err(
            |source| Error::Bind {
                addr: server.tcp_addr,
                source,
            },
        )?;

        let mut refresh = tokio::time::interval(agent.timeout);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let udp_addr = udp.local_addr().map_err(|e| Error::io(None, e))?;
        let tcp_addr = listener.local_addr().map_err(|e| Error::io(None, e))?;
        tracing::info!(target: "snmpbug::server", { snmp.udp_addr = %udp_addr, snmp.tcp_addr = %tcp_addr }, "listening");

        Ok(Self {
            engine: Engine::new(agent),
            mib,
            host,
            udp,
            listener,
            connections: ConnectionTable::new(),
            refresh,
            cancel: CancellationToken::new(),
        })
    }

    /// Address of the UDP socket.
    pub fn udp_addr(&self) -> Result<SocketAddr> {
        self.udp.local_addr().map_err(|e| Error::io(None, e))
    }

    /// Address of the TCP listener.
    pub fn tcp_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(|e| Error::io(None, e))
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn cancel(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn mib(&self) -> &MibStore {
        &self.mib
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    /// Serve until cancelled.
    ///
    /// Per-request failures are logged and never end the loop.
    #[instrument(skip(self), err, fields(snmp.udp_addr = ?self.udp.local_addr().ok()))]
    pub async fn run(&mut self) -> Result<()> {
        let mut buf = [0u8; UDP_RECV_SIZE];
        // the first tick fires immediately and the MIB is fresh from bind
        self.refresh.reset();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    tracing::info!(target: "snmpbug::server", "shutdown requested");
                    return Ok(());
                }

                _ = self.refresh.tick() => self.refresh_all(),

                result = self.udp.recv_from(&mut buf) => match result {
                    Ok((len, source)) if len > MAX_PACKET_SIZE => {
                        tracing::warn!(target: "snmpbug::server", { snmp.source = %display_addr(source), max = MAX_PACKET_SIZE }, "dropping oversized datagram");
                    }
                    Ok((len, source)) => {
                        let packet = Bytes::copy_from_slice(&buf[..len]);
                        self.handle_datagram(packet, source).await;
                    }
                    Err(e) => {
                        tracing::warn!(target: "snmpbug::server", { error = %e }, "UDP receive failed");
                    }
                },

                result = self.listener.accept() => match result {
                    Ok((stream, peer)) => self.accept(stream, peer),
                    Err(e) => {
                        tracing::warn!(target: "snmpbug::server", { error = %e }, "TCP accept failed");
                    }
                },

                idx = self.connections.ready() => self.service(idx),
            }

            self.connections.reap();
        }
    }

    fn refresh_all(&mut self) {
        let config = self.engine.config();
        let snapshot = self.host.snapshot(&config.interfaces, &config.disks);
        if let Err(e) = self.mib.refresh_all(&snapshot) {
            tracing::warn!(target: "snmpbug::server", { error = %e }, "MIB refresh failed");
        }
    }

    async fn handle_datagram(&mut self, packet: Bytes, source: SocketAddr) {
        let response = match self.engine.process(&mut self.mib, &*self.host, packet, source) {
            Ok(Some(response)) => response,
            Ok(None) => return,
            Err(e) => {
                log_dropped(source, &e);
                return;
            }
        };

        match self.udp.send_to(&response, source).await {
            Ok(sent) if sent == response.len() => {}
            Ok(sent) => {
                tracing::warn!(target: "snmpbug::server", { snmp.source = %display_addr(source), sent, expected = response.len() }, "short UDP send");
            }
            Err(e) => {
                tracing::warn!(target: "snmpbug::server", { snmp.source = %display_addr(source), error = %e }, "failed to send response");
            }
        }
    }

    fn accept(&mut self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        tracing::debug!(target: "snmpbug::server", { snmp.source = %display_addr(peer) }, "TCP connection accepted");
        let conn = Connection::new(stream, peer, Instant::now());
        if let Some(evicted) = self.connections.insert(conn) {
            tracing::info!(target: "snmpbug::server", { snmp.source = %display_addr(evicted) }, "maximum TCP clients reached, dropped least recently active");
        }
    }

    /// Advance one ready TCP client by a single read or write.
    fn service(&mut self, idx: usize) {
        let Self {
            engine,
            mib,
            host,
            connections,
            ..
        } = self;
        let Some(conn) = connections.get_mut(idx) else {
            return;
        };
        let peer = conn.peer();

        match conn.direction() {
            Direction::Reading => match conn.try_read() {
                Ok(0) => conn.close(),
                Ok(n) => {
                    conn.touch(Instant::now());
                    match conn.frame_mut().advance(n) {
                        Ok(FrameStatus::Incomplete) => {}
                        Ok(FrameStatus::Complete) => {
                            let packet = conn.frame_mut().take();
                            match engine.process(mib, &**host, packet, peer) {
                                Ok(Some(response)) => conn.stage_response(&response),
                                Ok(None) => conn.close(),
                                Err(e) => {
                                    log_dropped(peer, &e);
                                    conn.close();
                                }
                            }
                        }
                        Err(e) => {
                            log_dropped(peer, &e);
                            conn.close();
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    tracing::debug!(target: "snmpbug::server", { snmp.source = %display_addr(peer), error = %e }, "TCP read failed");
                    conn.close();
                }
            },
            Direction::Writing => match conn.try_write() {
                Ok(true) => conn.touch(Instant::now()),
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(target: "snmpbug::server", { snmp.source = %display_addr(peer), error = %e }, "TCP write failed");
                    conn.close();
                }
            },
        }
    }
}

/// Log a request that gets no reply. Malformed packets are worth a warning;
/// everything else was already reported where it was detected.
fn log_dropped(peer: SocketAddr, error: &Error) {
    match error {
        Error::Decode { .. } => {
            tracing::warn!(target: "snmpbug::server", { snmp.source = %display_addr(peer), error = %error }, "dropping malformed request");
        }
        _ => {
            tracing::debug!(target: "snmpbug::server", { snmp.source = %display_addr(peer), error = %error }, "dropping request");
        }
    }
}
