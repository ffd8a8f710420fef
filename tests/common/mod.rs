//! Shared test utilities for snmpbug integration tests.

// Allow dead code and unused imports since not all test files use all utilities
#![allow(dead_code)]
#![allow(unused_imports)]

mod fixtures;

pub use fixtures::*;

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use snmpbug::config::MAX_VALUES;
use snmpbug::host::StaticHost;
use snmpbug::{
    AgentConfig, CommunityMessage, Oid, Pdu, PduType, Server, ServerConfig, VarBind, Version,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long a test waits for a reply before deciding none is coming.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Route server logs to the test harness when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An agent on ephemeral loopback ports, cancelled on drop.
pub struct TestServer {
    pub udp_addr: SocketAddr,
    pub tcp_addr: SocketAddr,
    cancel: CancellationToken,
    handle: Option<JoinHandle<snmpbug::Result<()>>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(agent_config()).await
    }

    pub async fn start_with(agent: AgentConfig) -> Self {
        init_tracing();
        let listen = ServerConfig::with_addrs(
            "127.0.0.1:0".parse().unwrap(),
            "127.0.0.1:0".parse().unwrap(),
        );
        let host = StaticHost::new(host_snapshot());
        let mut server = Server::bind(&listen, agent, Box::new(host))
            .await
            .expect("server should bind");
        let udp_addr = server.udp_addr().unwrap();
        let tcp_addr = server.tcp_addr().unwrap();
        let cancel = server.cancel();
        let handle = tokio::spawn(async move { server.run().await });
        Self {
            udp_addr,
            tcp_addr,
            cancel,
            handle: Some(handle),
        }
    }

    /// Send one datagram and wait for the reply, if any.
    pub async fn udp_exchange(&self, packet: &[u8]) -> Option<Bytes> {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.send_to(packet, self.udp_addr).await.unwrap();
        let mut buf = vec![0u8; 65535];
        match tokio::time::timeout(REPLY_TIMEOUT, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => Some(Bytes::copy_from_slice(&buf[..len])),
            Ok(Err(e)) => panic!("receive failed: {e}"),
            Err(_) => None,
        }
    }

    /// Send a request over UDP and decode the reply.
    pub async fn udp_request(&self, packet: &[u8]) -> Option<CommunityMessage> {
        self.udp_exchange(packet).await.map(decode_response)
    }

    pub async fn tcp_connect(&self) -> TcpStream {
        TcpStream::connect(self.tcp_addr).await.unwrap()
    }

    /// Stop the server and wait for the loop to return.
    pub async fn shutdown(mut self) -> snmpbug::Result<()> {
        self.cancel.cancel();
        match self.handle.take() {
            Some(handle) => handle.await.expect("server task panicked"),
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Encode a request with NULL values for each OID.
pub fn request(version: Version, pdu_type: PduType, oids: &[Oid]) -> Bytes {
    request_with(version, COMMUNITY, pdu_type, 0, 0, oids)
}

/// Encode a request with explicit community and error fields. For GETBULK
/// the error fields carry non-repeaters and max-repetitions.
pub fn request_with(
    version: Version,
    community: &[u8],
    pdu_type: PduType,
    error_status: i32,
    error_index: i32,
    oids: &[Oid],
) -> Bytes {
    CommunityMessage::new(
        version,
        Bytes::copy_from_slice(community),
        Pdu {
            pdu_type,
            request_id: 0x1234,
            error_status,
            error_index,
            varbinds: oids.iter().cloned().map(VarBind::null).collect(),
        },
    )
    .encode()
    .unwrap()
}

pub fn get_bulk(non_repeaters: i32, max_repetitions: i32, oids: &[Oid]) -> Bytes {
    request_with(
        Version::V2c,
        COMMUNITY,
        PduType::GetBulkRequest,
        non_repeaters,
        max_repetitions,
        oids,
    )
}

pub fn decode_response(bytes: Bytes) -> CommunityMessage {
    CommunityMessage::decode_with_limit(bytes, MAX_VALUES).expect("response should decode")
}

/// Read one BER message from a TCP stream.
pub async fn read_message(stream: &mut TcpStream) -> Option<Bytes> {
    let read = async {
        let mut header = [0u8; 2];
        stream.read_exact(&mut header).await.ok()?;
        let mut message = header.to_vec();
        let len = match header[1] {
            n if n < 0x80 => n as usize,
            n => {
                let mut len_bytes = vec![0u8; (n & 0x7F) as usize];
                stream.read_exact(&mut len_bytes).await.ok()?;
                message.extend_from_slice(&len_bytes);
                len_bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize)
            }
        };
        let start = message.len();
        message.resize(start + len, 0);
        stream.read_exact(&mut message[start..]).await.ok()?;
        Some(Bytes::from(message))
    };
    tokio::time::timeout(REPLY_TIMEOUT, read).await.ok().flatten()
}

/// Whether the peer closed the stream within the reply timeout.
pub async fn is_closed(stream: &mut TcpStream) -> bool {
    let mut buf = [0u8; 1];
    matches!(
        tokio::time::timeout(REPLY_TIMEOUT, stream.read(&mut buf)).await,
        Ok(Ok(0)) | Ok(Err(_))
    )
}
