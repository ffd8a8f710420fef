//! Socket setup.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, UdpSocket};

fn new_socket(
    addr: SocketAddr,
    ty: Type,
    protocol: Protocol,
    device: Option<&str>,
) -> io::Result<Socket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, ty, Some(protocol))?;

    // Dual-stack: accept IPv4-mapped peers on an IPv6 socket
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }

    // Allow address reuse for quick restarts
    socket.set_reuse_address(true)?;

    bind_device(&socket, device)?;

    // Set non-blocking before converting to tokio socket
    socket.set_nonblocking(true)?;
    Ok(socket)
}

#[cfg(any(target_os = "android", target_os = "fuchsia", target_os = "linux"))]
fn bind_device(socket: &Socket, device: Option<&str>) -> io::Result<()> {
    match device {
        Some(name) => socket.bind_device(Some(name.as_bytes())),
        None => Ok(()),
    }
}

#[cfg(not(any(target_os = "android", target_os = "fuchsia", target_os = "linux")))]
fn bind_device(_socket: &Socket, device: Option<&str>) -> io::Result<()> {
    match device {
        Some(_) => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "binding to a device is only supported on Linux",
        )),
        None => Ok(()),
    }
}

/// Create and bind the agent's UDP socket.
///
/// For IPv6 addresses, sets `IPV6_V6ONLY = false` to enable dual-stack mode,
/// allowing both IPv4 and IPv6 traffic on a single socket.
pub(crate) fn bind_udp_socket(addr: SocketAddr, device: Option<&str>) -> io::Result<UdpSocket> {
    let socket = new_socket(addr, Type::DGRAM, Protocol::UDP, device)?;
    socket.bind(&addr.into())?;
    UdpSocket::from_std(socket.into())
}

/// Create, bind and listen on the agent's TCP socket.
pub(crate) fn bind_tcp_listener(
    addr: SocketAddr,
    device: Option<&str>,
    backlog: i32,
) -> io::Result<TcpListener> {
    let socket = new_socket(addr, Type::STREAM, Protocol::TCP, device)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    TcpListener::from_std(socket.into())
}

/// Show IPv4-mapped IPv6 peers in their IPv4 form.
pub(crate) fn display_addr(addr: SocketAddr) -> SocketAddr {
    match addr {
        SocketAddr::V6(v6) => match v6.ip().to_ipv4_mapped() {
            Some(v4) => SocketAddr::from((v4, v6.port())),
            None => addr,
        },
        SocketAddr::V4(_) => addr,
    }
}
