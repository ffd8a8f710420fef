//! TCP client table.
//!
//! Each client owns a fixed-size buffer. Bytes are appended as they arrive
//! until [`frame_status`] reports a complete message; the response is then
//! staged in the same buffer and written back before the client is read
//! from again. A client is therefore either reading or writing, never both.

use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::config::{MAX_CLIENTS, MAX_PACKET_SIZE};
use crate::error::Result;
use crate::message::{FrameStatus, frame_status};

/// What a client is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Accumulating a request.
    Reading,
    /// Sending a staged response.
    Writing,
}

/// Fixed-capacity reassembly buffer for one client.
#[derive(Debug)]
pub struct FrameBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            data: vec![0; MAX_PACKET_SIZE].into_boxed_slice(),
            len: 0,
        }
    }

    /// Bytes buffered so far.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    /// Space a read may fill.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.len..]
    }

    /// Account for `n` bytes written into [`spare_mut`](Self::spare_mut)
    /// and report whether a whole message is now buffered.
    pub fn advance(&mut self, n: usize) -> Result<FrameStatus> {
        self.len = (self.len + n).min(self.data.len());
        frame_status(self.filled())
    }

    /// Append bytes, truncating at capacity. Returns the number taken.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        let spare = self.spare_mut();
        let n = bytes.len().min(spare.len());
        spare[..n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    /// Replace the contents with an outgoing message.
    ///
    /// Returns `false` if `bytes` does not fit.
    pub fn stage(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.data.len() {
            return false;
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.len = bytes.len();
        true
    }

    /// Take the buffered message, leaving the buffer empty.
    pub fn take(&mut self) -> Bytes {
        let bytes = Bytes::copy_from_slice(self.filled());
        self.len = 0;
        bytes
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// One accepted TCP client.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    frame: FrameBuffer,
    direction: Direction,
    last_activity: Instant,
    closed: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, now: Instant) -> Self {
        Self {
            stream,
            peer,
            frame: FrameBuffer::new(),
            direction: Direction::Reading,
            last_activity: now,
            closed: false,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Mark for removal on the next [`ConnectionTable::reap`].
    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub(crate) fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame
    }

    /// Read whatever the socket has into the frame buffer.
    pub(crate) fn try_read(&mut self) -> io::Result<usize> {
        let spare = self.frame.spare_mut();
        if spare.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "request buffer full"));
        }
        self.stream.try_read(spare)
    }

    /// Switch to writing `response`. A response that does not fit closes
    /// the connection.
    pub(crate) fn stage_response(&mut self, response: &[u8]) {
        if self.frame.stage(response) {
            self.direction = Direction::Writing;
        } else {
            self.close();
        }
    }

    /// Write the staged response in one call.
    ///
    /// Returns `Ok(true)` once it is fully sent and the connection is
    /// reading again, `Ok(false)` on a spurious wakeup. A short write is an
    /// error: the peer is not draining.
    pub(crate) fn try_write(&mut self) -> io::Result<bool> {
        match self.stream.try_write(self.frame.filled()) {
            Ok(n) if n == self.frame.len() => {
                self.frame.clear();
                self.direction = Direction::Reading;
                Ok(true)
            }
            Ok(n) => Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {n} of {} bytes", self.frame.len()),
            )),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<()> {
        let ready = match self.direction {
            Direction::Reading => self.stream.poll_read_ready(cx),
            Direction::Writing => self.stream.poll_write_ready(cx),
        };
        // errors surface on the following try_read/try_write
        ready.map(|_| ())
    }
}

/// Bounded set of TCP clients with least-recently-active eviction.
#[derive(Debug)]
pub struct ConnectionTable {
    connections: Vec<Connection>,
    capacity: usize,
    // first slot polled next, so one busy client cannot starve the rest
    next: usize,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CLIENTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            connections: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, idx: usize) -> Option<&Connection> {
        self.connections.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Connection> {
        self.connections.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    /// Add a client. When the table is full the least recently active
    /// client is dropped first and its address returned.
    pub fn insert(&mut self, conn: Connection) -> Option<SocketAddr> {
        let evicted = if self.connections.len() >= self.capacity {
            self.lru().map(|idx| self.connections.remove(idx).peer)
        } else {
            None
        };
        if self.capacity > 0 {
            self.connections.push(conn);
        }
        evicted
    }

    fn lru(&self) -> Option<usize> {
        // closed slots go first; ties keep the earliest inserted
        self.connections
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| (!c.closed, c.last_activity))
            .map(|(idx, _)| idx)
    }

    /// Drop every closed client, returning how many went.
    pub fn reap(&mut self) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| {
            if c.closed {
                tracing::debug!(target: "snmpbug::server", { snmp.source = %crate::util::display_addr(c.peer) }, "closing TCP connection");
            }
            !c.closed
        });
        if self.next >= self.connections.len() {
            self.next = 0;
        }
        before - self.connections.len()
    }

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<usize> {
        let n = self.connections.len();
        for step in 0..n {
            let idx = (self.next + step) % n;
            let conn = &self.connections[idx];
            if conn.closed {
                continue;
            }
            if conn.poll_ready(cx).is_ready() {
                self.next = (idx + 1) % n;
                return Poll::Ready(idx);
            }
        }
        Poll::Pending
    }

    /// Wait until some client can make progress in its current direction.
    ///
    /// Pending forever while the table is empty.
    pub async fn ready(&mut self) -> usize {
        poll_fn(|cx| self.poll_ready(cx)).await
    }
}

impl Default for ConnectionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn pair(listener: &TcpListener) -> (TcpStream, Connection) {
        let client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        (client, Connection::new(stream, peer, Instant::now()))
    }

    fn request() -> Vec<u8> {
        vec![
            0x30, 0x26, 0x02, 0x01, 0x01, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xA0,
            0x19, 0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0E, 0x30, 0x0C,
            0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05, 0x00,
        ]
    }

    #[test]
    fn test_frame_buffer_reassembly() {
        let data = request();
        let mut frame = FrameBuffer::new();

        let n = frame.extend(&data[..20]);
        assert_eq!(frame.advance(0).unwrap(), FrameStatus::Incomplete);
        assert_eq!(n, 20);
        frame.extend(&data[20..]);
        assert_eq!(frame.advance(0).unwrap(), FrameStatus::Complete);
        assert_eq!(&frame.take()[..], &data[..]);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_frame_buffer_capacity() {
        let mut frame = FrameBuffer::new();
        assert_eq!(frame.extend(&vec![0u8; MAX_PACKET_SIZE + 10]), MAX_PACKET_SIZE);
        assert!(frame.is_full());
        assert!(frame.spare_mut().is_empty());
        assert!(!frame.stage(&vec![0u8; MAX_PACKET_SIZE + 1]));
        assert!(frame.stage(&[1, 2, 3]));
        assert_eq!(frame.filled(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_insert_evicts_least_recently_active() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut table = ConnectionTable::with_capacity(3);
        let mut clients = Vec::new();
        let base = Instant::now();

        for i in 0..3 {
            let (client, mut conn) = pair(&listener).await;
            conn.touch(base + Duration::from_secs(i));
            assert_eq!(table.insert(conn), None);
            clients.push(client);
        }
        let first = table.get(0).unwrap().peer();
        let second = table.get(1).unwrap().peer();

        // the first client becomes the most recent
        table.get_mut(0).unwrap().touch(base + Duration::from_secs(10));

        let (_client, conn) = pair(&listener).await;
        assert_eq!(table.insert(conn), Some(second));
        assert_eq!(table.len(), 3);
        assert!(table.iter().any(|c| c.peer() == first));
        assert!(table.iter().all(|c| c.peer() != second));
    }

    #[tokio::test]
    async fn test_insert_prefers_closed_slot() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut table = ConnectionTable::with_capacity(2);
        let (_a, a) = pair(&listener).await;
        let (_b, b) = pair(&listener).await;
        table.insert(a);
        table.insert(b);
        let closed = table.get(1).unwrap().peer();
        table.get_mut(1).unwrap().close();

        let (_c, c) = pair(&listener).await;
        assert_eq!(table.insert(c), Some(closed));
    }

    #[tokio::test]
    async fn test_reap_removes_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut table = ConnectionTable::new();
        for _ in 0..3 {
            let (_client, conn) = pair(&listener).await;
            table.insert(conn);
        }
        table.get_mut(1).unwrap().close();
        assert_eq!(table.reap(), 1);
        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|c| !c.is_closed()));
    }

    #[tokio::test]
    async fn test_ready_reports_readable_client() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut table = ConnectionTable::new();
        let (_idle, idle) = pair(&listener).await;
        let (mut busy, conn) = pair(&listener).await;
        table.insert(idle);
        table.insert(conn);

        busy.write_all(&request()).await.unwrap();
        let idx = tokio::time::timeout(Duration::from_secs(5), table.ready())
            .await
            .unwrap();
        assert_eq!(idx, 1);

        let conn = table.get_mut(idx).unwrap();
        let mut total = 0;
        while total < request().len() {
            match conn.try_read() {
                Ok(n) => {
                    total += n;
                    conn.frame_mut().advance(n).unwrap();
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    tokio::task::yield_now().await;
                }
                Err(e) => panic!("read failed: {e}"),
            }
        }
        assert_eq!(conn.frame_mut().advance(0).unwrap(), FrameStatus::Complete);
    }

    #[tokio::test]
    async fn test_staged_response_is_written() {
        use tokio::io::AsyncReadExt;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (mut client, mut conn) = pair(&listener).await;
        conn.stage_response(b"response");
        assert_eq!(conn.direction(), Direction::Writing);

        conn.stream.writable().await.unwrap();
        assert!(conn.try_write().unwrap());
        assert_eq!(conn.direction(), Direction::Reading);

        let mut buf = [0u8; 8];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"response");
    }
}
