//! BER encoding.
//!
//! Uses a reverse buffer: content is written first and its length and tag are
//! prepended afterwards, so no length has to be computed up front.

use super::length::encode_length;
use super::tag;
use crate::error::{EncodeErrorKind, Error, Result};
use bytes::Bytes;

/// Writer for BER output that grows backwards.
///
/// Every write is checked against a capacity limit (the largest message the
/// agent may send). Exceeding it fails with [`EncodeErrorKind::BufferFull`]
/// instead of writing past the end.
///
/// ```
/// use snmpbug::ber::EncodeBuf;
///
/// let mut buf = EncodeBuf::with_limit(16);
/// buf.push_sequence(|buf| {
///     buf.push_integer(2)?;
///     buf.push_integer(1)
/// })
/// .unwrap();
/// assert_eq!(&buf.finish()[..], &[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
///
/// let mut small = EncodeBuf::with_limit(2);
/// assert!(small.push_octet_string(b"abc").is_err());
/// ```
pub struct EncodeBuf {
    buf: Vec<u8>,
    limit: usize,
}

impl EncodeBuf {
    /// Create a buffer bounded only by the two-octet length form.
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// Create a buffer that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(limit.min(512)),
            limit,
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes that may still be written before the limit.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.buf.len())
    }

    fn reserve(&mut self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(Error::encode(EncodeErrorKind::BufferFull { needed, remaining }));
        }
        self.buf.reserve(needed);
        Ok(())
    }

    /// Push a single byte (prepends to front).
    pub fn push_byte(&mut self, byte: u8) -> Result<()> {
        self.reserve(1)?;
        self.buf.push(byte);
        Ok(())
    }

    /// Push bytes that are in forward order (prepends to front).
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.buf.extend(bytes.iter().rev());
        Ok(())
    }

    /// Push a BER length encoding.
    pub fn push_length(&mut self, len: usize) -> Result<()> {
        let (bytes, count) = encode_length(len)?;
        self.reserve(count)?;
        self.buf.extend_from_slice(&bytes[..count]);
        Ok(())
    }

    /// Push a BER tag.
    pub fn push_tag(&mut self, tag: u8) -> Result<()> {
        self.push_byte(tag)
    }

    /// Encode a constructed type (SEQUENCE, PDU, etc).
    ///
    /// The closure writes the contents (in reverse order); length and tag are
    /// prepended afterwards.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let start_len = self.len();
        f(self)?;
        let content_len = self.len() - start_len;
        self.push_length(content_len)?;
        self.push_tag(tag)
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.push_constructed(tag::universal::SEQUENCE, f)
    }

    /// Encode a primitive TLV whose content is already in forward order.
    fn push_primitive(&mut self, tag: u8, content: &[u8]) -> Result<()> {
        self.push_bytes(content)?;
        self.push_length(content.len())?;
        self.push_tag(tag)
    }

    /// Encode an INTEGER.
    pub fn push_integer(&mut self, value: i32) -> Result<()> {
        let (arr, len) = encode_integer_stack(value);
        self.push_primitive(tag::universal::INTEGER, &arr[4 - len..])
    }

    /// Encode a Counter64.
    pub fn push_integer64(&mut self, value: u64) -> Result<()> {
        let (arr, len) = encode_integer64_stack(value);
        self.push_primitive(tag::application::COUNTER64, &arr[9 - len..])
    }

    /// Encode an unsigned 32-bit integer with a specific tag.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) -> Result<()> {
        let (arr, len) = encode_unsigned32_stack(value);
        self.push_primitive(tag, &arr[5 - len..])
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) -> Result<()> {
        self.push_primitive(tag::universal::OCTET_STRING, data)
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) -> Result<()> {
        self.push_primitive(tag::universal::NULL, &[])
    }

    /// Encode one of the zero-length exception markers.
    pub fn push_exception(&mut self, tag: u8) -> Result<()> {
        self.push_primitive(tag, &[])
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &crate::oid::Oid) -> Result<()> {
        let ber = oid.to_ber_smallvec();
        self.push_primitive(tag::universal::OBJECT_IDENTIFIER, &ber)
    }

    /// Encode an IP address.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) -> Result<()> {
        self.push_primitive(tag::application::IP_ADDRESS, &addr)
    }

    /// Splice in a complete, already encoded TLV.
    pub fn push_encoded(&mut self, tlv: &[u8]) -> Result<()> {
        self.push_bytes(tlv)
    }

    /// Finalize and return the encoded bytes.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }

    /// Finalize and return as `Vec<u8>`.
    pub fn finish_vec(mut self) -> Vec<u8> {
        self.buf.reverse();
        self.buf
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a signed 32-bit integer in minimal BER form.
///
/// Returns a stack-allocated array and the number of valid bytes.
/// The valid bytes are at the END of the array.
#[inline]
fn encode_integer_stack(value: i32) -> ([u8; 4], usize) {
    let bytes = value.to_be_bytes();

    let mut start = 0;
    if value >= 0 {
        // Skip leading 0x00 bytes, keeping one if the next byte has its sign bit set
        while start < 3 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else {
        while start < 3 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }

    (bytes, 4 - start)
}

/// Encode an unsigned 32-bit integer, with a 0x00 prefix when the top bit is set.
#[inline]
fn encode_unsigned32_stack(value: u32) -> ([u8; 5], usize) {
    let mut result = [0u8; 5];
    result[1..].copy_from_slice(&value.to_be_bytes());

    let mut start = 1;
    while start < 4 && result[start] == 0 {
        start += 1;
    }
    if result[start] & 0x80 != 0 {
        start -= 1;
    }

    (result, 5 - start)
}

/// Encode an unsigned 64-bit integer, with a 0x00 prefix when the top bit is set.
#[inline]
fn encode_integer64_stack(value: u64) -> ([u8; 9], usize) {
    let mut result = [0u8; 9];
    result[1..].copy_from_slice(&value.to_be_bytes());

    let mut start = 1;
    while start < 8 && result[start] == 0 {
        start += 1;
    }
    if result[start] & 0x80 != 0 {
        start -= 1;
    }

    (result, 9 - start)
}
