//! BER decoding.
//!
//! Zero-copy decoding over `Bytes`. Every failure carries the absolute offset
//! into the original message and a distinct [`DecodeErrorKind`].

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// Cursor over BER-encoded bytes.
pub struct Decoder {
    data: Bytes,
    offset: usize,
    /// Position of `data[0]` in the outermost message.
    base: usize,
}

impl Decoder {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            base: 0,
        }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn fail<T>(&self, at: usize, kind: DecodeErrorKind) -> Result<T> {
        tracing::debug!(target: "snmpbug::ber", { snmp.offset = %(self.base + at), kind = %kind }, "decode failed");
        Err(Error::decode(self.base + at, kind))
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let Some(&byte) = self.data.get(self.offset) else {
            return self.fail(self.offset, DecodeErrorKind::TruncatedData);
        };
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_tag(&mut self) -> Result<u8> {
        self.read_byte()
    }

    /// Read a length field. The value is not checked against the remaining
    /// bytes; [`read_bytes`](Self::read_bytes) does that.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) = decode_length(&self.data[self.offset..], self.offset())?;
        self.offset += consumed;
        Ok(len)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        // saturating_add keeps a huge length from wrapping past the bounds check
        if self.offset.saturating_add(len) > self.data.len() {
            return self.fail(
                self.offset,
                DecodeErrorKind::InsufficientData {
                    needed: len,
                    available: self.remaining(),
                },
            );
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read a tag, fail unless it equals `expected`, and return the length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let at = self.offset;
        let tag = self.read_tag()?;
        if tag != expected {
            return self.fail(at, DecodeErrorKind::UnexpectedTag { expected, actual: tag });
        }
        self.read_length()
    }

    /// Read an INTEGER that fits in `i32`.
    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        if len == 0 {
            return self.fail(self.offset, DecodeErrorKind::ZeroLengthInteger);
        }
        if len > 4 {
            return self.fail(self.offset, DecodeErrorKind::IntegerOverflow);
        }
        let bytes = self.read_bytes(len)?;

        // Sign extend from the first content octet
        let mut value: i32 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes.iter() {
            value = (value << 8) | i32::from(byte);
        }
        Ok(value)
    }

    /// Read an unsigned 32-bit value (Counter32, Gauge32, TimeTicks).
    pub fn read_unsigned32(&mut self, expected_tag: u8) -> Result<u32> {
        let len = self.expect_tag(expected_tag)?;
        self.read_unsigned32_value(len)
    }

    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        let value = self.read_unsigned_value(len, 5)?;
        u32::try_from(value).or_else(|_| self.fail(self.offset, DecodeErrorKind::IntegerOverflow))
    }

    /// Read a Counter64.
    pub fn read_integer64(&mut self, expected_tag: u8) -> Result<u64> {
        let len = self.expect_tag(expected_tag)?;
        self.read_integer64_value(len)
    }

    pub fn read_integer64_value(&mut self, len: usize) -> Result<u64> {
        self.read_unsigned_value(len, 9)
    }

    fn read_unsigned_value(&mut self, len: usize, max_len: usize) -> Result<u64> {
        if len == 0 {
            return self.fail(self.offset, DecodeErrorKind::ZeroLengthInteger);
        }
        let at = self.offset;
        let bytes = self.read_bytes(len)?;
        // One extra leading octet is only allowed as a 0x00 sign pad
        if len > max_len || (len == max_len && bytes[0] != 0) {
            return self.fail(at, DecodeErrorKind::IntegerOverflow);
        }
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    pub fn read_null(&mut self) -> Result<()> {
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return self.fail(self.offset, DecodeErrorKind::InvalidNull);
        }
        Ok(())
    }

    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let at = self.offset();
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes, at)
    }

    pub fn read_ip_address(&mut self) -> Result<[u8; 4]> {
        let len = self.expect_tag(tag::application::IP_ADDRESS)?;
        self.read_ip_address_value(len)
    }

    pub fn read_ip_address_value(&mut self, len: usize) -> Result<[u8; 4]> {
        if len != 4 {
            return self.fail(self.offset, DecodeErrorKind::InvalidIpAddressLength { length: len });
        }
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Read a SEQUENCE and return a decoder over its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed type with the given tag and return a decoder over
    /// its contents.
    pub fn read_constructed(&mut self, expected_tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        self.sub_decoder(len)
    }

    /// Split off the next `len` bytes into their own decoder.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let base = self.offset();
        let data = self.read_bytes(len)?;
        Ok(Decoder {
            data,
            offset: 0,
            base,
        })
    }

    /// Fail unless exactly `len` bytes remain. Used where a container must be
    /// filled precisely by what it declares.
    pub fn expect_remaining(&self, len: usize) -> Result<()> {
        if self.remaining() != len {
            return self.fail(
                self.offset,
                DecodeErrorKind::LengthMismatch {
                    declared: len,
                    actual: self.remaining(),
                },
            );
        }
        Ok(())
    }
}
