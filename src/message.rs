//! Community-based messages (SNMPv1 and SNMPv2c).
//!
//! ```text
//! Message ::= SEQUENCE {
//!     version    INTEGER { version-1(0), version-2c(1) },
//!     community  OCTET STRING,
//!     data       PDUs
//! }
//! ```
//!
//! Decoding is strict: every container must be filled exactly by what it
//! declares, and trailing data anywhere is a failure.

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, decode_length, tag};
use crate::config::{MAX_COMMUNITY_LEN, MAX_PACKET_SIZE, MAX_REQUEST_OIDS, MIN_PACKET_SIZE};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::version::Version;

/// SNMPv1/v2c message.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityMessage {
    pub version: Version,
    pub community: Bytes,
    pub pdu: Pdu,
}

impl CommunityMessage {
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Encode to BER, failing if the result would exceed `limit` octets.
    pub fn encode_with_limit(&self, limit: usize) -> Result<Bytes> {
        let mut buf = EncodeBuf::with_limit(limit);
        buf.push_sequence(|buf| {
            self.pdu.encode(buf)?;
            buf.push_octet_string(&self.community)?;
            buf.push_integer(self.version.as_i32())
        })?;
        Ok(buf.finish())
    }

    /// Encode to BER within [`MAX_PACKET_SIZE`].
    pub fn encode(&self) -> Result<Bytes> {
        self.encode_with_limit(MAX_PACKET_SIZE)
    }

    /// Decode a request, accepting at most [`MAX_REQUEST_OIDS`] varbinds.
    pub fn decode(data: Bytes) -> Result<Self> {
        Self::decode_with_limit(data, MAX_REQUEST_OIDS)
    }

    /// Decode a message carrying at most `max_varbinds` varbinds.
    pub fn decode_with_limit(data: Bytes, max_varbinds: usize) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let len = decoder.expect_tag(tag::universal::SEQUENCE)?;
        decoder.expect_remaining(len)?;
        let mut seq = decoder.sub_decoder(len)?;

        let at = seq.offset();
        let raw_version = seq.read_integer()?;
        let Some(version) = Version::from_i32(raw_version) else {
            tracing::debug!(target: "snmpbug::ber", { snmp.offset = %at, kind = %DecodeErrorKind::UnknownVersion(raw_version) }, "unsupported version");
            return Err(Error::decode(at, DecodeErrorKind::UnknownVersion(raw_version)));
        };

        let at = seq.offset();
        let community = seq.read_octet_string()?;
        if community.is_empty() || community.len() > MAX_COMMUNITY_LEN {
            let kind = DecodeErrorKind::InvalidCommunityLength {
                length: community.len(),
            };
            tracing::debug!(target: "snmpbug::ber", { snmp.offset = %at, kind = %kind }, "bad community length");
            return Err(Error::decode(at, kind));
        }

        let pdu = Pdu::decode(&mut seq, max_varbinds)?;

        Ok(CommunityMessage {
            version,
            community,
            pdu,
        })
    }
}

/// How much of a TCP stream buffer forms a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// More bytes are needed.
    Incomplete,
    /// The buffer holds exactly one message.
    Complete,
}

/// Decide whether `buf` holds one complete message.
///
/// Fewer than [`MIN_PACKET_SIZE`] bytes are always incomplete. An outer tag
/// other than SEQUENCE, a declared size above [`MAX_PACKET_SIZE`], or bytes
/// beyond the declared end are errors: the stream cannot be resynchronised.
pub fn frame_status(buf: &[u8]) -> Result<FrameStatus> {
    if buf.len() < MIN_PACKET_SIZE {
        return Ok(FrameStatus::Incomplete);
    }
    if buf[0] != tag::universal::SEQUENCE {
        let kind = DecodeErrorKind::UnexpectedTag {
            expected: tag::universal::SEQUENCE,
            actual: buf[0],
        };
        tracing::debug!(target: "snmpbug::ber", { snmp.offset = 0, kind = %kind }, "stream does not start with a message");
        return Err(Error::decode(0, kind));
    }
    let (len, consumed) = decode_length(&buf[1..], 1)?;
    let total = 1 + consumed + len;
    if len == 0 || total > MAX_PACKET_SIZE {
        let kind = DecodeErrorKind::LengthExceedsMax {
            length: total,
            max: MAX_PACKET_SIZE,
        };
        tracing::debug!(target: "snmpbug::ber", { snmp.offset = 1, kind = %kind }, "unacceptable message length");
        return Err(Error::decode(1, kind));
    }
    match buf.len().cmp(&total) {
        std::cmp::Ordering::Less => Ok(FrameStatus::Incomplete),
        std::cmp::Ordering::Equal => Ok(FrameStatus::Complete),
        std::cmp::Ordering::Greater => {
            let kind = DecodeErrorKind::LengthMismatch {
                declared: total,
                actual: buf.len(),
            };
            tracing::debug!(target: "snmpbug::ber", { snmp.offset = %total, kind = %kind }, "data after message");
            Err(Error::decode(total, kind))
        }
    }
}
