//! BER definite-length encoding.
//!
//! Only the short form and the one- and two-octet long forms are used, so no
//! length this agent reads or writes exceeds 65535.

use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, Result};

/// Largest content length that can be encoded.
pub const MAX_LENGTH: usize = 0xFFFF;

/// Encode a length, returning the octets in reverse order for prepending
/// onto an [`EncodeBuf`](super::EncodeBuf), and the number of valid octets.
pub fn encode_length(len: usize) -> Result<([u8; 3], usize)> {
    match len {
        0..=0x7F => Ok(([len as u8, 0, 0], 1)),
        0x80..=0xFF => Ok(([len as u8, 0x81, 0], 2)),
        0x100..=MAX_LENGTH => Ok(([len as u8, (len >> 8) as u8, 0x82], 3)),
        _ => Err(Error::encode(EncodeErrorKind::LengthTooLarge { length: len })),
    }
}

/// Number of octets the length field for `len` occupies.
pub fn length_size(len: usize) -> usize {
    match len {
        0..=0x7F => 1,
        0x80..=0xFF => 2,
        _ => 3,
    }
}

/// Decode a length field at the start of `data`.
///
/// Returns `(length, octets consumed)`. `base_offset` positions errors
/// within the enclosing message.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        tracing::debug!(target: "snmpbug::ber", { snmp.offset = %base_offset, kind = %DecodeErrorKind::TruncatedData }, "missing length octet");
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let octets = (first & 0x7F) as usize;
    if octets == 0 {
        tracing::debug!(target: "snmpbug::ber", { snmp.offset = %base_offset, kind = %DecodeErrorKind::IndefiniteLength }, "indefinite length");
        return Err(Error::decode(base_offset, DecodeErrorKind::IndefiniteLength));
    }
    if octets > 2 {
        tracing::debug!(target: "snmpbug::ber", { snmp.offset = %base_offset, kind = %DecodeErrorKind::LengthTooLong { octets } }, "length of length too long");
        return Err(Error::decode(base_offset, DecodeErrorKind::LengthTooLong { octets }));
    }
    if data.len() < 1 + octets {
        tracing::debug!(target: "snmpbug::ber", { snmp.offset = %base_offset, kind = %DecodeErrorKind::TruncatedData }, "truncated length field");
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    }

    let len = data[1..=octets]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Ok((len, 1 + octets))
}
