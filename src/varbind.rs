//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with a value.

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::value::Value;

/// Variable binding - an OID-value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value.
    pub value: Value,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Create a VarBind with a NULL value (request placeholders, error echoes).
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        buf.push_sequence(|buf| {
            self.value.encode(buf)?;
            buf.push_oid(&self.oid)
        })
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;
        let oid = seq.read_oid()?;
        let value = Value::decode(&mut seq)?;
        seq.expect_remaining(0)?;
        Ok(VarBind { oid, value })
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// Encode a list of VarBinds.
pub fn encode_varbind_list(buf: &mut EncodeBuf, varbinds: &[VarBind]) -> Result<()> {
    buf.push_sequence(|buf| {
        // Reverse buffer: last varbind goes in first
        for vb in varbinds.iter().rev() {
            vb.encode(buf)?;
        }
        Ok(())
    })
}

/// Decode a list of VarBinds, failing if it holds more than `max`.
pub fn decode_varbind_list(decoder: &mut Decoder, max: usize) -> Result<Vec<VarBind>> {
    let mut seq = decoder.read_sequence()?;
    let mut varbinds = Vec::new();

    while !seq.is_empty() {
        if varbinds.len() == max {
            tracing::debug!(target: "snmpbug::ber", { snmp.offset = %seq.offset(), max }, "too many varbinds");
            return Err(Error::decode(seq.offset(), DecodeErrorKind::TooManyVarbinds { max }));
        }
        varbinds.push(VarBind::decode(&mut seq)?);
    }

    Ok(varbinds)
}
