//! Protocol data units.
//!
//! All PDUs the agent reads or writes share the RFC 3416 layout: request-id,
//! two integers, varbind list. GETBULK reuses the integer slots for
//! non-repeaters and max-repetitions.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PduType {
    GetRequest = tag::pdu::GET_REQUEST,
    GetNextRequest = tag::pdu::GET_NEXT_REQUEST,
    Response = tag::pdu::RESPONSE,
    SetRequest = tag::pdu::SET_REQUEST,
    TrapV1 = tag::pdu::TRAP_V1,
    GetBulkRequest = tag::pdu::GET_BULK_REQUEST,
    InformRequest = tag::pdu::INFORM_REQUEST,
    TrapV2 = tag::pdu::TRAP_V2,
    Report = tag::pdu::REPORT,
}

impl PduType {
    /// Create from a tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            tag::pdu::GET_REQUEST => Some(Self::GetRequest),
            tag::pdu::GET_NEXT_REQUEST => Some(Self::GetNextRequest),
            tag::pdu::RESPONSE => Some(Self::Response),
            tag::pdu::SET_REQUEST => Some(Self::SetRequest),
            tag::pdu::TRAP_V1 => Some(Self::TrapV1),
            tag::pdu::GET_BULK_REQUEST => Some(Self::GetBulkRequest),
            tag::pdu::INFORM_REQUEST => Some(Self::InformRequest),
            tag::pdu::TRAP_V2 => Some(Self::TrapV2),
            tag::pdu::REPORT => Some(Self::Report),
            _ => None,
        }
    }

    /// Get the tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetRequest => write!(f, "GetRequest"),
            Self::GetNextRequest => write!(f, "GetNextRequest"),
            Self::Response => write!(f, "Response"),
            Self::SetRequest => write!(f, "SetRequest"),
            Self::TrapV1 => write!(f, "TrapV1"),
            Self::GetBulkRequest => write!(f, "GetBulkRequest"),
            Self::InformRequest => write!(f, "InformRequest"),
            Self::TrapV2 => write!(f, "TrapV2"),
            Self::Report => write!(f, "Report"),
        }
    }
}

/// Generic PDU.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    /// error-status, or non-repeaters for GETBULK
    pub error_status: i32,
    /// error-index, or max-repetitions for GETBULK
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Build a Response PDU.
    pub fn response(
        request_id: i32,
        error_status: ErrorStatus,
        error_index: i32,
        varbinds: Vec<VarBind>,
    ) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id,
            error_status: error_status.as_i32(),
            error_index,
            varbinds,
        }
    }

    /// GETBULK non-repeaters. Negative values count as zero (RFC 3416 4.2.3).
    pub fn non_repeaters(&self) -> u32 {
        self.error_status.max(0) as u32
    }

    /// GETBULK max-repetitions. Negative values count as zero.
    pub fn max_repetitions(&self) -> u32 {
        self.error_index.max(0) as u32
    }

    pub fn error_status(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds)?;
            buf.push_integer(self.error_index)?;
            buf.push_integer(self.error_status)?;
            buf.push_integer(self.request_id)
        })
    }

    /// Decode a PDU that must fill the rest of `decoder` exactly.
    ///
    /// At most `max_varbinds` varbinds are accepted.
    pub fn decode(decoder: &mut Decoder, max_varbinds: usize) -> Result<Self> {
        let at = decoder.offset();
        let pdu_tag = decoder.read_tag()?;
        let Some(pdu_type) = PduType::from_tag(pdu_tag) else {
            tracing::debug!(target: "snmpbug::ber", { snmp.offset = %at, kind = %DecodeErrorKind::UnknownPduType(pdu_tag) }, "unknown PDU type");
            return Err(Error::decode(at, DecodeErrorKind::UnknownPduType(pdu_tag)));
        };
        let len = decoder.read_length()?;
        decoder.expect_remaining(len)?;
        let mut pdu = decoder.sub_decoder(len)?;

        let request_id = pdu.read_integer()?;
        let error_status = pdu.read_integer()?;
        let error_index = pdu.read_integer()?;
        let varbinds = decode_varbind_list(&mut pdu, max_varbinds)?;
        pdu.expect_remaining(0)?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}
