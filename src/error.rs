//! Error types for the agent.
//!
//! Errors are `#[non_exhaustive]` so new failure kinds can be added without
//! breaking callers. Protocol-level failures that travel inside a response PDU
//! are modelled separately by [`ErrorStatus`].

use std::net::SocketAddr;

use crate::oid::Oid;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Length field claims more bytes than remain.
    InsufficientData { needed: usize, available: usize },
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Length-of-length field too long.
    LengthTooLong { octets: usize },
    /// Length exceeds the maximum this agent accepts.
    LengthExceedsMax { length: usize, max: usize },
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Integer value does not fit the target type.
    IntegerOverflow,
    /// Invalid OID encoding.
    InvalidOidEncoding,
    /// OID has more sub-identifiers than allowed.
    OidTooLong { count: usize, max: usize },
    /// Unknown SNMP version.
    UnknownVersion(i32),
    /// Unknown PDU type.
    UnknownPduType(u8),
    /// Value tag outside the supported set.
    UnsupportedTag(u8),
    /// NULL with non-zero length.
    InvalidNull,
    /// Non-NULL value with zero length.
    EmptyValue { tag: u8 },
    /// IP address with a length other than 4.
    InvalidIpAddressLength { length: usize },
    /// Request carries more varbinds than allowed.
    TooManyVarbinds { max: usize },
    /// Community string empty or too long.
    InvalidCommunityLength { length: usize },
    /// Container length does not match the bytes that follow it.
    LengthMismatch { declared: usize, actual: usize },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} sub-identifiers, maximum is {}", count, max)
            }
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {}", v),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type: 0x{:02X}", t),
            Self::UnsupportedTag(t) => write!(f, "unsupported value type: 0x{:02X}", t),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::EmptyValue { tag } => write!(f, "value of type 0x{:02X} has zero length", tag),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::TooManyVarbinds { max } => write!(f, "more than {} varbinds", max),
            Self::InvalidCommunityLength { length } => {
                write!(f, "community length {} out of range", length)
            }
            Self::LengthMismatch { declared, actual } => {
                write!(f, "declared length {} but {} bytes follow", declared, actual)
            }
        }
    }
}

/// BER encode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// Content longer than the two-octet length form can express.
    LengthTooLarge { length: usize },
    /// Write would exceed the buffer's capacity limit.
    BufferFull { needed: usize, remaining: usize },
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthTooLarge { length } => {
                write!(f, "length {} exceeds 65535", length)
            }
            Self::BufferFull { needed, remaining } => {
                write!(f, "need {} bytes but only {} left in buffer", needed, remaining)
            }
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Text form does not begin with a dot.
    MissingLeadingDot,
    /// Empty OID string.
    Empty,
    /// Sub-identifier is not an unsigned 32-bit integer.
    InvalidSubid,
    /// OID too short (minimum 2 sub-identifiers).
    TooShort,
    /// OID has too many sub-identifiers.
    TooManySubids { count: usize, max: usize },
    /// First two sub-identifiers do not pack into a single octet.
    FirstSubidOverflow { first: u32, second: u32 },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLeadingDot => write!(f, "OID must begin with '.'"),
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidSubid => write!(f, "invalid sub-identifier"),
            Self::TooShort => write!(f, "OID must have at least 2 sub-identifiers"),
            Self::TooManySubids { count, max } => {
                write!(f, "OID has {} sub-identifiers, exceeds maximum {}", count, max)
            }
            Self::FirstSubidOverflow { first, second } => {
                write!(f, "{}.{} does not fit the first-octet encoding", first, second)
            }
        }
    }
}

/// MIB build error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MibErrorKind {
    /// More entries than the table holds.
    TableOverflow { capacity: usize },
    /// Entry OID exceeds the sub-identifier limit.
    OidOverflow { count: usize, max: usize },
    /// Declared BER type cannot be stored in the MIB.
    UnsupportedType(u8),
    /// Cell value does not have the declared type.
    TypeMismatch { declared: u8, actual: u8 },
    /// Entry does not sort after its predecessor.
    OutOfOrder,
}

impl std::fmt::Display for MibErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TableOverflow { capacity } => {
                write!(f, "table overflow (capacity {})", capacity)
            }
            Self::OidOverflow { count, max } => {
                write!(f, "OID has {} sub-identifiers, maximum is {}", count, max)
            }
            Self::UnsupportedType(t) => write!(f, "unsupported type 0x{:02X}", t),
            Self::TypeMismatch { declared, actual } => {
                write!(f, "declared type 0x{:02X} but value is 0x{:02X}", declared, actual)
            }
            Self::OutOfOrder => write!(f, "entry not in ascending OID order"),
        }
    }
}

/// SNMP error status codes (RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// Unknown/future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::NoError)
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::NoAccess => write!(f, "noAccess"),
            Self::WrongType => write!(f, "wrongType"),
            Self::WrongLength => write!(f, "wrongLength"),
            Self::WrongEncoding => write!(f, "wrongEncoding"),
            Self::WrongValue => write!(f, "wrongValue"),
            Self::NoCreation => write!(f, "noCreation"),
            Self::InconsistentValue => write!(f, "inconsistentValue"),
            Self::ResourceUnavailable => write!(f, "resourceUnavailable"),
            Self::CommitFailed => write!(f, "commitFailed"),
            Self::UndoFailed => write!(f, "undoFailed"),
            Self::AuthorizationError => write!(f, "authorizationError"),
            Self::NotWritable => write!(f, "notWritable"),
            Self::InconsistentName => write!(f, "inconsistentName"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// Crate error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error on an established socket.
    #[error("I/O error{}: {source}", target.map(|t| format!(" communicating with {}", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create, bind or listen on a server socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Invalid OID format.
    #[error("invalid OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>, // Only allocated when parsing string input
    },

    /// BER decoding error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// BER encoding error.
    #[error("encode error: {kind}")]
    Encode { kind: EncodeErrorKind },

    /// MIB construction failed.
    #[error("MIB build failed at {oid}: {kind}")]
    Mib { kind: MibErrorKind, oid: Oid },

    /// Request used a community other than the configured one.
    #[error("invalid community{}", target.map(|t| format!(" from {}", t)).unwrap_or_default())]
    InvalidCommunity { target: Option<SocketAddr> },

    /// Invalid configuration.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create an encode error.
    pub fn encode(kind: EncodeErrorKind) -> Self {
        Self::Encode { kind }
    }

    /// Create a MIB build error.
    pub fn mib(kind: MibErrorKind, oid: Oid) -> Self {
        Self::Mib { kind, oid }
    }

    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Create an I/O error tied to a peer.
    pub fn io(target: Option<SocketAddr>, source: std::io::Error) -> Self {
        Self::Io { target, source }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the peer address if this error has one.
    pub fn target(&self) -> Option<SocketAddr> {
        match self {
            Self::Io { target, .. } => *target,
            Self::InvalidCommunity { target } => *target,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_roundtrips_known_codes() {
        for code in 0..=18 {
            assert_eq!(ErrorStatus::from_i32(code).as_i32(), code);
        }
        assert_eq!(ErrorStatus::from_i32(99), ErrorStatus::Unknown(99));
        assert_eq!(ErrorStatus::NotWritable.as_i32(), 17);
    }

    #[test]
    fn error_status_display_uses_rfc_names() {
        assert_eq!(ErrorStatus::NoSuchName.to_string(), "noSuchName");
        assert_eq!(ErrorStatus::NotWritable.to_string(), "notWritable");
        assert!(!ErrorStatus::NoError.is_error());
        assert!(ErrorStatus::GenErr.is_error());
    }

    #[test]
    fn decode_error_display_includes_offset() {
        let err = Error::decode(7, DecodeErrorKind::TruncatedData);
        assert_eq!(err.to_string(), "decode error at offset 7: unexpected end of data");
    }

    #[test]
    fn invalid_community_display_includes_peer() {
        let addr: SocketAddr = "192.0.2.1:161".parse().unwrap();
        let err = Error::InvalidCommunity { target: Some(addr) };
        assert_eq!(err.to_string(), "invalid community from 192.0.2.1:161");
        assert_eq!(err.target(), Some(addr));
    }
}
