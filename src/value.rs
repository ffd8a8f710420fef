//! SNMP value types.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// A value carried in a varbind or stored in a MIB cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// INTEGER (signed 32-bit)
    Integer(i32),
    /// OCTET STRING
    OctetString(Bytes),
    /// NULL
    Null,
    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),
    /// IpAddress (4 octets, network order)
    IpAddress([u8; 4]),
    /// Counter32
    Counter32(u32),
    /// Gauge32 / Unsigned32
    Gauge32(u32),
    /// TimeTicks (hundredths of a second)
    TimeTicks(u32),
    /// Counter64
    Counter64(u64),
    /// noSuchObject exception (v2c)
    NoSuchObject,
    /// noSuchInstance exception (v2c)
    NoSuchInstance,
    /// endOfMibView exception (v2c)
    EndOfMibView,
}

impl Value {
    /// BER tag this value encodes with.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Integer(_) => tag::universal::INTEGER,
            Value::OctetString(_) => tag::universal::OCTET_STRING,
            Value::Null => tag::universal::NULL,
            Value::ObjectIdentifier(_) => tag::universal::OBJECT_IDENTIFIER,
            Value::IpAddress(_) => tag::application::IP_ADDRESS,
            Value::Counter32(_) => tag::application::COUNTER32,
            Value::Gauge32(_) => tag::application::GAUGE32,
            Value::TimeTicks(_) => tag::application::TIMETICKS,
            Value::Counter64(_) => tag::application::COUNTER64,
            Value::NoSuchObject => tag::context::NO_SUCH_OBJECT,
            Value::NoSuchInstance => tag::context::NO_SUCH_INSTANCE,
            Value::EndOfMibView => tag::context::END_OF_MIB_VIEW,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Unsigned 32-bit value of a Counter32, Gauge32 or TimeTicks.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(data) => Some(data),
            _ => None,
        }
    }

    /// OCTET STRING content as UTF-8, if it is valid.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// True for noSuchObject, noSuchInstance and endOfMibView.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Counter64(v) => buf.push_integer64(*v),
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
                buf.push_exception(self.tag())
            }
        }
    }

    /// Encode into a standalone TLV, ready to splice into a message.
    pub fn to_tlv(&self) -> Result<Bytes> {
        let mut buf = EncodeBuf::new();
        self.encode(&mut buf)?;
        Ok(buf.finish())
    }

    /// Decode from BER.
    ///
    /// Only the supported value types are accepted. Non-NULL types must carry
    /// content and NULL must not.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let at = decoder.offset();
        let tag = decoder.read_tag()?;
        let len = decoder.read_length()?;

        if !tag::is_value_tag(tag) {
            tracing::debug!(target: "snmpbug::ber", { snmp.offset = %at, kind = %DecodeErrorKind::UnsupportedTag(tag) }, "unsupported value type");
            return Err(Error::decode(at, DecodeErrorKind::UnsupportedTag(tag)));
        }
        let is_marker = matches!(
            tag,
            tag::universal::NULL
                | tag::context::NO_SUCH_OBJECT
                | tag::context::NO_SUCH_INSTANCE
                | tag::context::END_OF_MIB_VIEW
        );
        if is_marker && len != 0 {
            return Err(Error::decode(at, DecodeErrorKind::InvalidNull));
        }
        // An empty OCTET STRING is legitimate; every other content type needs octets
        if !is_marker && len == 0 && tag != tag::universal::OCTET_STRING {
            return Err(Error::decode(at, DecodeErrorKind::EmptyValue { tag }));
        }

        match tag {
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer_value(len)?)),
            tag::universal::OCTET_STRING => Ok(Value::OctetString(decoder.read_bytes(len)?)),
            tag::universal::NULL => Ok(Value::Null),
            tag::universal::OBJECT_IDENTIFIER => {
                Ok(Value::ObjectIdentifier(decoder.read_oid_value(len)?))
            }
            tag::application::IP_ADDRESS => {
                Ok(Value::IpAddress(decoder.read_ip_address_value(len)?))
            }
            tag::application::COUNTER32 => {
                Ok(Value::Counter32(decoder.read_unsigned32_value(len)?))
            }
            tag::application::GAUGE32 => Ok(Value::Gauge32(decoder.read_unsigned32_value(len)?)),
            tag::application::TIMETICKS => {
                Ok(Value::TimeTicks(decoder.read_unsigned32_value(len)?))
            }
            tag::application::COUNTER64 => {
                Ok(Value::Counter64(decoder.read_integer64_value(len)?))
            }
            tag::context::NO_SUCH_OBJECT => Ok(Value::NoSuchObject),
            tag::context::NO_SUCH_INSTANCE => Ok(Value::NoSuchInstance),
            _ => Ok(Value::EndOfMibView),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "INTEGER: {}", v),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "STRING: \"{}\"", s),
                Err(_) => {
                    write!(f, "Hex-STRING:")?;
                    for b in data.iter() {
                        write!(f, " {:02X}", b)?;
                    }
                    Ok(())
                }
            },
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "OID: {}", oid),
            Value::IpAddress([a, b, c, d]) => write!(f, "IpAddress: {}.{}.{}.{}", a, b, c, d),
            Value::Counter32(v) => write!(f, "Counter32: {}", v),
            Value::Gauge32(v) => write!(f, "Gauge32: {}", v),
            Value::TimeTicks(v) => write!(f, "Timeticks: ({})", v),
            Value::Counter64(v) => write!(f, "Counter64: {}", v),
            Value::NoSuchObject => write!(f, "No Such Object available on this agent at this OID"),
            Value::NoSuchInstance => {
                write!(f, "No Such Instance currently exists at this OID")
            }
            Value::EndOfMibView => write!(f, "No more variables left in this MIB View"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn roundtrip(value: Value) -> Value {
        let bytes = value.to_tlv().unwrap();
        let mut decoder = Decoder::new(bytes);
        let decoded = Value::decode(&mut decoder).unwrap();
        assert!(decoder.is_empty());
        decoded
    }

    #[test]
    fn test_integer_sign_boundaries() {
        for v in [0, 127, 128, -128, -129, 32767, -32768, i32::MAX, i32::MIN] {
            assert_eq!(roundtrip(Value::Integer(v)), Value::Integer(v));
        }
    }

    #[test]
    fn test_octet_string_length_boundaries() {
        for len in [0usize, 127, 128, 255, 256, 65535] {
            let value = Value::OctetString(Bytes::from(vec![0x5A; len]));
            assert_eq!(roundtrip(value.clone()), value, "length {len}");
        }
        let too_long = Value::OctetString(Bytes::from(vec![0u8; 65536]));
        assert!(too_long.to_tlv().is_err());
    }

    #[test]
    fn test_application_types() {
        for value in [
            Value::Counter32(u32::MAX),
            Value::Gauge32(0),
            Value::TimeTicks(8640000),
            Value::Counter64(u64::MAX),
            Value::IpAddress([10, 0, 0, 1]),
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 2021)),
            Value::Null,
            Value::NoSuchObject,
            Value::NoSuchInstance,
            Value::EndOfMibView,
        ] {
            assert_eq!(roundtrip(value.clone()), value);
        }
    }

    #[test]
    fn test_exception_markers_encode_empty() {
        assert_eq!(&Value::NoSuchObject.to_tlv().unwrap()[..], &[0x80, 0x00]);
        assert_eq!(&Value::EndOfMibView.to_tlv().unwrap()[..], &[0x82, 0x00]);
    }

    #[test]
    fn test_decode_rejects_unsupported_tag() {
        // Opaque
        let mut decoder = Decoder::from_slice(&[0x44, 0x01, 0x00]);
        assert!(matches!(
            Value::decode(&mut decoder),
            Err(Error::Decode {
                kind: DecodeErrorKind::UnsupportedTag(0x44),
                ..
            })
        ));
    }

    #[test]
    fn test_decode_rejects_empty_scalar() {
        let mut decoder = Decoder::from_slice(&[0x41, 0x00]);
        assert!(matches!(
            Value::decode(&mut decoder),
            Err(Error::Decode {
                kind: DecodeErrorKind::EmptyValue { tag: 0x41 },
                ..
            })
        ));
        let mut decoder = Decoder::from_slice(&[0x05, 0x01, 0x00]);
        assert!(Value::decode(&mut decoder).is_err());
    }

    #[test]
    fn test_decode_empty_octet_string() {
        let mut decoder = Decoder::from_slice(&[0x04, 0x00]);
        assert_eq!(Value::decode(&mut decoder).unwrap(), Value::OctetString(Bytes::new()));
        assert!(decoder.is_empty());

        // other types still need content
        for tag in [0x02, 0x06, 0x40, 0x46] {
            let mut decoder = Decoder::from_slice(&[tag, 0x00]);
            assert!(matches!(
                Value::decode(&mut decoder),
                Err(Error::Decode {
                    kind: DecodeErrorKind::EmptyValue { .. },
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_accessors_and_display() {
        let descr = Value::from("test");
        assert_eq!(descr.as_str(), Some("test"));
        assert_eq!(descr.to_string(), "STRING: \"test\"");
        assert_eq!(Value::TimeTicks(5).as_u32(), Some(5));
        assert_eq!(Value::Integer(-1).as_i32(), Some(-1));
        assert!(Value::EndOfMibView.is_exception());
        assert!(!Value::Null.is_exception());
    }
}
