//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; MAX_SUBIDS]>`, so every OID the agent
//! accepts lives inline without a heap allocation.
//!
//! The ordering is lexicographic over sub-identifiers. A strict prefix sorts
//! before every OID it prefixes, which is what GETNEXT relies on to step from
//! a subtree name to its first leaf.

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of sub-identifiers in an OID.
pub const MAX_SUBIDS: usize = 20;

/// Largest value the packed first octet (`subid[0] * 40 + subid[1]`) may hold.
const MAX_FIRST_OCTET: u32 = 255;

/// Object identifier.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    subids: SmallVec<[u32; MAX_SUBIDS]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            subids: SmallVec::new(),
        }
    }

    /// Create an OID from sub-identifiers without validation.
    pub fn new(subids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            subids: subids.into_iter().collect(),
        }
    }

    /// Create an OID from a slice without validation.
    ///
    /// Used by the [`oid!`](crate::oid!) macro for literals known to be valid.
    pub fn from_slice(subids: &[u32]) -> Self {
        Self {
            subids: SmallVec::from_slice(subids),
        }
    }

    /// Parse the dotted text form, e.g. `.1.3.6.1.2.1.1.1.0`.
    ///
    /// The text must begin with `.`, hold between 2 and [`MAX_SUBIDS`]
    /// unsigned sub-identifiers, and the first two must pack into one octet.
    ///
    /// ```
    /// use snmpbug::oid::Oid;
    ///
    /// let oid = Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
    /// assert_eq!(oid.len(), 9);
    /// assert_eq!(oid.to_string(), ".1.3.6.1.2.1.1.1.0");
    ///
    /// assert!(Oid::parse("1.3.6").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let Some(rest) = s.strip_prefix('.') else {
            let kind = if s.is_empty() {
                OidErrorKind::Empty
            } else {
                OidErrorKind::MissingLeadingDot
            };
            return Err(Error::invalid_oid_with_input(kind, s));
        };
        if rest.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut subids = SmallVec::new();
        for part in rest.split('.') {
            if subids.len() == MAX_SUBIDS {
                return Err(Error::invalid_oid_with_input(
                    OidErrorKind::TooManySubids {
                        count: rest.split('.').count(),
                        max: MAX_SUBIDS,
                    },
                    s,
                ));
            }
            // `u32::from_str` accepts a leading '+', which is not part of the dotted form
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::invalid_oid_with_input(OidErrorKind::InvalidSubid, s));
            }
            let subid: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidSubid, s))?;
            subids.push(subid);
        }

        let oid = Self { subids };
        oid.validate()
            .map_err(|kind| Error::invalid_oid_with_input(kind, s))?;
        Ok(oid)
    }

    /// Check the structural invariants: 2 to [`MAX_SUBIDS`] sub-identifiers and
    /// a first pair that fits the single-octet packing.
    pub fn validate(&self) -> std::result::Result<(), OidErrorKind> {
        if self.subids.len() < 2 {
            return Err(OidErrorKind::TooShort);
        }
        if self.subids.len() > MAX_SUBIDS {
            return Err(OidErrorKind::TooManySubids {
                count: self.subids.len(),
                max: MAX_SUBIDS,
            });
        }
        let (first, second) = (self.subids[0], self.subids[1]);
        let packed = first
            .checked_mul(40)
            .and_then(|v| v.checked_add(second));
        match packed {
            Some(v) if v <= MAX_FIRST_OCTET => Ok(()),
            _ => Err(OidErrorKind::FirstSubidOverflow { first, second }),
        }
    }

    /// Get the sub-identifiers.
    pub fn subids(&self) -> &[u32] {
        &self.subids
    }

    /// Number of sub-identifiers.
    pub fn len(&self) -> usize {
        self.subids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subids.is_empty()
    }

    /// True if `prefix` matches this OID's leading sub-identifiers and this OID
    /// is at least as long. An OID is a prefix of itself.
    ///
    /// ```
    /// use snmpbug::oid;
    ///
    /// let leaf = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
    /// assert!(leaf.starts_with(&oid!(1, 3, 6, 1, 2, 1, 1)));
    /// assert!(leaf.starts_with(&leaf));
    /// assert!(!oid!(1, 3, 6).starts_with(&leaf));
    /// ```
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.subids.len() >= prefix.subids.len()
            && self.subids[..prefix.subids.len()] == prefix.subids[..]
    }

    /// Return a new OID with `suffix` appended.
    ///
    /// No arity check is made here; callers building table cells check
    /// [`len`](Self::len) against [`MAX_SUBIDS`].
    pub fn join(&self, suffix: &[u32]) -> Oid {
        let mut subids = self.subids.clone();
        subids.extend_from_slice(suffix);
        Oid { subids }
    }

    /// Number of content octets in the BER encoding of this OID.
    ///
    /// The first two sub-identifiers share one packed value; every other
    /// sub-identifier takes one octet per 7 bits.
    pub fn encoded_length(&self) -> usize {
        match self.subids.len() {
            0 => 0,
            1 => subid_length(self.subids[0].saturating_mul(40)),
            _ => {
                let first = subid_length(packed_first(self.subids[0], self.subids[1]));
                first
                    + self.subids[2..]
                        .iter()
                        .map(|&s| subid_length(s))
                        .sum::<usize>()
            }
        }
    }

    /// Encode the content octets (without tag and length).
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();

        match self.subids.len() {
            0 => {}
            1 => encode_subidentifier(&mut bytes, self.subids[0].saturating_mul(40)),
            _ => {
                encode_subidentifier(&mut bytes, packed_first(self.subids[0], self.subids[1]));
                for &subid in &self.subids[2..] {
                    encode_subidentifier(&mut bytes, subid);
                }
            }
        }

        bytes
    }

    /// Decode content octets (without tag and length).
    ///
    /// `base_offset` is the position of `data` in the enclosing message and
    /// only feeds error reporting.
    pub fn from_ber(data: &[u8], base_offset: usize) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::decode(base_offset, DecodeErrorKind::InvalidOidEncoding));
        }

        let (first, consumed) = decode_subidentifier(data, base_offset)?;
        if first > MAX_FIRST_OCTET {
            return Err(Error::decode(base_offset, DecodeErrorKind::InvalidOidEncoding));
        }

        let mut subids: SmallVec<[u32; MAX_SUBIDS]> = SmallVec::new();
        match first {
            0..40 => subids.extend_from_slice(&[0, first]),
            40..80 => subids.extend_from_slice(&[1, first - 40]),
            _ => subids.extend_from_slice(&[2, first - 80]),
        }

        let mut i = consumed;
        while i < data.len() {
            let (subid, used) = decode_subidentifier(&data[i..], base_offset + i)?;
            if subids.len() == MAX_SUBIDS {
                return Err(Error::decode(
                    base_offset + i,
                    DecodeErrorKind::OidTooLong {
                        count: subids.len() + 1,
                        max: MAX_SUBIDS,
                    },
                ));
            }
            subids.push(subid);
            i += used;
        }

        Ok(Self { subids })
    }
}

fn packed_first(first: u32, second: u32) -> u32 {
    first.saturating_mul(40).saturating_add(second)
}

fn subid_length(value: u32) -> usize {
    match value {
        0..0x80 => 1,
        0x80..0x4000 => 2,
        0x4000..0x20_0000 => 3,
        0x20_0000..0x1000_0000 => 4,
        _ => 5,
    }
}

/// Encode a sub-identifier in base-128, most significant group first.
fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    let count = subid_length(value);
    for i in (0..count).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Decode a sub-identifier, returning (value, bytes consumed).
fn decode_subidentifier(data: &[u8], base_offset: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    let mut i = 0;

    loop {
        let Some(&byte) = data.get(i) else {
            return Err(Error::decode(base_offset + i, DecodeErrorKind::TruncatedData));
        };
        i += 1;

        if value > (u32::MAX >> 7) {
            return Err(Error::decode(base_offset + i, DecodeErrorKind::IntegerOverflow));
        }
        value = (value << 7) | u32::from(byte & 0x7F);

        if byte & 0x80 == 0 {
            break;
        }
    }

    Ok((value, i))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

/// Canonical dotted form with a leading dot, the inverse of [`Oid::parse`].
impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for subid in &self.subids {
            write!(f, ".{}", subid)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Slice ordering already ranks a strict prefix first.
        self.subids.cmp(&other.subids)
    }
}

/// Build an OID from literal sub-identifiers.
///
/// ```
/// use snmpbug::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), ".1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($subid:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($subid),*])
    };
}
