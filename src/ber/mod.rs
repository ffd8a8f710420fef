//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! Encoding and decoding of the subset of X.690 that SNMP v1/v2c uses.
//! Lengths are definite and limited to the two-octet long form.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
pub use tag::*;
