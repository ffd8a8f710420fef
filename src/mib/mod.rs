//! The agent's MIB: an ordered table of pre-encoded values.
//!
//! Every entry holds its value as a complete BER TLV so responses splice it
//! in without re-encoding. Dynamic entries remember the [`Metric`] behind
//! them and are re-encoded in place by [`MibStore::refresh`].

mod definitions;
mod table;

pub use definitions::{
    Cell, CpuField, Definition, DiskField, InterfaceField, IpField, LoadField, MemoryField, Metric,
    Rows, TcpField, UdpField, standard_definitions,
};
pub use table::OidTable;

use bytes::Bytes;

use crate::ber::{Decoder, tag};
use crate::config::MAX_VALUES;
use crate::error::{Error, MibErrorKind, Result};
use crate::host::HostSnapshot;
use crate::oid::{MAX_SUBIDS, Oid};
use crate::value::Value;

/// One MIB variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// BER type of the value.
    pub tag: u8,
    /// Complete TLV, ready to splice into a varbind.
    pub encoded: Bytes,
    /// Source of the value for dynamic entries.
    pub metric: Option<Metric>,
}

impl Entry {
    /// Decode the stored TLV.
    pub fn value(&self) -> Result<Value> {
        Value::decode(&mut Decoder::new(self.encoded.clone()))
    }
}

/// True for the types a MIB cell may hold.
fn is_storable(tag: u8) -> bool {
    tag::is_value_tag(tag)
        && !matches!(
            tag,
            tag::universal::NULL
                | tag::context::NO_SUCH_OBJECT
                | tag::context::NO_SUCH_INSTANCE
                | tag::context::END_OF_MIB_VIEW
        )
}

/// Ordered, fixed-capacity MIB table.
#[derive(Debug, Clone)]
pub struct MibStore {
    table: OidTable<Entry>,
}

impl MibStore {
    /// Build the table from `definitions`, holding at most [`MAX_VALUES`]
    /// entries.
    pub fn build(definitions: &[Definition], snapshot: &HostSnapshot) -> Result<Self> {
        Self::build_with_capacity(definitions, snapshot, MAX_VALUES)
    }

    /// Build the table with an explicit capacity.
    ///
    /// Stops at the first entry that overflows the table, exceeds the OID
    /// arity limit, has an unsupported or mismatched type, or does not sort
    /// after its predecessor. Nothing is returned on failure.
    pub fn build_with_capacity(
        definitions: &[Definition],
        snapshot: &HostSnapshot,
        capacity: usize,
    ) -> Result<Self> {
        let mut table = OidTable::with_capacity(capacity);

        for definition in definitions {
            for (oid, cell) in definition.instances() {
                let fail = |kind: MibErrorKind| {
                    tracing::error!(target: "snmpbug::mib", { snmp.oid = %oid, error = %kind }, "MIB build failed");
                    Error::mib(kind, oid.clone())
                };

                if oid.len() > MAX_SUBIDS {
                    return Err(fail(MibErrorKind::OidOverflow {
                        count: oid.len(),
                        max: MAX_SUBIDS,
                    }));
                }
                if !is_storable(definition.tag) {
                    return Err(fail(MibErrorKind::UnsupportedType(definition.tag)));
                }
                let (value, metric) = match cell {
                    Cell::Fixed(value) => (value.clone(), None),
                    Cell::Metric(metric) => (metric.sample(snapshot), Some(*metric)),
                };
                if value.tag() != definition.tag {
                    return Err(fail(MibErrorKind::TypeMismatch {
                        declared: definition.tag,
                        actual: value.tag(),
                    }));
                }
                let entry = Entry {
                    tag: definition.tag,
                    encoded: value.to_tlv()?,
                    metric,
                };
                table.push(oid.clone(), entry).map_err(fail)?;
            }
        }

        tracing::debug!(target: "snmpbug::mib", { entries = table.len() }, "MIB built");
        Ok(Self { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Entry at `idx`.
    pub fn get(&self, idx: usize) -> Option<(&Oid, &Entry)> {
        self.table.get(idx)
    }

    pub fn oid(&self, idx: usize) -> Option<&Oid> {
        self.table.get(idx).map(|(oid, _)| oid)
    }

    /// Iterate over all entries in ascending OID order.
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &Entry)> {
        self.table.iter()
    }

    /// Find the first entry at or after `*cursor` whose OID equals `oid` or
    /// lies beneath it.
    ///
    /// The cursor is moved forward to the candidate position, so a second call
    /// with `*cursor + 1` finds the next entry under the same prefix.
    pub fn find_exact_or_child(&self, oid: &Oid, cursor: &mut usize) -> Option<usize> {
        *cursor = (*cursor).max(self.table.lower_bound(oid));
        let (candidate, _) = self.table.get(*cursor)?;
        candidate.starts_with(oid).then_some(*cursor)
    }

    /// Find the first entry strictly after `oid`.
    pub fn find_next(&self, oid: &Oid) -> Option<usize> {
        let idx = self.table.upper_bound(oid);
        (idx < self.table.len()).then_some(idx)
    }

    /// Re-encode a dynamic entry from `snapshot`. Fixed entries are left alone.
    pub fn refresh(&mut self, idx: usize, snapshot: &HostSnapshot) -> Result<()> {
        let Some(entry) = self.table.get_mut(idx) else {
            return Ok(());
        };
        if let Some(metric) = entry.metric {
            entry.encoded = metric.sample(snapshot).to_tlv()?;
        }
        Ok(())
    }

    /// Re-encode every dynamic entry.
    pub fn refresh_all(&mut self, snapshot: &HostSnapshot) -> Result<()> {
        for idx in 0..self.table.len() {
            self.refresh(idx, snapshot)?;
        }
        Ok(())
    }
}
