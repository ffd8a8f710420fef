//! Append-only OID table with a fixed capacity.

use crate::error::MibErrorKind;
use crate::oid::Oid;

/// Ordered OID-value pairs for GET and GETNEXT lookups.
///
/// Entries must be appended in strictly ascending OID order; the table never
/// sorts. Appending beyond the capacity or out of order is refused.
#[derive(Debug, Clone)]
pub struct OidTable<V> {
    entries: Vec<(Oid, V)>,
    capacity: usize,
}

impl<V> OidTable<V> {
    /// Create an empty table holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry that sorts after every existing one.
    pub fn push(&mut self, oid: Oid, value: V) -> Result<(), MibErrorKind> {
        if self.entries.len() == self.capacity {
            return Err(MibErrorKind::TableOverflow {
                capacity: self.capacity,
            });
        }
        if let Some((last, _)) = self.entries.last()
            && *last >= oid
        {
            return Err(MibErrorKind::OutOfOrder);
        }
        self.entries.push((oid, value));
        Ok(())
    }

    /// Index of an exact OID match.
    pub fn position(&self, oid: &Oid) -> Option<usize> {
        self.entries.binary_search_by(|(o, _)| o.cmp(oid)).ok()
    }

    /// Index of the first entry at or after `oid`.
    pub fn lower_bound(&self, oid: &Oid) -> usize {
        self.entries.partition_point(|(o, _)| o < oid)
    }

    /// Index of the first entry strictly after `oid`.
    pub fn upper_bound(&self, oid: &Oid) -> usize {
        self.entries.partition_point(|(o, _)| o <= oid)
    }

    /// Get the entry at `idx`.
    pub fn get(&self, idx: usize) -> Option<(&Oid, &V)> {
        self.entries.get(idx).map(|(o, v)| (o, v))
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut V> {
        self.entries.get_mut(idx).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over all OID-value pairs in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &V)> {
        self.entries.iter().map(|(o, v)| (o, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn sample() -> OidTable<i32> {
        let mut table = OidTable::with_capacity(8);
        table.push(oid!(1, 3, 6, 1, 2), 100).unwrap();
        table.push(oid!(1, 3, 6, 1, 2, 1), 150).unwrap();
        table.push(oid!(1, 3, 6, 1, 3), 200).unwrap();
        table.push(oid!(1, 3, 6, 1, 5), 300).unwrap();
        table
    }

    #[test]
    fn test_push_enforces_order() {
        let mut table = sample();
        assert_eq!(table.push(oid!(1, 3, 6, 1, 5), 0), Err(MibErrorKind::OutOfOrder));
        assert_eq!(table.push(oid!(1, 3, 6, 1, 4), 0), Err(MibErrorKind::OutOfOrder));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_push_enforces_capacity() {
        let mut table = OidTable::with_capacity(2);
        table.push(oid!(1, 1), ()).unwrap();
        table.push(oid!(1, 2), ()).unwrap();
        assert_eq!(
            table.push(oid!(1, 3), ()),
            Err(MibErrorKind::TableOverflow { capacity: 2 })
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_position() {
        let table = sample();
        assert_eq!(table.position(&oid!(1, 3, 6, 1, 3)), Some(2));
        assert_eq!(table.position(&oid!(1, 3, 6, 1, 4)), None);
    }

    #[test]
    fn test_bounds() {
        let table = sample();
        // Before first
        assert_eq!(table.upper_bound(&oid!(1, 3, 6, 1)), 0);
        // Exact match moves past it
        assert_eq!(table.upper_bound(&oid!(1, 3, 6, 1, 2)), 1);
        assert_eq!(table.lower_bound(&oid!(1, 3, 6, 1, 2)), 0);
        // Between entries
        assert_eq!(table.upper_bound(&oid!(1, 3, 6, 1, 4)), 3);
        // Past end
        assert_eq!(table.upper_bound(&oid!(1, 3, 6, 1, 5)), 4);
        assert!(table.get(4).is_none());
    }

    #[test]
    fn test_get_mut() {
        let mut table = sample();
        *table.get_mut(0).unwrap() = 7;
        assert_eq!(table.get(0), Some((&oid!(1, 3, 6, 1, 2), &7)));
        let oids: Vec<_> = table.iter().map(|(o, _)| o.clone()).collect();
        assert!(oids.windows(2).all(|w| w[0] < w[1]));
    }
}
