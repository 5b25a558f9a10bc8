// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node ids and per-node storage.

use alloc::vec::Vec;
use smallvec::SmallVec;

use bramble_atom::Atom;

use crate::listener::Binding;
use crate::property::PropertyRecord;

/// Most nodes inherit from one base style; two slots cover the common
/// multiple-inheritance case without spilling to the heap.
pub(crate) const INLINE_PARENTS: usize = 2;

/// Inline capacity for child lists. Leaf-heavy graphs keep most lists empty;
/// four covers small fan-out without an allocation.
pub(crate) const INLINE_CHILDREN: usize = 4;

/// Inline capacity for the local record table. Most nodes override only a
/// handful of properties; base styles that define many will spill.
pub(crate) const INLINE_RECORDS: usize = 4;

/// Identifier for a node in a [`StyleGraph`](crate::StyleGraph).
///
/// Ids are handles, not references: copying one never keeps the node alive,
/// and using one after [`destroy_node`](crate::StyleGraph::destroy_node)
/// fails with [`CascadeError::StaleNode`](crate::CascadeError::StaleNode)
/// rather than touching whatever reused the slot.
///
/// ## Liveness
///
/// Each id pairs a slot index with the generation the slot had when the node
/// was created. Slots start at generation 1 and bump the generation every
/// time they are reused, so a stale id can never alias a newer node in the
/// same slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    /// The slot index, for direct indexing into the arena.
    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// The raw slot index.
    pub(crate) const fn index(self) -> u32 {
        self.0
    }

    /// The generation the slot had when this id was handed out.
    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

/// One arena slot: the current generation plus the node stored there, if
/// any. `node` is `None` between destruction and reuse.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) node: Option<NodeData>,
}

/// Everything stored for one live node.
#[derive(Debug, Default)]
pub(crate) struct NodeData {
    /// Inheritance sources in precedence order; earlier entries win.
    pub(crate) parents: SmallVec<[NodeId; INLINE_PARENTS]>,
    /// Nodes that list this node as a parent, in the order they linked.
    pub(crate) children: SmallVec<[NodeId; INLINE_CHILDREN]>,
    /// Local property records, sorted by atom for binary search.
    pub(crate) records: SmallVec<[PropertyRecord; INLINE_RECORDS]>,
    /// Listener bindings in registration order.
    pub(crate) bindings: Vec<Binding>,
    /// Transaction nesting depth. While non-zero, notifications are queued
    /// on the records instead of delivered.
    pub(crate) lock: u32,
    /// Whether any record queued a notification during the current
    /// transaction.
    pub(crate) delayed: bool,
}

impl NodeData {
    pub(crate) fn find_record(&self, atom: Atom) -> Option<&PropertyRecord> {
        self.records
            .binary_search_by_key(&atom, |rec| rec.atom)
            .ok()
            .map(|i| &self.records[i])
    }

    pub(crate) fn find_record_mut(&mut self, atom: Atom) -> Option<&mut PropertyRecord> {
        self.records
            .binary_search_by_key(&atom, |rec| rec.atom)
            .ok()
            .map(|i| &mut self.records[i])
    }

    /// Inserts a record at its sorted position. The caller must have checked
    /// that no record for the atom exists.
    pub(crate) fn insert_record(&mut self, record: PropertyRecord) {
        match self.records.binary_search_by_key(&record.atom, |rec| rec.atom) {
            Ok(_) => debug_assert!(false, "record already present"),
            Err(pos) => self.records.insert(pos, record),
        }
    }

    pub(crate) fn remove_record(&mut self, atom: Atom) -> Option<PropertyRecord> {
        match self.records.binary_search_by_key(&atom, |rec| rec.atom) {
            Ok(pos) => Some(self.records.remove(pos)),
            Err(_) => None,
        }
    }

    /// Whether this node shadows `atom` from its children's point of view.
    ///
    /// Only value-bearing records shadow; a record whose override was reset
    /// while an ancestor still defines the atom keeps its type and bindings
    /// but stays transparent to the cascade.
    pub(crate) fn has_value_for(&self, atom: Atom) -> bool {
        self.find_record(atom).is_some_and(|rec| rec.value.is_some())
    }

    /// Number of bindings registered for `atom`, for seeding a fresh
    /// record's reference count.
    pub(crate) fn binding_refs(&self, atom: Atom) -> u32 {
        let n = self.bindings.iter().filter(|b| b.atom == atom).count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyRecord;
    use crate::value::PropertyValue;

    fn three_atoms() -> (Atom, Atom, Atom) {
        let mut registry = bramble_atom::AtomRegistry::new();
        (
            registry.intern("width"),
            registry.intern("height"),
            registry.intern("visible"),
        )
    }

    #[test]
    fn records_stay_sorted() {
        let mut data = NodeData::default();
        let (a0, a1, a2) = three_atoms();
        data.insert_record(PropertyRecord::created(a2, PropertyValue::Int(2)));
        data.insert_record(PropertyRecord::created(a0, PropertyValue::Int(0)));
        data.insert_record(PropertyRecord::created(a1, PropertyValue::Int(1)));
        let atoms: alloc::vec::Vec<_> = data.records.iter().map(|rec| rec.atom).collect();
        assert_eq!(atoms, alloc::vec![a0, a1, a2]);
        assert_eq!(data.find_record(a1).map(|rec| rec.atom), Some(a1));
    }

    #[test]
    fn remove_returns_the_record() {
        let mut data = NodeData::default();
        let (a0, _, _) = three_atoms();
        data.insert_record(PropertyRecord::created(a0, PropertyValue::Bool(true)));
        let removed = data.remove_record(a0);
        assert!(removed.is_some());
        assert!(data.find_record(a0).is_none());
        assert!(data.remove_record(a0).is_none());
    }

    #[test]
    fn cleared_records_do_not_shadow() {
        let mut data = NodeData::default();
        let (a0, _, _) = three_atoms();
        let mut rec = PropertyRecord::created(a0, PropertyValue::Int(1));
        rec.value = None;
        data.insert_record(rec);
        assert!(!data.has_value_for(a0));
        assert!(data.find_record(a0).is_some());
    }

    #[test]
    fn id_layout_is_compact() {
        assert_eq!(core::mem::size_of::<NodeId>(), 8);
    }
}
