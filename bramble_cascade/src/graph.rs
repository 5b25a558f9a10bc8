// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The style graph: node arena and inheritance edges.

use alloc::vec::Vec;
use hashbrown::HashSet;
use smallvec::SmallVec;

use bramble_atom::{Atom, AtomRegistry};

use crate::error::CascadeError;
use crate::node::{INLINE_CHILDREN, INLINE_PARENTS, NodeData, NodeId, Slot};
use crate::notify::NotifyScratch;

/// A graph of style nodes with multiple inheritance.
///
/// Nodes live in a generational arena: [`create_node`](Self::create_node)
/// hands out ids, [`destroy_node`](Self::destroy_node) frees them, and any
/// use of a destroyed id fails with [`CascadeError::StaleNode`] instead of
/// touching a reused slot.
///
/// Each node keeps an ordered parent list. Property resolution walks the
/// node first, then its parents depth-first in list order, so the leftmost
/// parent wins when several ancestors define the same atom. Edges may form
/// diamonds or even cycles; every traversal carries a visited set and visits
/// each node at most once.
///
/// The graph owns an [`AtomRegistry`] so property names can be interned
/// through [`atom`](Self::atom) without a second handle.
#[derive(Debug, Default)]
pub struct StyleGraph {
    pub(crate) atoms: AtomRegistry,
    pub(crate) slots: Vec<Slot>,
    pub(crate) free: Vec<u32>,
    pub(crate) next_binding: u64,
    pub(crate) scratch: NotifyScratch,
}

impl StyleGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `nodes` nodes before the arena
    /// reallocates.
    #[must_use]
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            slots: Vec::with_capacity(nodes),
            ..Self::default()
        }
    }

    /// Creates an empty graph over an existing registry, so atoms interned
    /// elsewhere keep their ids.
    #[must_use]
    pub fn with_registry(atoms: AtomRegistry) -> Self {
        Self {
            atoms,
            ..Self::default()
        }
    }

    /// Interns `name` in the graph's registry.
    pub fn atom(&mut self, name: &str) -> Atom {
        self.atoms.intern(name)
    }

    /// The graph's atom registry.
    #[must_use]
    pub fn atoms(&self) -> &AtomRegistry {
        &self.atoms
    }

    /// Mutable access to the graph's atom registry.
    pub fn atoms_mut(&mut self) -> &mut AtomRegistry {
        &mut self.atoms
    }

    /// The number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the graph has no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `node` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.node(node).is_ok()
    }

    /// Creates a node with no parents, children, or properties.
    pub fn create_node(&mut self) -> NodeId {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(NodeData::default());
            NodeId::new(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).expect("too many nodes for NodeId (u32)");
            self.slots.push(Slot {
                generation: 1,
                node: Some(NodeData::default()),
            });
            NodeId::new(idx, 1)
        }
    }

    /// Destroys `node`, unlinking it from all parents and children.
    ///
    /// Its records, bindings, and any pending transaction notifications are
    /// dropped without firing. The id (and every copy of it) goes stale.
    pub fn destroy_node(&mut self, node: NodeId) -> Result<(), CascadeError> {
        let data = self.node(node)?;
        let parents: SmallVec<[NodeId; INLINE_PARENTS]> = data.parents.clone();
        let children: SmallVec<[NodeId; INLINE_CHILDREN]> = data.children.clone();
        for parent in parents {
            if let Ok(data) = self.node_mut(parent)
                && let Some(pos) = data.children.iter().position(|&c| c == node)
            {
                data.children.remove(pos);
            }
        }
        for child in children {
            if let Ok(data) = self.node_mut(child)
                && let Some(pos) = data.parents.iter().position(|&p| p == node)
            {
                data.parents.remove(pos);
            }
        }
        let slot = &mut self.slots[node.idx()];
        slot.node = None;
        self.free.push(node.index());
        Ok(())
    }

    /// Appends `parent` to `node`'s parent list.
    ///
    /// The new parent has the lowest precedence of the list. Linking a node
    /// to itself, linking twice, or naming a stale id all fail; cycles
    /// through longer paths are permitted and handled by resolution.
    pub fn add_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), CascadeError> {
        let len = self.node(node)?.parents.len();
        self.insert_parent(node, parent, len)
    }

    /// Inserts `parent` into `node`'s parent list at `index`.
    ///
    /// Index 0 is the highest-precedence position. `index` may equal the
    /// current list length to append.
    pub fn insert_parent(
        &mut self,
        node: NodeId,
        parent: NodeId,
        index: usize,
    ) -> Result<(), CascadeError> {
        if node == parent {
            return Err(CascadeError::SelfLink(node));
        }
        let data = self.node(node)?;
        self.node(parent)?;
        if data.parents.contains(&parent) {
            return Err(CascadeError::LinkExists { node, parent });
        }
        let len = data.parents.len();
        if index > len {
            return Err(CascadeError::IndexOutOfBounds { index, len });
        }
        // All checks passed; both mutations below are infallible.
        self.node_mut(node)?.parents.insert(index, parent);
        self.node_mut(parent)?.children.push(node);
        Ok(())
    }

    /// Removes `parent` from `node`'s parent list.
    pub fn remove_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), CascadeError> {
        let data = self.node_mut(node)?;
        let Some(pos) = data.parents.iter().position(|&p| p == parent) else {
            return Err(CascadeError::LinkMissing { node, parent });
        };
        data.parents.remove(pos);
        // The edge existed, so the parent is alive and lists the node.
        if let Ok(data) = self.node_mut(parent)
            && let Some(pos) = data.children.iter().position(|&c| c == node)
        {
            data.children.remove(pos);
        }
        Ok(())
    }

    /// Appends `child` to `parent`'s child list; the mirror of
    /// [`add_parent`](Self::add_parent) with the same edge semantics.
    ///
    /// The new edge lands at the end of `child`'s parent list, so it has the
    /// lowest precedence for `child`'s resolution.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), CascadeError> {
        self.add_parent(child, parent)
    }

    /// Inserts `child` into `parent`'s child list at `index`.
    ///
    /// Child order decides notification delivery order, not precedence; the
    /// edge still appends `parent` at the lowest-precedence end of `child`'s
    /// parent list. `index` may equal the current list length to append.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), CascadeError> {
        if parent == child {
            return Err(CascadeError::SelfLink(parent));
        }
        let data = self.node(parent)?;
        self.node(child)?;
        if data.children.contains(&child) {
            return Err(CascadeError::LinkExists { node: child, parent });
        }
        let len = data.children.len();
        if index > len {
            return Err(CascadeError::IndexOutOfBounds { index, len });
        }
        // All checks passed; both mutations below are infallible.
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parents.push(parent);
        Ok(())
    }

    /// Removes `child` from `parent`'s child list.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), CascadeError> {
        self.remove_parent(child, parent)
    }

    /// The number of parents of `node`.
    pub fn parent_count(&self, node: NodeId) -> Result<usize, CascadeError> {
        Ok(self.node(node)?.parents.len())
    }

    /// The number of children of `node`.
    pub fn child_count(&self, node: NodeId) -> Result<usize, CascadeError> {
        Ok(self.node(node)?.children.len())
    }

    /// The parent at `index` in precedence order.
    pub fn parent_at(&self, node: NodeId, index: usize) -> Result<NodeId, CascadeError> {
        let parents = &self.node(node)?.parents;
        parents.get(index).copied().ok_or(CascadeError::IndexOutOfBounds {
            index,
            len: parents.len(),
        })
    }

    /// The child at `index` in link order.
    pub fn child_at(&self, node: NodeId, index: usize) -> Result<NodeId, CascadeError> {
        let children = &self.node(node)?.children;
        children.get(index).copied().ok_or(CascadeError::IndexOutOfBounds {
            index,
            len: children.len(),
        })
    }

    /// The parents of `node` in precedence order.
    pub fn parents(&self, node: NodeId) -> Result<&[NodeId], CascadeError> {
        Ok(&self.node(node)?.parents)
    }

    /// The children of `node` in link order.
    pub fn children(&self, node: NodeId) -> Result<&[NodeId], CascadeError> {
        Ok(&self.node(node)?.children)
    }

    /// Whether `parent` is a direct parent of `node`.
    pub fn has_parent(&self, node: NodeId, parent: NodeId) -> Result<bool, CascadeError> {
        Ok(self.node(node)?.parents.contains(&parent))
    }

    /// Whether `child` is a direct child of `node`.
    pub fn has_child(&self, node: NodeId, child: NodeId) -> Result<bool, CascadeError> {
        Ok(self.node(node)?.children.contains(&child))
    }

    /// Whether `ancestor` is reachable from `node` through one or more
    /// parent edges. Allocates traversal scratch per call.
    pub fn has_ancestor(&self, node: NodeId, ancestor: NodeId) -> Result<bool, CascadeError> {
        let start = self.node(node)?;
        self.node(ancestor)?;
        let mut stack: Vec<NodeId> = start.parents.iter().copied().collect();
        let mut visited: HashSet<NodeId> = HashSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if current == ancestor {
                return Ok(true);
            }
            if let Ok(data) = self.node(current) {
                stack.extend(data.parents.iter().copied());
            }
        }
        Ok(false)
    }

    /// Whether `descendant` is reachable from `node` through one or more
    /// child edges. Allocates traversal scratch per call.
    pub fn has_descendant(&self, node: NodeId, descendant: NodeId) -> Result<bool, CascadeError> {
        let start = self.node(node)?;
        self.node(descendant)?;
        let mut stack: Vec<NodeId> = start.children.iter().copied().collect();
        let mut visited: HashSet<NodeId> = HashSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if current == descendant {
                return Ok(true);
            }
            if let Ok(data) = self.node(current) {
                stack.extend(data.children.iter().copied());
            }
        }
        Ok(false)
    }

    /// Whether linking `node` under `parent` would close a cycle.
    ///
    /// Advisory only: [`add_parent`](Self::add_parent) does not reject
    /// cycles, it relies on visited sets instead. Callers that want acyclic
    /// graphs can check here first.
    pub fn would_create_cycle(&self, node: NodeId, parent: NodeId) -> Result<bool, CascadeError> {
        self.node(node)?;
        self.node(parent)?;
        if node == parent {
            return Ok(true);
        }
        self.has_ancestor(parent, node)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&NodeData, CascadeError> {
        self.slots
            .get(id.idx())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(CascadeError::StaleNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, CascadeError> {
        self.slots
            .get_mut(id.idx())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(CascadeError::StaleNode(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_with_generation_one() {
        let mut graph = StyleGraph::with_capacity(8);
        assert!(graph.is_empty());
        let a = graph.create_node();
        let b = graph.create_node();
        assert_ne!(a, b);
        assert_eq!(graph.len(), 2);
        assert!(graph.is_alive(a));
        assert!(graph.is_alive(b));
    }

    #[test]
    fn destroyed_ids_go_stale_even_after_reuse() {
        let mut graph = StyleGraph::new();
        let a = graph.create_node();
        graph.destroy_node(a).unwrap();
        assert!(!graph.is_alive(a));
        assert_eq!(graph.destroy_node(a), Err(CascadeError::StaleNode(a)));
        let b = graph.create_node();
        // The slot is reused but the old id stays dead.
        assert_eq!(b.idx(), a.idx());
        assert!(!graph.is_alive(a));
        assert!(graph.is_alive(b));
    }

    #[test]
    fn parent_order_is_precedence_order() {
        let mut graph = StyleGraph::new();
        let node = graph.create_node();
        let first = graph.create_node();
        let second = graph.create_node();
        let inserted = graph.create_node();
        graph.add_parent(node, first).unwrap();
        graph.add_parent(node, second).unwrap();
        graph.insert_parent(node, inserted, 0).unwrap();
        assert_eq!(graph.parents(node).unwrap(), &[inserted, first, second]);
        assert_eq!(graph.parent_at(node, 0).unwrap(), inserted);
        assert_eq!(graph.child_at(first, 0).unwrap(), node);
        assert!(graph.has_child(first, node).unwrap());
    }

    #[test]
    fn link_validation() {
        let mut graph = StyleGraph::new();
        let node = graph.create_node();
        let parent = graph.create_node();
        assert_eq!(graph.add_parent(node, node), Err(CascadeError::SelfLink(node)));
        graph.add_parent(node, parent).unwrap();
        assert_eq!(
            graph.add_parent(node, parent),
            Err(CascadeError::LinkExists { node, parent })
        );
        let extra = graph.create_node();
        assert_eq!(
            graph.insert_parent(node, extra, 5),
            Err(CascadeError::IndexOutOfBounds { index: 5, len: 1 })
        );
        assert_eq!(
            graph.remove_parent(parent, node),
            Err(CascadeError::LinkMissing { node: parent, parent: node })
        );
    }

    #[test]
    fn destroy_unlinks_both_directions() {
        let mut graph = StyleGraph::new();
        let top = graph.create_node();
        let mid = graph.create_node();
        let bottom = graph.create_node();
        graph.add_parent(mid, top).unwrap();
        graph.add_parent(bottom, mid).unwrap();
        graph.destroy_node(mid).unwrap();
        assert_eq!(graph.child_count(top).unwrap(), 0);
        assert_eq!(graph.parent_count(bottom).unwrap(), 0);
    }

    #[test]
    fn ancestor_queries_cross_diamonds() {
        let mut graph = StyleGraph::new();
        let root = graph.create_node();
        let left = graph.create_node();
        let right = graph.create_node();
        let leaf = graph.create_node();
        graph.add_parent(left, root).unwrap();
        graph.add_parent(right, root).unwrap();
        graph.add_parent(leaf, left).unwrap();
        graph.add_parent(leaf, right).unwrap();
        assert!(graph.has_ancestor(leaf, root).unwrap());
        assert!(graph.has_descendant(root, leaf).unwrap());
        assert!(!graph.has_ancestor(root, leaf).unwrap());
    }

    #[test]
    fn insert_child_orders_the_fanout_list() {
        let mut graph = StyleGraph::new();
        let parent = graph.create_node();
        let a = graph.create_node();
        let b = graph.create_node();
        let c = graph.create_node();
        graph.add_child(parent, a).unwrap();
        graph.add_child(parent, b).unwrap();
        graph.insert_child(parent, c, 1).unwrap();
        assert_eq!(graph.children(parent).unwrap(), &[a, c, b]);
        assert_eq!(graph.parents(c).unwrap(), &[parent]);
        assert_eq!(
            graph.insert_child(parent, a, 0),
            Err(CascadeError::LinkExists { node: a, parent })
        );
    }

    #[test]
    fn cycle_probe_is_advisory() {
        let mut graph = StyleGraph::new();
        let a = graph.create_node();
        let b = graph.create_node();
        graph.add_parent(b, a).unwrap();
        assert!(graph.would_create_cycle(a, b).unwrap());
        assert!(graph.would_create_cycle(a, a).unwrap());
        assert!(!graph.would_create_cycle(b, a).unwrap());
        // The link is still allowed; traversals tolerate the loop.
        graph.add_parent(a, b).unwrap();
        assert!(graph.has_ancestor(a, a).unwrap());
    }
}
