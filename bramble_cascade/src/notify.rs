// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change propagation and transactional batching.

use alloc::vec::Vec;
use core::mem;
use hashbrown::HashSet;
use smallvec::SmallVec;

use bramble_atom::Atom;

use crate::error::CascadeError;
use crate::graph::StyleGraph;
use crate::listener::PropertyChange;
use crate::node::NodeId;
use crate::property::PropertyFlags;
use crate::trace::NotifyTrace;
use crate::value::PropertyValue;

/// Reusable buffers for descendant collection. Taken out of the graph for
/// the duration of a flush and put back with capacity intact.
#[derive(Debug, Default)]
pub(crate) struct NotifyScratch {
    /// Pending `(node, inherited from)` pairs of the cascade walk.
    stack: Vec<(NodeId, NodeId)>,
    visited: HashSet<NodeId>,
    targets: Vec<NodeId>,
}

impl NotifyScratch {
    fn clear(&mut self) {
        self.stack.clear();
        self.visited.clear();
        self.targets.clear();
    }
}

impl StyleGraph {
    /// Opens a transaction on `node`.
    ///
    /// While a node has an open transaction, its property changes are
    /// queued on the records instead of delivered. Transactions nest; the
    /// outermost [`end`](Self::end) flushes. Transactions are per node: a
    /// child's open transaction does not defer deliveries arriving from an
    /// ancestor's flush.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    /// use bramble_cascade::StyleGraph;
    ///
    /// let mut graph = StyleGraph::new();
    /// let node = graph.create_node();
    /// let width = graph.atom("width");
    ///
    /// let hits = Rc::new(Cell::new(0));
    /// let sink = Rc::clone(&hits);
    /// graph
    ///     .bind_int(node, width, move |_| sink.set(sink.get() + 1))
    ///     .unwrap();
    ///
    /// graph.begin(node).unwrap();
    /// graph.create_int(node, width, 1).unwrap();
    /// graph.set_int(node, width, 2).unwrap();
    /// graph.set_int(node, width, 3).unwrap();
    /// assert_eq!(hits.get(), 0);
    ///
    /// graph.end(node).unwrap();
    /// assert_eq!(hits.get(), 1);
    /// assert_eq!(graph.get_int(node, width).unwrap(), 3);
    /// ```
    pub fn begin(&mut self, node: NodeId) -> Result<(), CascadeError> {
        self.node_mut(node)?.lock += 1;
        Ok(())
    }

    /// Closes a transaction on `node`.
    ///
    /// Closing the outermost transaction delivers one notification per
    /// changed property, in atom order, each carrying the property's final
    /// effective value. A property that changed several times flushes once;
    /// intermediate values are never seen, and a property that ended up
    /// back at its starting value still flushes its queued notification.
    ///
    /// An `end` without a matching [`begin`](Self::begin) is a no-op.
    pub fn end(&mut self, node: NodeId) -> Result<(), CascadeError> {
        self.end_inner(node, None)
    }

    /// [`end`](Self::end) that also reports each notified node to `trace`.
    pub fn end_with_trace(
        &mut self,
        node: NodeId,
        trace: &mut dyn NotifyTrace,
    ) -> Result<(), CascadeError> {
        self.end_inner(node, Some(trace))
    }

    /// The open transaction depth of `node`.
    pub fn transaction_depth(&self, node: NodeId) -> Result<u32, CascadeError> {
        Ok(self.node(node)?.lock)
    }

    fn end_inner(
        &mut self,
        node: NodeId,
        mut trace: Option<&mut (dyn NotifyTrace + '_)>,
    ) -> Result<(), CascadeError> {
        let data = self.node_mut(node)?;
        if data.lock == 0 {
            return Ok(());
        }
        data.lock -= 1;
        if data.lock > 0 || !data.delayed {
            return Ok(());
        }
        data.delayed = false;
        let mut pending: SmallVec<[(Atom, PropertyFlags); 8]> = SmallVec::new();
        for rec in &mut data.records {
            let passes =
                rec.flags & (PropertyFlags::NOTIFY_LISTENERS | PropertyFlags::NOTIFY_CHILDREN);
            if !passes.is_empty() {
                rec.flags.remove(passes);
                pending.push((rec.atom, passes));
            }
        }
        for (atom, passes) in pending {
            self.flush_property(node, atom, passes, trace.as_deref_mut());
        }
        Ok(())
    }

    /// Queues a change notification if `origin` is inside a transaction,
    /// otherwise delivers it right away.
    pub(crate) fn queue_or_deliver(
        &mut self,
        origin: NodeId,
        atom: Atom,
        trace: Option<&mut (dyn NotifyTrace + '_)>,
    ) {
        let Ok(data) = self.node_mut(origin) else {
            return;
        };
        if data.lock > 0 {
            if let Some(rec) = data.find_record_mut(atom) {
                rec.flags
                    .insert(PropertyFlags::NOTIFY_LISTENERS | PropertyFlags::NOTIFY_CHILDREN);
                data.delayed = true;
            }
        } else {
            self.flush_property(
                origin,
                atom,
                PropertyFlags::NOTIFY_LISTENERS | PropertyFlags::NOTIFY_CHILDREN,
                trace,
            );
        }
    }

    /// Delivers one property change from `origin`: to its own listeners,
    /// and down the child cascade until shadowed.
    ///
    /// Each target is handed the value it resolves at delivery time. A
    /// descendant whose resolution is won by a nearer co-parent is still
    /// part of the wave, but it hears its own effective value, not the
    /// origin's.
    fn flush_property(
        &mut self,
        origin: NodeId,
        atom: Atom,
        passes: PropertyFlags,
        mut trace: Option<&mut (dyn NotifyTrace + '_)>,
    ) {
        if self.effective_value(origin, atom).is_none() {
            return;
        }
        let mut scratch = mem::take(&mut self.scratch);
        scratch.clear();
        if passes.contains(PropertyFlags::NOTIFY_LISTENERS) {
            if let Some(trace) = trace.as_deref_mut() {
                trace.origin(origin, atom);
            }
            scratch.targets.push(origin);
        }
        if passes.contains(PropertyFlags::NOTIFY_CHILDREN) {
            self.collect_descendants(origin, atom, &mut scratch, trace);
        }
        for &target in &scratch.targets {
            let Some(value) = self.effective_value(target, atom) else {
                continue;
            };
            self.deliver(target, atom, &value);
        }
        self.scratch = scratch;
    }

    /// Pre-order walk over `origin`'s descendants, in child link order,
    /// adding every node that inherits the changed atom to the target list.
    /// Branches stop at nodes with a value-bearing local record; diamonds
    /// and cycles are crossed at most once.
    fn collect_descendants(
        &self,
        origin: NodeId,
        atom: Atom,
        scratch: &mut NotifyScratch,
        mut trace: Option<&mut (dyn NotifyTrace + '_)>,
    ) {
        scratch.visited.insert(origin);
        let Ok(data) = self.node(origin) else {
            return;
        };
        for &child in data.children.iter().rev() {
            scratch.stack.push((child, origin));
        }
        while let Some((node, from)) = scratch.stack.pop() {
            if !scratch.visited.insert(node) {
                continue;
            }
            let Ok(data) = self.node(node) else { continue };
            if data.has_value_for(atom) {
                if let Some(trace) = trace.as_deref_mut() {
                    trace.stopped(node, atom);
                }
                continue;
            }
            if let Some(trace) = trace.as_deref_mut() {
                trace.cascaded(node, from, atom);
            }
            scratch.targets.push(node);
            for &child in data.children.iter().rev() {
                scratch.stack.push((child, node));
            }
        }
    }

    /// Runs the matching listeners on one target. Listener errors are
    /// dropped; a failing listener never blocks the rest of the wave.
    fn deliver(&mut self, target: NodeId, atom: Atom, value: &PropertyValue) {
        let Ok(data) = self.node_mut(target) else {
            return;
        };
        let ty = value.property_type();
        let change = PropertyChange {
            node: target,
            atom,
            value,
        };
        for binding in data.bindings.iter_mut() {
            if binding.atom == atom && binding.ty == ty {
                let _ = binding.listener.notify(&change);
            }
        }
    }
}
