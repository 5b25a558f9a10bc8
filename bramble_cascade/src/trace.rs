// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hooks for observing and explaining notification waves.
//!
//! A [`NotifyTrace`] passed to the `*_with_trace` entry points hears about
//! every node a change reaches. [`OneOriginRecorder`] is a ready-made sink
//! that keeps one inheritance step per `(node, atom)` and can reconstruct
//! the path a value took from the node that changed to any notified
//! descendant.

use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};

use bramble_atom::Atom;

use crate::node::NodeId;

/// Receiver for notification events.
///
/// Implementations should be cheap; they run inside the delivery wave.
pub trait NotifyTrace {
    /// The property changed on `node` itself and its listeners are about to
    /// run.
    fn origin(&mut self, node: NodeId, atom: Atom);

    /// The change cascades to `node`, which inherits it through `from`.
    fn cascaded(&mut self, node: NodeId, from: NodeId, atom: Atom);

    /// A cascade branch ended at `node` because a local record shadows the
    /// atom there.
    fn stopped(&mut self, node: NodeId, atom: Atom);
}

/// Why a node was notified.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NotifyCause {
    /// The property changed on the node itself.
    Origin,
    /// The change arrived through a parent.
    Inherited {
        /// The parent the value was inherited through.
        from: NodeId,
    },
}

/// A [`NotifyTrace`] that records one cause per `(node, atom)`.
///
/// When a diamond lets a change reach a node along several edges, the first
/// cause wins; that matches delivery order, which visits the leftmost chain
/// first. Reuse across waves by calling [`clear`](Self::clear) in between,
/// otherwise stale causes from earlier waves keep winning.
#[derive(Clone, Debug, Default)]
pub struct OneOriginRecorder {
    causes: HashMap<(NodeId, Atom), NotifyCause>,
}

impl OneOriginRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all recorded causes.
    pub fn clear(&mut self) {
        self.causes.clear();
    }

    /// The recorded cause for `(node, atom)`, if the wave reached it.
    #[must_use]
    pub fn cause(&self, node: NodeId, atom: Atom) -> Option<NotifyCause> {
        self.causes.get(&(node, atom)).copied()
    }

    /// The inheritance path a change took to reach `node`, from the origin
    /// node to `node` inclusive.
    ///
    /// Returns `None` if the wave never reached `node` or the recorded
    /// chain is broken, for example because the recorder was not cleared
    /// between waves.
    #[must_use]
    pub fn explain_path(&self, node: NodeId, atom: Atom) -> Option<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        out.push(node);
        seen.insert(node);
        let mut current = node;
        loop {
            match self.causes.get(&(current, atom))? {
                NotifyCause::Origin => break,
                NotifyCause::Inherited { from } => {
                    if !seen.insert(*from) {
                        return None;
                    }
                    out.push(*from);
                    current = *from;
                }
            }
        }
        out.reverse();
        Some(out)
    }
}

impl NotifyTrace for OneOriginRecorder {
    fn origin(&mut self, node: NodeId, atom: Atom) {
        self.causes.entry((node, atom)).or_insert(NotifyCause::Origin);
    }

    fn cascaded(&mut self, node: NodeId, from: NodeId, atom: Atom) {
        self.causes
            .entry((node, atom))
            .or_insert(NotifyCause::Inherited { from });
    }

    fn stopped(&mut self, _node: NodeId, _atom: Atom) {}
}
