// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A style graph with multiple-inheritance property cascade.
//!
//! The main type is [`StyleGraph`]: a set of nodes, each holding typed
//! property records, linked by ordered parent edges. It provides:
//!
//! - Cascade resolution: a read checks the node, then its parents
//!   depth-first in precedence order, so styles compose like prototype
//!   chains.
//! - Change notification: listeners bound to a node hear about changes to
//!   a property's effective value, including changes that happen on an
//!   ancestor.
//! - Transactions: writes on a node can be batched so that listeners see
//!   one notification per property with the final value.
//!
//! ## Quick start
//!
//! ```
//! use bramble_cascade::StyleGraph;
//!
//! let mut graph = StyleGraph::new();
//! let theme = graph.create_node();
//! let button = graph.create_node();
//! graph.add_parent(button, theme)?;
//!
//! let width = graph.atom("border-width");
//! graph.create_int(theme, width, 1)?;
//!
//! // The button inherits the theme's value until it overrides it.
//! assert_eq!(graph.get_int(button, width)?, 1);
//! graph.set_int(button, width, 3)?;
//! assert_eq!(graph.get_int(button, width)?, 3);
//!
//! // Resetting the override re-exposes the inherited value.
//! graph.set_default(button, width)?;
//! assert_eq!(graph.get_int(button, width)?, 1);
//! # Ok::<(), bramble_cascade::CascadeError>(())
//! ```
//!
//! ## Resolution order
//!
//! A node's parent list is ordered by precedence: index 0 wins. Resolution
//! is a depth-first walk, so the whole chain behind the first parent is
//! searched before the second parent is considered. Diamonds and cycles
//! are fine; every walk carries a visited set and touches each node once.
//!
//! ## Listeners and the cascade
//!
//! Changing a property notifies the node's own listeners and then cascades
//! to descendants that inherit the value. A branch stops as soon as it
//! reaches a node whose own record shadows the atom, since nothing
//! observable changed there.
//!
//! ```
//! use bramble_cascade::StyleGraph;
//!
//! let mut graph = StyleGraph::new();
//! let theme = graph.create_node();
//! let label = graph.create_node();
//! graph.add_parent(label, theme)?;
//!
//! let size = graph.atom("font-size");
//! graph.create_float(theme, size, 12.0)?;
//! graph.bind_float(label, size, |pt| println!("label is now {pt}pt"))?;
//!
//! // Restyling the theme reaches the label through inheritance.
//! graph.set_float(theme, size, 14.0)?;
//! # Ok::<(), bramble_cascade::CascadeError>(())
//! ```
//!
//! ## Transactions
//!
//! [`begin`](StyleGraph::begin) and [`end`](StyleGraph::end) bracket a
//! batch of writes on one node. Notifications queue on the records while
//! the transaction is open and flush once at the outermost `end`, each
//! property delivering its final value exactly once.
//!
//! ## Explaining a wave
//!
//! The `*_with_trace` entry points report every node a change reaches to a
//! [`NotifyTrace`]. [`OneOriginRecorder`] records enough to answer "why
//! did this node get notified?" with the full inheritance path.
//!
//! Property names are interned [`Atom`]s from an [`AtomRegistry`] the
//! graph owns, so hot paths compare ids instead of strings.
//!
//! This crate is `#![no_std]` (it requires `alloc`).

#![no_std]

extern crate alloc;

mod error;
mod graph;
mod listener;
mod node;
mod notify;
mod property;
mod resolve;
mod trace;
mod value;

pub use bramble_atom::{Atom, AtomRegistry};

pub use error::CascadeError;
pub use graph::StyleGraph;
pub use listener::{BindingId, PropertyChange, PropertyListener};
pub use node::NodeId;
pub use property::{PropertyFlags, PropertyRecord};
pub use trace::{NotifyCause, NotifyTrace, OneOriginRecorder};
pub use value::{PropertyType, PropertyValue};
