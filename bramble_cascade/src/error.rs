// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by all fallible graph operations.

use core::fmt;

use bramble_atom::Atom;

use crate::listener::BindingId;
use crate::node::NodeId;
use crate::value::PropertyType;

/// Error returned by fallible [`StyleGraph`](crate::StyleGraph) operations.
///
/// Every variant names the node, atom, or binding that the failed call was
/// about, so callers can report the failure without re-deriving context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CascadeError {
    /// The node id refers to a slot that was destroyed or never created.
    ///
    /// Ids are generational: once a node is destroyed, every copy of its id
    /// fails with this error even if the slot has been reused since.
    StaleNode(NodeId),
    /// A node was asked to become its own parent or child.
    SelfLink(NodeId),
    /// An index into a parent or child list was out of range.
    IndexOutOfBounds {
        /// The requested position.
        index: usize,
        /// The length of the list at the time of the call.
        len: usize,
    },
    /// The inheritance edge being added already exists.
    LinkExists {
        /// The inheriting node.
        node: NodeId,
        /// The node it inherits from.
        parent: NodeId,
    },
    /// The inheritance edge being removed does not exist.
    LinkMissing {
        /// The inheriting node.
        node: NodeId,
        /// The node it was expected to inherit from.
        parent: NodeId,
    },
    /// `create` found a local record for the atom with a different type.
    PropertyExists {
        /// The atom that is already declared locally.
        atom: Atom,
    },
    /// No definition for the atom was found where one is required.
    PropertyMissing {
        /// The atom that could not be resolved.
        atom: Atom,
    },
    /// The atom is declared with one type and the call used another.
    ///
    /// `expected` is the type the atom is declared with somewhere in the
    /// inheritance chain; `found` is the type the caller supplied or asked
    /// for.
    TypeMismatch {
        /// The atom whose declaration conflicts with the call.
        atom: Atom,
        /// The declared type.
        expected: PropertyType,
        /// The type involved in the call.
        found: PropertyType,
    },
    /// `remove` was asked to delete an implicit override that still shadows
    /// an inherited definition.
    ///
    /// Deleting such a record would silently re-expose the ancestor value.
    /// Use `set_default` to drop the override instead.
    NotCreated {
        /// The atom whose record is an implicit override.
        atom: Atom,
    },
    /// No binding with the given id is registered on the node.
    BindingMissing {
        /// The id passed to `unbind`.
        binding: BindingId,
    },
}

impl fmt::Display for CascadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleNode(node) => {
                write!(f, "node {node:?} is stale or was never created")
            }
            Self::SelfLink(node) => {
                write!(f, "node {node:?} cannot be linked to itself")
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} is out of bounds for a list of length {len}")
            }
            Self::LinkExists { node, parent } => {
                write!(f, "node {node:?} already inherits from {parent:?}")
            }
            Self::LinkMissing { node, parent } => {
                write!(f, "node {node:?} does not inherit from {parent:?}")
            }
            Self::PropertyExists { atom } => {
                write!(f, "atom {atom:?} is already declared locally with another type")
            }
            Self::PropertyMissing { atom } => {
                write!(f, "atom {atom:?} is not defined on the node or its ancestors")
            }
            Self::TypeMismatch {
                atom,
                expected,
                found,
            } => {
                write!(
                    f,
                    "atom {atom:?} is declared as {expected} but the call used {found}"
                )
            }
            Self::NotCreated { atom } => {
                write!(
                    f,
                    "atom {atom:?} is an implicit override that still shadows an inherited value"
                )
            }
            Self::BindingMissing { binding } => {
                write!(f, "binding {binding:?} is not registered on the node")
            }
        }
    }
}

impl core::error::Error for CascadeError {}
