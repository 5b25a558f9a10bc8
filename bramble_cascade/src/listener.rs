// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener bindings: per-node callbacks that follow a property.

use alloc::boxed::Box;
use core::fmt;

use bramble_atom::Atom;

use crate::error::CascadeError;
use crate::graph::StyleGraph;
use crate::node::NodeId;
use crate::value::{PropertyType, PropertyValue};

/// Identifier for one binding on one node.
///
/// Ids are unique within a graph and never reused, so a stale id simply
/// fails to unbind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindingId(pub(crate) u64);

impl BindingId {
    /// The raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// A property change being delivered to a listener.
#[derive(Copy, Clone, Debug)]
pub struct PropertyChange<'a> {
    /// The node the listener is bound to.
    pub node: NodeId,
    /// The atom that changed.
    pub atom: Atom,
    /// The effective value at `node` after the change.
    pub value: &'a PropertyValue,
}

/// Callback interface for property changes.
///
/// Listeners run during notification with the graph borrowed, so they
/// cannot call back into it; they should record what they need and act
/// after the mutating call returns. A returned error is ignored by the
/// graph and never stops delivery to other listeners.
pub trait PropertyListener {
    /// Called once per delivered change.
    fn notify(&mut self, change: &PropertyChange<'_>) -> Result<(), CascadeError>;
}

impl<F> PropertyListener for F
where
    F: for<'a> FnMut(&PropertyChange<'a>) -> Result<(), CascadeError>,
{
    fn notify(&mut self, change: &PropertyChange<'_>) -> Result<(), CascadeError> {
        self(change)
    }
}

/// Adapter that unwraps boolean payloads for [`StyleGraph::bind_bool`].
struct BoolListener<F: FnMut(bool)> {
    callback: F,
}

impl<F: FnMut(bool)> PropertyListener for BoolListener<F> {
    fn notify(&mut self, change: &PropertyChange<'_>) -> Result<(), CascadeError> {
        match change.value {
            PropertyValue::Bool(v) => {
                (self.callback)(*v);
                Ok(())
            }
            other => Err(CascadeError::TypeMismatch {
                atom: change.atom,
                expected: other.property_type(),
                found: PropertyType::Bool,
            }),
        }
    }
}

/// Adapter that unwraps integer payloads for [`StyleGraph::bind_int`].
struct IntListener<F: FnMut(i64)> {
    callback: F,
}

impl<F: FnMut(i64)> PropertyListener for IntListener<F> {
    fn notify(&mut self, change: &PropertyChange<'_>) -> Result<(), CascadeError> {
        match change.value {
            PropertyValue::Int(v) => {
                (self.callback)(*v);
                Ok(())
            }
            other => Err(CascadeError::TypeMismatch {
                atom: change.atom,
                expected: other.property_type(),
                found: PropertyType::Int,
            }),
        }
    }
}

/// Adapter that unwraps float payloads for [`StyleGraph::bind_float`].
struct FloatListener<F: FnMut(f64)> {
    callback: F,
}

impl<F: FnMut(f64)> PropertyListener for FloatListener<F> {
    fn notify(&mut self, change: &PropertyChange<'_>) -> Result<(), CascadeError> {
        match change.value {
            PropertyValue::Float(v) => {
                (self.callback)(*v);
                Ok(())
            }
            other => Err(CascadeError::TypeMismatch {
                atom: change.atom,
                expected: other.property_type(),
                found: PropertyType::Float,
            }),
        }
    }
}

/// Adapter that unwraps string payloads for [`StyleGraph::bind_string`].
struct StringListener<F: FnMut(&str)> {
    callback: F,
}

impl<F: FnMut(&str)> PropertyListener for StringListener<F> {
    fn notify(&mut self, change: &PropertyChange<'_>) -> Result<(), CascadeError> {
        match change.value {
            PropertyValue::String(v) => {
                (self.callback)(v);
                Ok(())
            }
            other => Err(CascadeError::TypeMismatch {
                atom: change.atom,
                expected: other.property_type(),
                found: PropertyType::String,
            }),
        }
    }
}

/// One registered listener on one node.
pub(crate) struct Binding {
    pub(crate) id: BindingId,
    pub(crate) atom: Atom,
    pub(crate) ty: PropertyType,
    pub(crate) listener: Box<dyn PropertyListener>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("atom", &self.atom)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

impl StyleGraph {
    /// Registers `listener` on `node` for changes to `atom`, declared as
    /// `ty`.
    ///
    /// Binding does not require the atom to be defined yet; widgets bind
    /// before a style loader fills the graph in. If the chain already
    /// declares the atom with another type the call fails with
    /// [`CascadeError::TypeMismatch`]. Deliveries are gated on `ty`, so a
    /// binding whose declared type turns out wrong is skipped rather than
    /// fed a foreign payload.
    ///
    /// Listeners on the same node fire in registration order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bramble_cascade::{CascadeError, PropertyChange, PropertyType, StyleGraph};
    ///
    /// let mut graph = StyleGraph::new();
    /// let node = graph.create_node();
    /// let width = graph.atom("width");
    ///
    /// graph
    ///     .bind(node, width, PropertyType::Int, |change: &PropertyChange<'_>| {
    ///         println!("width is now {:?}", change.value);
    ///         Ok::<(), CascadeError>(())
    ///     })
    ///     .unwrap();
    ///
    /// graph.create_int(node, width, 640).unwrap();
    /// ```
    pub fn bind(
        &mut self,
        node: NodeId,
        atom: Atom,
        ty: PropertyType,
        listener: impl PropertyListener + 'static,
    ) -> Result<BindingId, CascadeError> {
        self.node(node)?;
        if let Some(declared) = self.declared_type(node, atom)
            && declared != ty
        {
            return Err(CascadeError::TypeMismatch {
                atom,
                expected: declared,
                found: ty,
            });
        }
        let id = BindingId(self.next_binding);
        self.next_binding += 1;
        let data = self.node_mut(node)?;
        data.bindings.push(Binding {
            id,
            atom,
            ty,
            listener: Box::new(listener),
        });
        if let Some(rec) = data.find_record_mut(atom) {
            rec.ref_count += 1;
        }
        Ok(id)
    }

    /// [`bind`](Self::bind) with a `FnMut(bool)` callback.
    pub fn bind_bool(
        &mut self,
        node: NodeId,
        atom: Atom,
        callback: impl FnMut(bool) + 'static,
    ) -> Result<BindingId, CascadeError> {
        self.bind(node, atom, PropertyType::Bool, BoolListener { callback })
    }

    /// [`bind`](Self::bind) with a `FnMut(i64)` callback.
    pub fn bind_int(
        &mut self,
        node: NodeId,
        atom: Atom,
        callback: impl FnMut(i64) + 'static,
    ) -> Result<BindingId, CascadeError> {
        self.bind(node, atom, PropertyType::Int, IntListener { callback })
    }

    /// [`bind`](Self::bind) with a `FnMut(f64)` callback.
    pub fn bind_float(
        &mut self,
        node: NodeId,
        atom: Atom,
        callback: impl FnMut(f64) + 'static,
    ) -> Result<BindingId, CascadeError> {
        self.bind(node, atom, PropertyType::Float, FloatListener { callback })
    }

    /// [`bind`](Self::bind) with a `FnMut(&str)` callback.
    pub fn bind_string(
        &mut self,
        node: NodeId,
        atom: Atom,
        callback: impl FnMut(&str) + 'static,
    ) -> Result<BindingId, CascadeError> {
        self.bind(node, atom, PropertyType::String, StringListener { callback })
    }

    /// Drops the binding with id `binding` from `node`.
    pub fn unbind(&mut self, node: NodeId, binding: BindingId) -> Result<(), CascadeError> {
        let data = self.node_mut(node)?;
        let Some(pos) = data.bindings.iter().position(|b| b.id == binding) else {
            return Err(CascadeError::BindingMissing { binding });
        };
        let atom = data.bindings[pos].atom;
        data.bindings.remove(pos);
        if let Some(rec) = data.find_record_mut(atom) {
            rec.ref_count = rec.ref_count.saturating_sub(1);
        }
        Ok(())
    }

    /// Whether any binding on `node` follows `atom`.
    pub fn is_bound(&self, node: NodeId, atom: Atom) -> Result<bool, CascadeError> {
        Ok(self.node(node)?.bindings.iter().any(|b| b.atom == atom))
    }

    /// The number of bindings on `node`, over all atoms.
    pub fn listener_count(&self, node: NodeId) -> Result<usize, CascadeError> {
        Ok(self.node(node)?.bindings.len())
    }

    /// The number of bindings on `node` for `atom`.
    pub fn binding_count(&self, node: NodeId, atom: Atom) -> Result<usize, CascadeError> {
        Ok(self
            .node(node)?
            .bindings
            .iter()
            .filter(|b| b.atom == atom)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;

    #[test]
    fn callbacks_fire_on_change() {
        let mut graph = StyleGraph::new();
        let node = graph.create_node();
        let width = graph.atom("width");
        let seen: Rc<RefCell<Vec<i64>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        graph
            .bind_int(node, width, move |v| sink.borrow_mut().push(v))
            .unwrap();
        graph.create_int(node, width, 10).unwrap();
        graph.set_int(node, width, 20).unwrap();
        graph.set_int(node, width, 20).unwrap();
        assert_eq!(*seen.borrow(), [10, 20]);
    }

    #[test]
    fn unbind_stops_delivery_and_drops_the_ref() {
        let mut graph = StyleGraph::new();
        let node = graph.create_node();
        let width = graph.atom("width");
        graph.create_int(node, width, 0).unwrap();
        let seen: Rc<RefCell<Vec<i64>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = graph
            .bind_int(node, width, move |v| sink.borrow_mut().push(v))
            .unwrap();
        assert_eq!(graph.ref_count(node, width).unwrap(), 1);
        graph.set_int(node, width, 1).unwrap();
        graph.unbind(node, id).unwrap();
        graph.set_int(node, width, 2).unwrap();
        assert_eq!(*seen.borrow(), [1]);
        assert_eq!(graph.ref_count(node, width).unwrap(), 0);
        assert_eq!(
            graph.unbind(node, id),
            Err(CascadeError::BindingMissing { binding: id })
        );
    }

    #[test]
    fn bind_checks_the_declared_type() {
        let mut graph = StyleGraph::new();
        let node = graph.create_node();
        let width = graph.atom("width");
        graph.create_float(node, width, 1.0).unwrap();
        let err = graph.bind_int(node, width, |_| {}).unwrap_err();
        assert_eq!(
            err,
            CascadeError::TypeMismatch {
                atom: width,
                expected: PropertyType::Float,
                found: PropertyType::Int,
            }
        );
    }

    #[test]
    fn binding_before_any_declaration_is_allowed() {
        let mut graph = StyleGraph::new();
        let node = graph.create_node();
        let label = graph.atom("label");
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        graph
            .bind_string(node, label, move |v| sink.borrow_mut().push(String::from(v)))
            .unwrap();
        assert!(graph.is_bound(node, label).unwrap());
        graph.create_string(node, label, "ready").unwrap();
        assert_eq!(*seen.borrow(), ["ready"]);
        // The record picked up the pre-existing binding.
        assert_eq!(graph.ref_count(node, label).unwrap(), 1);
    }

    #[test]
    fn a_failing_listener_does_not_block_the_next() {
        let mut graph = StyleGraph::new();
        let node = graph.create_node();
        let width = graph.atom("width");
        let seen: Rc<RefCell<Vec<i64>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let failing = |change: &PropertyChange<'_>| -> Result<(), CascadeError> {
            Err(CascadeError::PropertyMissing { atom: change.atom })
        };
        graph.bind(node, width, PropertyType::Int, failing).unwrap();
        graph
            .bind_int(node, width, move |v| sink.borrow_mut().push(v))
            .unwrap();
        graph.create_int(node, width, 5).unwrap();
        assert_eq!(*seen.borrow(), [5]);
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let mut graph = StyleGraph::new();
        let node = graph.create_node();
        let width = graph.atom("width");
        let seen: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&seen);
        let second = Rc::clone(&seen);
        graph
            .bind_int(node, width, move |_| first.borrow_mut().push("first"))
            .unwrap();
        graph
            .bind_int(node, width, move |_| second.borrow_mut().push("second"))
            .unwrap();
        graph.create_int(node, width, 1).unwrap();
        assert_eq!(*seen.borrow(), ["first", "second"]);
    }
}
