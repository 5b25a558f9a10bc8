// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Local property records and the write operations that mutate them.

use alloc::string::String;

use bramble_atom::Atom;

use crate::error::CascadeError;
use crate::graph::StyleGraph;
use crate::node::NodeId;
use crate::trace::NotifyTrace;
use crate::value::{PropertyType, PropertyValue};

bitflags::bitflags! {
    /// State bits of a [`PropertyRecord`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PropertyFlags: u8 {
        /// The record was explicitly created on this node and owns a
        /// captured default value.
        const CREATED = 1 << 0;
        /// The record's value was set locally and shadows both the captured
        /// default and any inherited definition.
        const OVERRIDDEN = 1 << 1;
        /// A listener pass is owed for this record at the next transaction
        /// flush.
        const NOTIFY_LISTENERS = 1 << 2;
        /// A child cascade pass is owed for this record at the next
        /// transaction flush.
        const NOTIFY_CHILDREN = 1 << 3;
    }
}

/// One node's local definition of one property.
///
/// A record always pins the atom's type for the node and its descendants.
/// Its value slot may be empty: that happens when an override is reset while
/// an ancestor still defines the atom, in which case the record keeps type
/// and binding bookkeeping but no longer shadows the ancestor.
#[derive(Clone, Debug)]
pub struct PropertyRecord {
    pub(crate) atom: Atom,
    pub(crate) ty: PropertyType,
    pub(crate) flags: PropertyFlags,
    pub(crate) ref_count: u32,
    pub(crate) revision: u64,
    pub(crate) value: Option<PropertyValue>,
    pub(crate) default: Option<PropertyValue>,
}

impl PropertyRecord {
    /// A record made by `create`: the value doubles as the captured default.
    pub(crate) fn created(atom: Atom, value: PropertyValue) -> Self {
        let ty = value.property_type();
        Self {
            atom,
            ty,
            flags: PropertyFlags::CREATED,
            ref_count: 0,
            revision: 0,
            default: Some(value.clone()),
            value: Some(value),
        }
    }

    /// A record materialized by a `set` on a node with no local definition.
    /// There is no default to capture; resetting it later defers to the
    /// inheritance chain.
    pub(crate) fn overridden(atom: Atom, value: PropertyValue) -> Self {
        let ty = value.property_type();
        Self {
            atom,
            ty,
            flags: PropertyFlags::OVERRIDDEN,
            ref_count: 0,
            revision: 0,
            default: None,
            value: Some(value),
        }
    }

    /// The atom this record defines.
    #[must_use]
    pub fn atom(&self) -> Atom {
        self.atom
    }

    /// The type the record pins for the atom.
    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        self.ty
    }

    /// The record's state bits.
    #[must_use]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    /// How many bindings on the owning node reference this record's atom.
    #[must_use]
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Counts value mutations since the record appeared. Writes that leave
    /// the effective value unchanged do not bump it.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The locally stored value, if the record currently shadows.
    #[must_use]
    pub fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    /// The default captured at creation, if the record was `create`d.
    #[must_use]
    pub fn default_value(&self) -> Option<&PropertyValue> {
        self.default.as_ref()
    }

    /// Whether the record was explicitly created on its node.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.flags.contains(PropertyFlags::CREATED)
    }

    /// Whether the record's value was set locally.
    #[must_use]
    pub fn is_overridden(&self) -> bool {
        self.flags.contains(PropertyFlags::OVERRIDDEN)
    }
}

impl StyleGraph {
    /// Declares `atom` on `node` with an initial value that doubles as the
    /// node's default for it.
    ///
    /// Re-creating an atom that already has a local record of the same type
    /// re-initializes value and default in place. A local record of another
    /// type fails with [`CascadeError::PropertyExists`]; a conflicting
    /// declaration elsewhere in the inheritance chain fails with
    /// [`CascadeError::TypeMismatch`].
    ///
    /// Notifies listeners and descendants if the effective value changed.
    pub fn create(
        &mut self,
        node: NodeId,
        atom: Atom,
        value: PropertyValue,
    ) -> Result<(), CascadeError> {
        let data = self.node(node)?;
        let new_ty = value.property_type();
        if let Some(rec) = data.find_record(atom) {
            if rec.ty != new_ty {
                return Err(CascadeError::PropertyExists { atom });
            }
        } else if let Some(declared) = self.declared_type(node, atom)
            && declared != new_ty
        {
            return Err(CascadeError::TypeMismatch {
                atom,
                expected: declared,
                found: new_ty,
            });
        }
        let old = self.effective_value(node, atom);
        let changed = old.as_ref() != Some(&value);
        let data = self.node_mut(node)?;
        match data.find_record_mut(atom) {
            Some(rec) => {
                rec.default = Some(value.clone());
                rec.value = Some(value);
                rec.flags.insert(PropertyFlags::CREATED);
                rec.flags.remove(PropertyFlags::OVERRIDDEN);
                if changed {
                    rec.revision = rec.revision.wrapping_add(1);
                }
            }
            None => {
                let mut rec = PropertyRecord::created(atom, value);
                rec.ref_count = data.binding_refs(atom);
                data.insert_record(rec);
            }
        }
        if changed {
            self.queue_or_deliver(node, atom, None);
        }
        Ok(())
    }

    /// [`create`](Self::create) with a boolean value.
    pub fn create_bool(&mut self, node: NodeId, atom: Atom, value: bool) -> Result<(), CascadeError> {
        self.create(node, atom, PropertyValue::Bool(value))
    }

    /// [`create`](Self::create) with an integer value.
    pub fn create_int(&mut self, node: NodeId, atom: Atom, value: i64) -> Result<(), CascadeError> {
        self.create(node, atom, PropertyValue::Int(value))
    }

    /// [`create`](Self::create) with a float value.
    pub fn create_float(&mut self, node: NodeId, atom: Atom, value: f64) -> Result<(), CascadeError> {
        self.create(node, atom, PropertyValue::Float(value))
    }

    /// [`create`](Self::create) with a string value.
    pub fn create_string(
        &mut self,
        node: NodeId,
        atom: Atom,
        value: impl Into<String>,
    ) -> Result<(), CascadeError> {
        self.create(node, atom, PropertyValue::String(value.into()))
    }

    /// Sets `atom` on `node`, shadowing any inherited definition.
    ///
    /// The write must agree with the atom's declared type anywhere in the
    /// chain. If no record exists locally one is materialized without a
    /// default. Listeners and descendants are notified only when the
    /// effective value actually changed; inside a transaction the
    /// notification is queued instead.
    pub fn set_value(
        &mut self,
        node: NodeId,
        atom: Atom,
        value: PropertyValue,
    ) -> Result<(), CascadeError> {
        self.set_value_inner(node, atom, value, None)
    }

    /// [`set_value`](Self::set_value) that also reports each notified node
    /// to `trace`.
    pub fn set_value_with_trace(
        &mut self,
        node: NodeId,
        atom: Atom,
        value: PropertyValue,
        trace: &mut dyn NotifyTrace,
    ) -> Result<(), CascadeError> {
        self.set_value_inner(node, atom, value, Some(trace))
    }

    /// [`set_value`](Self::set_value) with a boolean value.
    pub fn set_bool(&mut self, node: NodeId, atom: Atom, value: bool) -> Result<(), CascadeError> {
        self.set_value(node, atom, PropertyValue::Bool(value))
    }

    /// [`set_value`](Self::set_value) with an integer value.
    pub fn set_int(&mut self, node: NodeId, atom: Atom, value: i64) -> Result<(), CascadeError> {
        self.set_value(node, atom, PropertyValue::Int(value))
    }

    /// [`set_value`](Self::set_value) with a float value.
    pub fn set_float(&mut self, node: NodeId, atom: Atom, value: f64) -> Result<(), CascadeError> {
        self.set_value(node, atom, PropertyValue::Float(value))
    }

    /// [`set_value`](Self::set_value) with a string value.
    pub fn set_string(
        &mut self,
        node: NodeId,
        atom: Atom,
        value: impl Into<String>,
    ) -> Result<(), CascadeError> {
        self.set_value(node, atom, PropertyValue::String(value.into()))
    }

    fn set_value_inner(
        &mut self,
        node: NodeId,
        atom: Atom,
        value: PropertyValue,
        trace: Option<&mut (dyn NotifyTrace + '_)>,
    ) -> Result<(), CascadeError> {
        self.node(node)?;
        let new_ty = value.property_type();
        if let Some(declared) = self.declared_type(node, atom)
            && declared != new_ty
        {
            return Err(CascadeError::TypeMismatch {
                atom,
                expected: declared,
                found: new_ty,
            });
        }
        let old = self.effective_value(node, atom);
        let changed = old.as_ref() != Some(&value);
        let data = self.node_mut(node)?;
        match data.find_record_mut(atom) {
            Some(rec) => {
                if !changed && rec.value.is_some() && rec.flags.contains(PropertyFlags::OVERRIDDEN)
                {
                    return Ok(());
                }
                rec.value = Some(value);
                rec.flags.insert(PropertyFlags::OVERRIDDEN);
                if changed {
                    rec.revision = rec.revision.wrapping_add(1);
                }
            }
            None => {
                let mut rec = PropertyRecord::overridden(atom, value);
                rec.ref_count = data.binding_refs(atom);
                if changed {
                    rec.revision = 1;
                }
                data.insert_record(rec);
            }
        }
        if changed {
            self.queue_or_deliver(node, atom, trace);
        }
        Ok(())
    }

    /// Drops the local override for `atom` on `node`.
    ///
    /// If an ancestor still defines the atom the record turns transparent
    /// and the inherited value shows through. Otherwise the record falls
    /// back to its captured default, or to the type's zero value if it was
    /// materialized by a bare `set`.
    ///
    /// Returns `Ok(false)` if the node has no local record for the atom;
    /// that is not an error.
    pub fn set_default(&mut self, node: NodeId, atom: Atom) -> Result<bool, CascadeError> {
        self.set_default_inner(node, atom, None)
    }

    /// [`set_default`](Self::set_default) that also reports each notified
    /// node to `trace`.
    pub fn set_default_with_trace(
        &mut self,
        node: NodeId,
        atom: Atom,
        trace: &mut dyn NotifyTrace,
    ) -> Result<bool, CascadeError> {
        self.set_default_inner(node, atom, Some(trace))
    }

    fn set_default_inner(
        &mut self,
        node: NodeId,
        atom: Atom,
        trace: Option<&mut (dyn NotifyTrace + '_)>,
    ) -> Result<bool, CascadeError> {
        let data = self.node(node)?;
        if data.find_record(atom).is_none() {
            return Ok(false);
        }
        let old = self.effective_value(node, atom);
        let inherited = self.inherited_value(node, atom);
        let changed = {
            let data = self.node_mut(node)?;
            let Some(rec) = data.find_record_mut(atom) else {
                return Ok(false);
            };
            let new_effective = match inherited {
                Some(ancestor) => {
                    rec.value = None;
                    ancestor
                }
                None => {
                    let restored = rec
                        .default
                        .clone()
                        .unwrap_or_else(|| PropertyValue::zero(rec.ty));
                    rec.value = Some(restored.clone());
                    restored
                }
            };
            rec.flags.remove(PropertyFlags::OVERRIDDEN);
            let changed = old.as_ref() != Some(&new_effective);
            if changed {
                rec.revision = rec.revision.wrapping_add(1);
            }
            changed
        };
        if changed {
            self.queue_or_deliver(node, atom, trace);
        }
        Ok(true)
    }

    /// Deletes the local record for `atom` on `node`, along with any
    /// bindings registered for the atom on this node.
    ///
    /// A record materialized by a bare `set` cannot be removed while an
    /// ancestor still defines the atom, because deleting it would silently
    /// re-expose the inherited value; that fails with
    /// [`CascadeError::NotCreated`]. Removal itself is structural and does
    /// not notify.
    pub fn remove(&mut self, node: NodeId, atom: Atom) -> Result<(), CascadeError> {
        let data = self.node(node)?;
        let Some(rec) = data.find_record(atom) else {
            return Err(CascadeError::PropertyMissing { atom });
        };
        if !rec.flags.contains(PropertyFlags::CREATED)
            && self.inherited_value(node, atom).is_some()
        {
            return Err(CascadeError::NotCreated { atom });
        }
        let data = self.node_mut(node)?;
        data.remove_record(atom);
        data.bindings.retain(|binding| binding.atom != atom);
        Ok(())
    }

    /// The number of local records on `node`.
    pub fn property_count(&self, node: NodeId) -> Result<usize, CascadeError> {
        Ok(self.node(node)?.records.len())
    }

    /// The binding reference count of the local record for `atom`.
    pub fn ref_count(&self, node: NodeId, atom: Atom) -> Result<u32, CascadeError> {
        self.node(node)?
            .find_record(atom)
            .map(PropertyRecord::ref_count)
            .ok_or(CascadeError::PropertyMissing { atom })
    }

    /// The revision counter of the local record for `atom`.
    pub fn revision(&self, node: NodeId, atom: Atom) -> Result<u64, CascadeError> {
        self.node(node)?
            .find_record(atom)
            .map(PropertyRecord::revision)
            .ok_or(CascadeError::PropertyMissing { atom })
    }

    /// The local record for `atom` on `node`, if one exists.
    ///
    /// Inherited definitions are not visible here; use the `get_*` family
    /// for resolved reads.
    pub fn local_record(
        &self,
        node: NodeId,
        atom: Atom,
    ) -> Result<Option<&PropertyRecord>, CascadeError> {
        Ok(self.node(node)?.find_record(atom))
    }
}
