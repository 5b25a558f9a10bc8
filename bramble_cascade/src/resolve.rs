// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cascade resolution: reading properties through the inheritance chain.

use alloc::vec::Vec;
use hashbrown::HashSet;

use bramble_atom::Atom;

use crate::error::CascadeError;
use crate::graph::StyleGraph;
use crate::node::NodeId;
use crate::property::PropertyRecord;
use crate::value::{PropertyType, PropertyValue};

impl StyleGraph {
    /// The effective value of `atom` on `node`.
    ///
    /// Resolution checks the node's own record first, then walks the parent
    /// list depth-first in precedence order, so the leftmost chain that
    /// defines the atom wins. Diamonds and cycles are crossed at most once.
    pub fn get_value(&self, node: NodeId, atom: Atom) -> Result<&PropertyValue, CascadeError> {
        self.node(node)?;
        self.resolve_value(node, atom)
            .and_then(|rec| rec.value.as_ref())
            .ok_or(CascadeError::PropertyMissing { atom })
    }

    /// The effective boolean value of `atom` on `node`.
    pub fn get_bool(&self, node: NodeId, atom: Atom) -> Result<bool, CascadeError> {
        match self.get_value(node, atom)? {
            PropertyValue::Bool(v) => Ok(*v),
            other => Err(CascadeError::TypeMismatch {
                atom,
                expected: other.property_type(),
                found: PropertyType::Bool,
            }),
        }
    }

    /// The effective integer value of `atom` on `node`.
    pub fn get_int(&self, node: NodeId, atom: Atom) -> Result<i64, CascadeError> {
        match self.get_value(node, atom)? {
            PropertyValue::Int(v) => Ok(*v),
            other => Err(CascadeError::TypeMismatch {
                atom,
                expected: other.property_type(),
                found: PropertyType::Int,
            }),
        }
    }

    /// The effective float value of `atom` on `node`.
    pub fn get_float(&self, node: NodeId, atom: Atom) -> Result<f64, CascadeError> {
        match self.get_value(node, atom)? {
            PropertyValue::Float(v) => Ok(*v),
            other => Err(CascadeError::TypeMismatch {
                atom,
                expected: other.property_type(),
                found: PropertyType::Float,
            }),
        }
    }

    /// The effective string value of `atom` on `node`.
    pub fn get_string(&self, node: NodeId, atom: Atom) -> Result<&str, CascadeError> {
        match self.get_value(node, atom)? {
            PropertyValue::String(v) => Ok(v),
            other => Err(CascadeError::TypeMismatch {
                atom,
                expected: other.property_type(),
                found: PropertyType::String,
            }),
        }
    }

    /// Whether `atom` resolves to a value on `node`.
    pub fn exists(&self, node: NodeId, atom: Atom) -> Result<bool, CascadeError> {
        self.node(node)?;
        Ok(self.resolve_value(node, atom).is_some())
    }

    /// Whether `node` has a local record for `atom`, shadowing or not.
    pub fn is_local(&self, node: NodeId, atom: Atom) -> Result<bool, CascadeError> {
        Ok(self.node(node)?.find_record(atom).is_some())
    }

    /// Whether `node` locally overrides `atom`.
    pub fn is_overridden(&self, node: NodeId, atom: Atom) -> Result<bool, CascadeError> {
        Ok(self
            .node(node)?
            .find_record(atom)
            .is_some_and(PropertyRecord::is_overridden))
    }

    /// Whether the effective value of `atom` on `node` comes from a default
    /// or from inheritance rather than a local override.
    ///
    /// Returns `Ok(false)` when nothing resolves at all.
    pub fn is_default(&self, node: NodeId, atom: Atom) -> Result<bool, CascadeError> {
        let data = self.node(node)?;
        if data.find_record(atom).is_some_and(PropertyRecord::is_overridden) {
            return Ok(false);
        }
        Ok(self.resolve_value(node, atom).is_some())
    }

    /// The type `atom` is declared with on `node` or its ancestors.
    ///
    /// Unlike value resolution this also sees records whose override was
    /// reset, since a reset record still pins the type.
    pub fn get_type(&self, node: NodeId, atom: Atom) -> Result<PropertyType, CascadeError> {
        self.node(node)?;
        self.declared_type(node, atom)
            .ok_or(CascadeError::PropertyMissing { atom })
    }

    /// First value-bearing record for `atom` in `node`'s chain.
    pub(crate) fn resolve_value(&self, node: NodeId, atom: Atom) -> Option<&PropertyRecord> {
        self.walk_values(&[node], None, atom)
    }

    /// The effective value of `atom` on `node`, cloned out of the chain.
    pub(crate) fn effective_value(&self, node: NodeId, atom: Atom) -> Option<PropertyValue> {
        self.resolve_value(node, atom).and_then(|rec| rec.value.clone())
    }

    /// What `node` would inherit for `atom` if it had no record of its own.
    pub(crate) fn inherited_value(&self, node: NodeId, atom: Atom) -> Option<PropertyValue> {
        let data = self.node(node).ok()?;
        self.walk_values(&data.parents, Some(node), atom)
            .and_then(|rec| rec.value.clone())
    }

    /// The declared type of `atom` anywhere in `node`'s chain, cleared
    /// records included.
    pub(crate) fn declared_type(&self, node: NodeId, atom: Atom) -> Option<PropertyType> {
        let mut stack: Vec<NodeId> = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        stack.push(node);
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            let Ok(data) = self.node(node) else { continue };
            if let Some(rec) = data.find_record(atom) {
                return Some(rec.ty);
            }
            for &parent in data.parents.iter().rev() {
                stack.push(parent);
            }
        }
        None
    }

    /// Depth-first precedence walk over `seeds` and their ancestors,
    /// returning the first value-bearing record for `atom`. `skip` is
    /// pre-marked visited so a node can ask about its inherited view.
    fn walk_values(
        &self,
        seeds: &[NodeId],
        skip: Option<NodeId>,
        atom: Atom,
    ) -> Option<&PropertyRecord> {
        let mut stack: Vec<NodeId> = seeds.iter().rev().copied().collect();
        let mut visited: HashSet<NodeId> = HashSet::new();
        if let Some(skip) = skip {
            visited.insert(skip);
        }
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            let Ok(data) = self.node(node) else { continue };
            if let Some(rec) = data.find_record(atom)
                && rec.value.is_some()
            {
                return Some(rec);
            }
            for &parent in data.parents.iter().rev() {
                stack.push(parent);
            }
        }
        None
    }
}
