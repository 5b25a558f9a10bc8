// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Atom: append-only string interning for style property names.
//!
//! Style engines refer to properties ("width", "color", "padding") millions of
//! times per session. Comparing and hashing strings at that rate is wasteful,
//! so names are interned once into small, dense integer [`Atom`]s and every
//! later lookup is an integer compare.
//!
//! The registry is append-only: an atom, once assigned, is stable for the
//! lifetime of the registry and is never removed or reused. This makes atoms
//! safe to embed in long-lived records and to use as sort keys.
//!
//! The registry is an explicitly constructed value, not a process global.
//! Embedders create one per style universe (usually one per application),
//! hand it to whatever owns the style graph, and drop it at shutdown.
//!
//! ## Quick Start
//!
//! ```rust
//! use bramble_atom::AtomRegistry;
//!
//! let mut atoms = AtomRegistry::new();
//!
//! let width = atoms.intern("width");
//! let color = atoms.intern("color");
//! assert_ne!(width, color);
//!
//! // Interning the same name again returns the same atom.
//! assert_eq!(atoms.intern("width"), width);
//!
//! // Lookup never allocates and never assigns.
//! assert_eq!(atoms.lookup("width"), Some(width));
//! assert_eq!(atoms.lookup("missing"), None);
//!
//! // Reverse lookup is available for diagnostics.
//! assert_eq!(atoms.name(width), Some("width"));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash, Hasher};

use hashbrown::{DefaultHashBuilder, HashMap};

/// Interned id for a property name.
///
/// Atoms are small, dense, and assigned in interning order starting at 0.
/// They are meaningful only relative to the [`AtomRegistry`] that produced
/// them; mixing atoms across registries will silently name the wrong
/// property.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Atom(u32);

impl Atom {
    /// Returns the id as a `usize`, e.g. for indexing side tables.
    #[must_use]
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw `u32` id.
    #[must_use]
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Append-only intern table mapping property names to [`Atom`]s.
///
/// Each distinct name is stored exactly once. The map from hash to candidate
/// atoms lets lookups compare against the stored copy instead of keeping a
/// second owned string per entry.
#[derive(Clone, Debug, Default)]
pub struct AtomRegistry {
    /// Interned names, dense and indexed by atom id.
    names: Vec<Box<str>>,
    /// Hash → atoms whose names share that hash.
    buckets: HashMap<u64, Vec<Atom>>,
    build_hasher: DefaultHashBuilder,
}

impl AtomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with capacity for `capacity` names.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            buckets: HashMap::with_capacity(capacity),
            build_hasher: DefaultHashBuilder::default(),
        }
    }

    fn hash_name(&self, name: &str) -> u64 {
        let mut hasher = self.build_hasher.build_hasher();
        name.hash(&mut hasher);
        hasher.finish()
    }

    /// Returns the atom for `name`, assigning a fresh one on first sight.
    ///
    /// Assignment is deterministic and monotonic: the n-th distinct name
    /// interned gets id `n - 1`. The name is copied only when it is new.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` distinct names are interned.
    pub fn intern(&mut self, name: &str) -> Atom {
        let hash = self.hash_name(name);
        let bucket = self.buckets.entry(hash).or_default();
        for &atom in bucket.iter() {
            if &*self.names[atom.as_usize()] == name {
                return atom;
            }
        }
        let id = u32::try_from(self.names.len()).expect("too many interned names for Atom (u32)");
        let atom = Atom(id);
        self.names.push(Box::from(name));
        bucket.push(atom);
        atom
    }

    /// Returns the atom for `name` without assigning one.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Atom> {
        let hash = self.hash_name(name);
        let bucket = self.buckets.get(&hash)?;
        bucket
            .iter()
            .copied()
            .find(|atom| &*self.names[atom.as_usize()] == name)
    }

    /// Returns the name interned for `atom`, if the atom came from this
    /// registry.
    ///
    /// This is a diagnostics aid; the cascade core never needs it.
    #[must_use]
    pub fn name(&self, atom: Atom) -> Option<&str> {
        self.names.get(atom.as_usize()).map(|name| &**name)
    }

    /// Returns the number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over all `(atom, name)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (Atom, &str)> {
        self.names.iter().enumerate().map(|(id, name)| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "ids were assigned from a u32 counter"
            )]
            let atom = Atom(id as u32);
            (atom, &**name)
        })
    }
}
