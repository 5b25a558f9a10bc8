// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property values and their type tags.

use alloc::string::String;
use core::fmt;

/// The type a property is declared with.
///
/// A property's type is fixed by whichever record declares it first in the
/// inheritance chain and never changes afterwards. All later writes, reads,
/// and bindings for the same atom must agree with it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// A boolean flag.
    Bool,
    /// A signed integer.
    Int,
    /// A double-precision float.
    Float,
    /// An owned UTF-8 string.
    String,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

/// A single property value.
///
/// Values compare with `==` for change detection, including floats. A write
/// that produces an equal value is not a change and does not notify.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Float(f64),
    /// An owned UTF-8 string.
    String(String),
}

impl PropertyValue {
    /// The type tag of this value.
    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int(_) => PropertyType::Int,
            Self::Float(_) => PropertyType::Float,
            Self::String(_) => PropertyType::String,
        }
    }

    /// The zero value for a type: `false`, `0`, `0.0`, or the empty string.
    ///
    /// Used when an override is reset on a node whose chain no longer
    /// supplies a default.
    #[must_use]
    pub fn zero(ty: PropertyType) -> Self {
        match ty {
            PropertyType::Bool => Self::Bool(false),
            PropertyType::Int => Self::Int(0),
            PropertyType::Float => Self::Float(0.0),
            PropertyType::String => Self::String(String::new()),
        }
    }

    /// The boolean payload, if this is a [`PropertyValue::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer payload, if this is a [`PropertyValue::Int`].
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The float payload, if this is a [`PropertyValue::Float`].
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The string payload, if this is a [`PropertyValue::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(String::from(value))
    }
}
