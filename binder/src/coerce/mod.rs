//! Coercion of extracted values into typed destination fields.
//!
//! The engine hands a [`Mapping`] of loosely typed [`Value`]s to a [`Coercer`], which
//! drives `serde` deserialization of each field's declared type from those values. In
//! [`CoercionMode::Weak`] (the default) the deserializer converts across kinds the way
//! request parameters usually need: `"23"` into an integer, `"true"` into a bool, a
//! lone value into a one-element list, map keys onto struct fields case-insensitively.

mod deserializer;
mod scalar;

use std::any::Any;

use error_stack::Report;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

pub use deserializer::CoercionError;
use deserializer::ValueDeserializer;

use crate::descriptor::Bindable;
use crate::error::{Error, Result};
use crate::value::{Mapping, Value};

/// How lenient the coercion step is
#[derive(
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum CoercionMode {
    /// Convert across kinds: strings to numbers and bools, numbers to strings, scalars to
    /// one-element lists
    #[default]
    Weak,
    /// Only convert within a kind, e.g. between integer widths
    Strict,
}

impl CoercionMode {
    /// Whether cross-kind conversions are allowed
    pub const fn is_weak(self) -> bool {
        matches!(self, Self::Weak)
    }
}

/// Pours extracted values into typed fields
#[derive(Debug, Clone, Copy, Default)]
pub struct Coercer {
    mode: CoercionMode,
}

impl Coercer {
    /// Create a coercer with the given leniency
    pub const fn new(mode: CoercionMode) -> Self {
        Self { mode }
    }

    /// Leniency in effect
    pub const fn mode(&self) -> CoercionMode {
        self.mode
    }

    /// Convert `value` into the field type `T`.
    ///
    /// A [`Value::Typed`] is moved out as is and must hold exactly a `T`; anything else
    /// goes through the lenient deserializer.
    pub fn coerce<T: DeserializeOwned + Any>(&self, field: &str, value: Value) -> Result<T> {
        let target = std::any::type_name::<T>();
        let coerced = match value {
            Value::Typed(typed) => typed
                .downcast::<T>()
                .map_err(|typed| CoercionError::typed_mismatch(typed.type_name(), target)),
            other => T::deserialize(ValueDeserializer::new(other, self.mode)),
        };

        coerced.map_err(|error| {
            Report::new(Error::coercion_failed(field, error))
                .attach(format!("Target type: {target}"))
                .attach(format!("Coercion mode: {}", self.mode))
        })
    }

    /// Populate an embedded structure from its nested mapping.
    ///
    /// Coercion failures inside the structure report their path relative to `field`.
    pub fn apply_nested<T: Bindable>(&self, field: &str, target: &mut T, value: Value) -> Result<()> {
        match value {
            Value::Map(mapping) => self.apply(field, target, mapping),
            Value::Null => Ok(()),
            other => Err(Report::new(Error::cannot_coerce(
                field,
                "populate nested structure",
                format!("expected a mapping, found {}", other.kind()),
            ))),
        }
    }

    fn apply<T: Bindable>(&self, field: &str, target: &mut T, mapping: Mapping) -> Result<()> {
        target.apply_mapping(mapping, self).map_err(|report| {
            if matches!(report.current_context(), Error::Coercion { .. }) {
                let prefixed = report.current_context().clone().within(field);
                report.change_context(prefixed)
            } else {
                report
            }
        })
    }
}
