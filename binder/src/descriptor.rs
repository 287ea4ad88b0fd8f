//! Static field metadata.
//!
//! Rust has no runtime reflection, so `#[derive(Bindable)]` generates a table of
//! [`FieldDescriptor`]s for each destination type. The engine walks that table instead
//! of inspecting the type at runtime.

use std::any::{Any, TypeId};
use std::fmt;

use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use strum::{Display, IntoStaticStr};

use crate::coerce::Coercer;
use crate::error::{Error, Result};
use crate::value::{Mapping, Typed, Value};

/// A destination structure whose fields can be bound.
///
/// Implemented by `#[derive(Bindable)]`; implementing it by hand is possible but rarely
/// needed.
pub trait Bindable {
    /// Field declarations in declaration order
    fn field_descriptors() -> Vec<FieldDescriptor>;

    /// Populate `self` in place from an intermediate mapping.
    ///
    /// Only fields present in `mapping` are written; every other field keeps its value.
    fn apply_mapping(&mut self, mapping: Mapping, coercer: &Coercer) -> Result<()>;
}

/// Coarse classification of a field's declared type
#[derive(Display, IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum FieldShape {
    /// `String`, `str`, `char`
    Text,
    /// Any primitive integer
    Integer,
    /// `f32` or `f64`
    Float,
    /// `bool`
    Boolean,
    /// `Vec`, `VecDeque`, sets, arrays and slices
    Sequence,
    /// `Option<T>`
    Optional,
    /// `HashMap` or `BTreeMap`
    Map,
    /// A user-defined structure
    Struct,
    /// Anything else
    Other,
}

impl FieldShape {
    /// Whether the field expects several values
    pub const fn is_sequence(self) -> bool {
        matches!(self, Self::Sequence)
    }
}

type JsonDecoder = fn(&[u8]) -> serde_json::Result<Typed>;

fn decode_json_as<T: DeserializeOwned + Send + 'static>(input: &[u8]) -> serde_json::Result<Typed> {
    serde_json::from_slice::<T>(input).map(Typed::new)
}

/// Type information handed to strategies alongside the hint.
///
/// Lets a strategy adapt to the field it is filling, e.g. return every query value for
/// a sequence field, or decode a request body straight into the field's own type.
#[derive(Clone, Copy)]
pub struct FieldType {
    type_name: &'static str,
    type_id:   Option<TypeId>,
    shape:     FieldShape,
    decoder:   Option<JsonDecoder>,
}

impl FieldType {
    /// Describe a directive-bearing field of type `T`
    pub fn decodable<T: DeserializeOwned + Send + 'static>(shape: FieldShape) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: Some(TypeId::of::<T>()),
            shape,
            decoder: Some(decode_json_as::<T>),
        }
    }

    /// Describe a field of type `T` that is never decoded directly
    pub fn of<T: Any>(shape: FieldShape) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: Some(TypeId::of::<T>()),
            shape,
            decoder: None,
        }
    }

    /// Describe a field by name only, for types that cannot provide a `TypeId`
    pub fn opaque<T: ?Sized>(shape: FieldShape) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: None,
            shape,
            decoder: None,
        }
    }

    /// Full name of the declared type
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Coarse shape of the declared type
    pub const fn shape(&self) -> FieldShape {
        self.shape
    }

    /// Whether the declared type is exactly `T`
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == Some(TypeId::of::<T>())
    }

    /// Decode JSON into a fresh instance of the declared type.
    ///
    /// The result is a [`Value::Typed`] that the coercion step moves into the field
    /// without further conversion. Fails with [`Error::Strategy`] when the payload does
    /// not match the type, or when the field has no directive and so no decoder.
    pub fn decode_json(&self, input: &[u8]) -> Result<Value> {
        let decoder = self.decoder.ok_or_else(|| {
            Report::new(Error::strategy_failed(format!(
                "{} cannot be decoded directly",
                self.type_name
            )))
        })?;

        decoder(input)
            .map(Value::Typed)
            .change_context(Error::failed_to(
                "decode JSON",
                format!("payload does not match {}", self.type_name),
            ))
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldType")
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .field("decodable", &self.decoder.is_some())
            .finish()
    }
}

/// How a field takes part in binding
#[derive(Clone, Copy)]
pub enum FieldBinding {
    /// Raw directive string, parsed at bind time
    Directive(&'static str),
    /// Embedded structure traversed with the same source
    Nested(fn() -> Vec<FieldDescriptor>),
    /// Ignored by the engine
    Unbound,
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directive(raw) => f.debug_tuple("Directive").field(raw).finish(),
            Self::Nested(_) => f.write_str("Nested"),
            Self::Unbound => f.write_str("Unbound"),
        }
    }
}

/// Declaration of one destination field
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Field name, also the key of the field's entry in the intermediate mapping
    pub name:       &'static str,
    /// Declared type of the field
    pub field_type: FieldType,
    /// Directive, nesting, or nothing
    pub binding:    FieldBinding,
}

impl FieldDescriptor {
    /// A field carrying a binding directive
    pub fn directed<T: DeserializeOwned + Send + 'static>(
        name: &'static str,
        directive: &'static str,
        shape: FieldShape,
    ) -> Self {
        Self {
            name,
            field_type: FieldType::decodable::<T>(shape),
            binding: FieldBinding::Directive(directive),
        }
    }

    /// An undirected field holding another bindable structure
    pub fn nested<T: Bindable + 'static>(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::of::<T>(FieldShape::Struct),
            binding: FieldBinding::Nested(T::field_descriptors),
        }
    }

    /// A field the engine leaves alone
    pub fn unbound<T: ?Sized>(name: &'static str, shape: FieldShape) -> Self {
        Self {
            name,
            field_type: FieldType::opaque::<T>(shape),
            binding: FieldBinding::Unbound,
        }
    }
}
