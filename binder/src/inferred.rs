//! Dispatch for undirected fields whose type looks like a structure.
//!
//! The derive only sees tokens, so it cannot tell a `Bindable` structure from an enum or
//! a foreign type. It emits `(&&Inferred::<T>::new()).descriptor(..)` instead, and method
//! resolution picks [`NestedKind`] when `T: Bindable` and falls back to [`UnboundKind`]
//! one autoderef step later otherwise.

use std::marker::PhantomData;

use crate::coerce::Coercer;
use crate::descriptor::{Bindable, FieldDescriptor, FieldShape};
use crate::error::Result;
use crate::value::Value;

/// Marker carrying an undirected field's type
pub struct Inferred<T>(PhantomData<T>);

impl<T> Inferred<T> {
    /// Create the marker for `T`
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Inferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Selected when the field type is a bindable structure
pub trait NestedKind {
    /// Declared type of the field
    type Target;

    /// Descriptor walking the field with the same source
    fn descriptor(&self, name: &'static str, shape: FieldShape) -> FieldDescriptor;

    /// Populate the field from its nested mapping
    fn apply(
        &self,
        field: &str,
        target: &mut Self::Target,
        value: Value,
        coercer: &Coercer,
    ) -> Result<()>;
}

impl<T: Bindable + 'static> NestedKind for &Inferred<T> {
    type Target = T;

    fn descriptor(&self, name: &'static str, _shape: FieldShape) -> FieldDescriptor {
        FieldDescriptor::nested::<T>(name)
    }

    fn apply(&self, field: &str, target: &mut T, value: Value, coercer: &Coercer) -> Result<()> {
        coercer.apply_nested(field, target, value)
    }
}

/// Fallback for every other field type
pub trait UnboundKind {
    /// Declared type of the field
    type Target;

    /// Descriptor the engine skips
    fn descriptor(&self, name: &'static str, shape: FieldShape) -> FieldDescriptor;

    /// Never reached with a value, as unbound fields get no mapping entry
    fn apply(
        &self,
        field: &str,
        target: &mut Self::Target,
        value: Value,
        coercer: &Coercer,
    ) -> Result<()>;
}

impl<T> UnboundKind for Inferred<T> {
    type Target = T;

    fn descriptor(&self, name: &'static str, shape: FieldShape) -> FieldDescriptor {
        FieldDescriptor::unbound::<T>(name, shape)
    }

    fn apply(&self, field: &str, _target: &mut T, _value: Value, _coercer: &Coercer) -> Result<()> {
        tracing::trace!("Ignoring value for field '{field}' without directive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::needless_borrow,
        reason = "tests"
    )]

    use super::*;
    use crate::descriptor::FieldBinding;
    use crate::value::Mapping;

    #[derive(Debug, Default, PartialEq)]
    enum Mode {
        #[default]
        Fast,
        Safe,
    }

    #[derive(Debug, Default)]
    struct Inner {
        depth: u8,
    }

    impl Bindable for Inner {
        fn field_descriptors() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::directed::<u8>("depth", "arg=depth", FieldShape::Integer)]
        }

        fn apply_mapping(&mut self, mut mapping: Mapping, coercer: &Coercer) -> Result<()> {
            if let Some(value) = mapping.remove("depth") {
                self.depth = coercer.coerce::<u8>("depth", value)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_bindable_types_resolve_to_nested() {
        let descriptor = (&&Inferred::<Inner>::new()).descriptor("inner", FieldShape::Struct);
        assert!(matches!(descriptor.binding, FieldBinding::Nested(_)));
        assert_eq!(descriptor.field_type.shape(), FieldShape::Struct);

        let mut inner = Inner::default();
        let mapping: Mapping = [("depth", Value::from("4"))].into_iter().collect();
        (&&Inferred::<Inner>::new())
            .apply("inner", &mut inner, Value::Map(mapping), &Coercer::default())
            .unwrap();
        assert_eq!(inner.depth, 4);
    }

    #[test]
    fn test_other_types_resolve_to_unbound() {
        let descriptor = (&&Inferred::<Mode>::new()).descriptor("mode", FieldShape::Struct);
        assert!(matches!(descriptor.binding, FieldBinding::Unbound));

        let mut mode = Mode::Safe;
        (&&Inferred::<Mode>::new())
            .apply("mode", &mut mode, Value::from("fast"), &Coercer::default())
            .unwrap();
        assert_eq!(mode, Mode::Safe);
    }
}
