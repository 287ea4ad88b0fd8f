//! `serde` deserializer over the extracted value tree

use std::collections::btree_map;
use std::fmt::Display;

use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};
use thiserror::Error;

use super::CoercionMode;
use super::scalar;
use crate::value::{Mapping, Value};

/// Why a value could not be converted into a field's type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CoercionError(String);

impl de::Error for CoercionError {
    fn custom<T: Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

impl CoercionError {
    pub(crate) fn invalid_type(value: &Value, expected: &str) -> Self {
        Self(format!("expected {expected}, found {}", value.kind()))
    }

    pub(crate) fn unparsable(input: &str, expected: &str) -> Self {
        Self(format!("cannot parse `{input}` as {expected}"))
    }

    pub(crate) fn out_of_range(input: f64, expected: &str) -> Self {
        Self(format!("{input} is out of range for {expected}"))
    }

    pub(crate) fn typed_mismatch(found: &str, expected: &str) -> Self {
        Self(format!(
            "pre-decoded {found} cannot populate a field of type {expected}"
        ))
    }
}

type CoercionResult<T> = Result<T, CoercionError>;

/// Deserializes a single [`Value`], converting across kinds when the mode allows it
pub(crate) struct ValueDeserializer {
    value: Value,
    mode:  CoercionMode,
}

impl ValueDeserializer {
    pub(crate) const fn new(value: Value, mode: CoercionMode) -> Self {
        Self { value, mode }
    }

    fn visit_integer<'de, V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        let n = scalar::to_integer(self.value, self.mode)?;
        if let Ok(signed) = i64::try_from(n) {
            visitor.visit_i64(signed)
        } else if let Ok(unsigned) = u64::try_from(n) {
            visitor.visit_u64(unsigned)
        } else {
            visitor.visit_i128(n)
        }
    }

    /// Empty lists, empty maps and nulls are interchangeable containers in weak mode
    fn is_empty_container(&self) -> bool {
        self.mode.is_weak()
            && match &self.value {
                Value::Null => true,
                Value::List(items) => items.is_empty(),
                Value::Map(map) => map.is_empty(),
                _ => false,
            }
    }
}

macro_rules! forward_to_integer {
    ($($method:ident),*) => {
        $(fn $method<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
            self.visit_integer(visitor)
        })*
    };
}

impl<'de> Deserializer<'de> for ValueDeserializer {
    type Error = CoercionError;

    forward_to_integer!(
        deserialize_i8,
        deserialize_i16,
        deserialize_i32,
        deserialize_i64,
        deserialize_i128,
        deserialize_u8,
        deserialize_u16,
        deserialize_u32,
        deserialize_u64,
        deserialize_u128
    );

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Int(n) => visitor.visit_i64(n),
            Value::UInt(n) => visitor.visit_u64(n),
            Value::Float(f) => visitor.visit_f64(f),
            Value::Str(s) => visitor.visit_string(s),
            Value::List(items) => visit_list(items, self.mode, visitor),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map, self.mode, &[])),
            Value::Typed(typed) => Err(CoercionError::typed_mismatch(
                typed.type_name(),
                "a loosely typed value",
            )),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        visitor.visit_bool(scalar::to_bool(self.value, self.mode)?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        visitor.visit_f64(scalar::to_float(self.value, self.mode)?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        let text = scalar::to_text(self.value, self.mode)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(CoercionError::unparsable(&text, "a single character")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        visitor.visit_string(scalar::to_text(self.value, self.mode)?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        match self.value {
            Value::Str(s) => visitor.visit_byte_buf(s.into_bytes()),
            Value::List(items) => visit_list(items, self.mode, visitor),
            other => Err(CoercionError::invalid_type(&other, "bytes")),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        match self.value {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(Self::new(other, self.mode)),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Str(s) if self.mode.is_weak() && s.is_empty() => visitor.visit_unit(),
            other => Err(CoercionError::invalid_type(&other, "nothing")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> CoercionResult<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> CoercionResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        if self.is_empty_container() {
            return visit_list(Vec::new(), self.mode, visitor);
        }
        match self.value {
            Value::List(items) => visit_list(items, self.mode, visitor),
            Value::Typed(typed) => Err(CoercionError::typed_mismatch(
                typed.type_name(),
                "a sequence",
            )),
            other if self.mode.is_weak() => visit_list(vec![other], self.mode, visitor),
            other => Err(CoercionError::invalid_type(&other, "a sequence")),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> CoercionResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> CoercionResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        self.visit_mapping(&[], visitor, "a map")
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> CoercionResult<V::Value> {
        self.visit_mapping(fields, visitor, "a map of struct fields")
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> CoercionResult<V::Value> {
        let mode = self.mode;
        match scalar::unwrap_singleton(self.value, mode) {
            Value::Str(variant) => visitor.visit_enum(EnumDeserializer {
                variant: resolve_name(variant, variants, mode),
                value: None,
                mode,
            }),
            Value::Map(map) if map.len() == 1 => {
                let mut entries = map.into_iter();
                let Some((variant, value)) = entries.next() else {
                    return Err(de::Error::custom("expected a single-entry map"));
                };
                visitor.visit_enum(EnumDeserializer {
                    variant: resolve_name(variant, variants, mode),
                    value: Some(value),
                    mode,
                })
            }
            other => Err(CoercionError::invalid_type(&other, "an enum variant")),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> CoercionResult<V::Value> {
        drop(self);
        visitor.visit_unit()
    }
}

impl ValueDeserializer {
    fn visit_mapping<'de, V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
        expected: &str,
    ) -> CoercionResult<V::Value> {
        if self.is_empty_container() {
            return visitor.visit_map(MapDeserializer::new(Mapping::new(), self.mode, fields));
        }
        match self.value {
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map, self.mode, fields)),
            other => Err(CoercionError::invalid_type(&other, expected)),
        }
    }
}

fn visit_list<'de, V: Visitor<'de>>(
    items: Vec<Value>,
    mode: CoercionMode,
    visitor: V,
) -> CoercionResult<V::Value> {
    let len = items.len();
    let mut seq = SeqDeserializer {
        iter: items.into_iter(),
        mode,
    };
    let value = visitor.visit_seq(&mut seq)?;
    if seq.iter.len() == 0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in sequence"))
    }
}

/// Map a key onto a known field or variant name, ignoring ASCII case in weak mode
fn resolve_name(key: String, known: &'static [&'static str], mode: CoercionMode) -> String {
    if !mode.is_weak() || known.contains(&key.as_str()) {
        return key;
    }
    known
        .iter()
        .find(|name| name.eq_ignore_ascii_case(&key))
        .map_or(key, |name| (*name).to_string())
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
    mode: CoercionMode,
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = CoercionError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> CoercionResult<Option<T::Value>> {
        self.iter
            .next()
            .map(|value| seed.deserialize(ValueDeserializer::new(value, self.mode)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter:    btree_map::IntoIter<String, Value>,
    pending: Option<Value>,
    fields:  &'static [&'static str],
    mode:    CoercionMode,
}

impl MapDeserializer {
    fn new(map: Mapping, mode: CoercionMode, fields: &'static [&'static str]) -> Self {
        Self {
            iter: map.into_iter(),
            pending: None,
            fields,
            mode,
        }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = CoercionError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> CoercionResult<Option<K::Value>> {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        self.pending = Some(value);
        let key = resolve_name(key, self.fields, self.mode);
        // keys are always strings in the tree; let them become numeric map keys too
        seed.deserialize(ValueDeserializer::new(Value::Str(key), CoercionMode::Weak))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> CoercionResult<V::Value> {
        let value = self
            .pending
            .take()
            .ok_or_else(|| <CoercionError as de::Error>::custom("map value requested before its key"))?;
        seed.deserialize(ValueDeserializer::new(value, self.mode))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value:   Option<Value>,
    mode:    CoercionMode,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = CoercionError;
    type Variant = VariantDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> CoercionResult<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(ValueDeserializer::new(
            Value::Str(self.variant),
            CoercionMode::Strict,
        ))?;
        Ok((
            variant,
            VariantDeserializer {
                value: self.value,
                mode:  self.mode,
            },
        ))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
    mode:  CoercionMode,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = CoercionError;

    fn unit_variant(self) -> CoercionResult<()> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(CoercionError::invalid_type(&other, "a unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> CoercionResult<T::Value> {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value, self.mode)),
            None => Err(de::Error::custom("expected a newtype variant, found a unit variant")),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> CoercionResult<V::Value> {
        match self.value {
            Some(Value::List(items)) => visit_list(items, self.mode, visitor),
            Some(other) => Err(CoercionError::invalid_type(&other, "a tuple variant")),
            None => Err(de::Error::custom("expected a tuple variant, found a unit variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> CoercionResult<V::Value> {
        match self.value {
            Some(Value::Map(map)) => visitor.visit_map(MapDeserializer::new(map, self.mode, fields)),
            Some(other) => Err(CoercionError::invalid_type(&other, "a struct variant")),
            None => Err(de::Error::custom("expected a struct variant, found a unit variant")),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, reason = "tests")]

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Wrapper(u16);

    #[derive(Debug, Deserialize, PartialEq)]
    enum Shape {
        Circle { radius: f64 },
        Empty,
    }

    fn weak<T: for<'de> Deserialize<'de>>(value: Value) -> CoercionResult<T> {
        T::deserialize(ValueDeserializer::new(value, CoercionMode::Weak))
    }

    #[test]
    fn test_newtype_struct() {
        assert_eq!(weak::<Wrapper>(Value::from("8080")).unwrap(), Wrapper(8080));
    }

    #[test]
    fn test_struct_variant() {
        let value = Value::Map(
            [(
                "circle",
                Value::Map([("RADIUS", Value::from("1.5"))].into_iter().collect()),
            )]
            .into_iter()
            .collect(),
        );
        assert_eq!(weak::<Shape>(value).unwrap(), Shape::Circle { radius: 1.5 });
        assert_eq!(weak::<Shape>(Value::from("empty")).unwrap(), Shape::Empty);
    }

    #[test]
    fn test_unknown_variant_fails() {
        assert!(weak::<Shape>(Value::from("square")).is_err());
    }

    #[test]
    fn test_tuple_with_extra_elements_fails() {
        let error = weak::<(u8, u8)>(Value::from(vec![1, 2, 3])).unwrap_err();
        assert!(error.to_string().contains("fewer elements"), "{error}");
    }

    #[test]
    fn test_nested_typed_value_fails() {
        let value = Value::List(vec![Value::typed(1_u8)]);
        let error = weak::<Vec<u8>>(value).unwrap_err();
        assert!(error.to_string().contains("pre-decoded"), "{error}");
    }

    #[test]
    fn test_bytes_from_string() {
        let bytes = weak::<serde_bytes_like::Bytes>(Value::from("hi")).unwrap();
        assert_eq!(bytes.0, b"hi".to_vec());
    }

    mod serde_bytes_like {
        use std::fmt;

        use serde::de::{Deserialize, Deserializer, Visitor};

        pub struct Bytes(pub Vec<u8>);

        impl<'de> Deserialize<'de> for Bytes {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct BytesVisitor;

                impl Visitor<'_> for BytesVisitor {
                    type Value = Bytes;

                    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                        formatter.write_str("a byte buffer")
                    }

                    fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Bytes, E> {
                        Ok(Bytes(v))
                    }
                }

                deserializer.deserialize_byte_buf(BytesVisitor)
            }
        }
    }
}
