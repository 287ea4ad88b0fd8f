//! Extracted values and the intermediate mapping built during a bind.
//!
//! Strategies return loosely typed [`Value`]s. The engine collects them into a
//! [`Mapping`] keyed by field name, nesting a mapping per embedded structure, and the
//! coercion step pours that tree into the destination's real field types.

use std::any::Any;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// A loosely typed value produced by an extraction strategy.
#[derive(Debug, Default)]
pub enum Value {
    /// Absent value; treated like `None` when returned directly by a strategy
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer that does not fit an `i64`, or was produced unsigned
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// String, the most common shape for query parameters, headers and arguments
    Str(String),
    /// Ordered list of values
    List(Vec<Self>),
    /// Nested mapping, used for embedded structures and map-shaped fields
    Map(Mapping),
    /// Fully decoded value of a concrete Rust type, moved into the field as is
    Typed(Typed),
}

impl Value {
    /// Wrap an already decoded value so it bypasses weak coercion.
    pub fn typed<T: Any + Send>(value: T) -> Self {
        Self::Typed(Typed::new(value))
    }

    /// Short description of the value's kind, used in error messages
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Typed(_) => "pre-decoded value",
        }
    }

    /// Whether this value is [`Value::Null`]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string content, if this is a [`Value::Str`]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the nested mapping, if this is a [`Value::Map`]
    pub const fn as_map(&self) -> Option<&Mapping> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// A type-erased, fully decoded value.
pub struct Typed {
    value:     Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Typed {
    /// Erase a concrete value
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value:     Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Name of the concrete type held
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the held value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Recover the concrete value, or get `self` back if it is not a `T`
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        self.value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|value| Self { value, type_name })
    }
}

impl fmt::Debug for Typed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Typed").field(&self.type_name).finish()
    }
}

/// Field name to extracted value, one level of a destination structure.
#[derive(Debug, Default)]
pub struct Mapping(BTreeMap<String, Value>);

impl Mapping {
    /// Create an empty mapping
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a value, returning the previous one under the same key
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Borrow the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Take the value stored under `key` out of the mapping
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over keys and values in key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::Int(i64::from(value))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::UInt(u64::from(value))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Str(value.to_string()), Self::Int)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        u64::try_from(value).map_or_else(|_| Self::Str(value.to_string()), Self::UInt)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<Mapping> for Value {
    fn from(value: Mapping) -> Self {
        Self::Map(value)
    }
}

impl From<Typed> for Value {
    fn from(value: Typed) -> Self {
        Self::Typed(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_u64().map(Self::UInt))
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::Str(n.to_string())),
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}
