//! Source-agnostic struct binding.
//!
//! Annotate a structure's fields with directives naming where each value comes from,
//! register an extraction strategy per source kind, and let a [`Binder`] fill the
//! structure in place:
//!
//! ```
//! use std::collections::HashMap;
//!
//! use structbind::{Bindable, Binder, FieldType, Value};
//!
//! #[derive(Bindable, Default)]
//! struct Params {
//!     #[bind("query=page")]
//!     page:  u32,
//!     #[bind("query=limit")]
//!     limit: u32,
//! }
//!
//! type Query = HashMap<String, String>;
//!
//! let mut binder = Binder::<Query>::new();
//! binder.register("query", |hint: &str, _: &FieldType, query: &Query| {
//!     Ok(query.get(hint).map(|value| Value::from(value.as_str())))
//! });
//!
//! let query = Query::from([("page".to_string(), "3".to_string())]);
//! let mut params = Params { page: 1, limit: 50 };
//! binder.bind(&query, &mut params)?;
//!
//! assert_eq!(params.page, 3);
//! assert_eq!(params.limit, 50);
//! # Ok::<(), error_stack::Report<structbind::Error>>(())
//! ```
//!
//! A directive is `strategy` or `strategy=hint`. Strategies return loosely typed
//! [`Value`]s, which are coerced into each field's declared type. Fields the source has
//! nothing for keep the value they had before the bind.

extern crate self as structbind;

mod binder;
mod coerce;
mod config;
mod descriptor;
mod directive;
mod error;
mod inferred;
mod registry;
mod value;

pub use binder::Binder;
pub use coerce::{Coercer, CoercionError, CoercionMode};
pub use config::BinderConfig;
pub use descriptor::{Bindable, FieldBinding, FieldDescriptor, FieldShape, FieldType};
pub use directive::{Directive, HINT_SEPARATOR};
pub use error::{Error, Result};
pub use registry::{Registry, Strategy};
/// Derives [`Bindable`] for a structure with named fields.
///
/// Field attributes:
/// - `#[bind("strategy")]` or `#[bind("strategy=hint")]` binds the field through a
///   registered strategy
/// - `#[bind(nested)]` walks the field as an embedded bindable structure
/// - `#[bind(skip)]` leaves the field alone
///
/// A field without attribute whose type implements [`Bindable`] is treated as nested;
/// any other field without attribute, enums and foreign types included, is left alone.
pub use structbind_macros::Bindable;
pub use value::{Mapping, Typed, Value};

/// Items used by `#[derive(Bindable)]` expansions, not public API
#[doc(hidden)]
pub mod __private {
    pub use serde::de::DeserializeOwned;

    pub use crate::inferred::{Inferred, NestedKind, UnboundKind};
}
