//! Procedural macros for structbind

mod bind_attr;
mod bind_struct;
mod field_shape;

use proc_macro::TokenStream;

/// Derives `structbind::Bindable` for a structure with named fields.
///
/// # Example
///
/// ```ignore
/// #[derive(Bindable, Default)]
/// struct SearchParams {
///     #[bind("query=q")]
///     term:     String,
///     #[bind("header=X-Page-Size")]
///     per_page: u32,
///     paging:   Paging,     // user-defined structure, walked with the same source
///     #[bind(skip)]
///     cache:    Cache,
/// }
/// ```
///
/// This will generate:
/// - `field_descriptors()` listing every field in declaration order with its directive,
///   nesting, or nothing
/// - `apply_mapping()` coercing each extracted value into its field
#[proc_macro_derive(Bindable, attributes(bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    bind_struct::derive_bindable_impl(input)
}
