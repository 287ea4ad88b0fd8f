//! Bindable derive macro implementation

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Ident, WherePredicate, parse_macro_input, parse_quote};

use crate::bind_attr::{FieldRole, parse_field_role};
use crate::field_shape::Shape;

/// Implementation of the Bindable derive macro
pub fn derive_bindable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let Data::Struct(data_struct) = &input.data else {
        return Err(syn::Error::new_spanned(
            struct_name,
            "Bindable can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data_struct.fields else {
        return Err(syn::Error::new_spanned(
            &data_struct.fields,
            "Bindable only works with named fields",
        ));
    };

    let type_params: Vec<&Ident> = input
        .generics
        .type_params()
        .map(|param| &param.ident)
        .collect();
    let is_generic = !input.generics.params.is_empty();

    let mut descriptors = Vec::new();
    let mut appliers = Vec::new();
    let mut bounds: Vec<WherePredicate> = Vec::new();
    let mut dispatches_inferred = false;

    for field in &fields.named {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = field_ident.unraw().to_string();
        let field_type = &field.ty;
        let shape = Shape::of(field_type, &type_params);
        let shape_tokens = shape.to_tokens();

        match parse_field_role(field)? {
            FieldRole::Directed(directive) => {
                descriptors.push(quote! {
                    ::structbind::FieldDescriptor::directed::<#field_type>(
                        #field_name,
                        #directive,
                        #shape_tokens,
                    )
                });
                appliers.push(quote! {
                    if let Some(value) = mapping.remove(#field_name) {
                        self.#field_ident = coercer.coerce::<#field_type>(#field_name, value)?;
                    }
                });
                if is_generic {
                    bounds.push(parse_quote! {
                        #field_type: ::structbind::__private::DeserializeOwned + Send + 'static
                    });
                }
            }
            FieldRole::Nested => {
                descriptors.push(quote! {
                    ::structbind::FieldDescriptor::nested::<#field_type>(#field_name)
                });
                appliers.push(quote! {
                    if let Some(value) = mapping.remove(#field_name) {
                        coercer.apply_nested(#field_name, &mut self.#field_ident, value)?;
                    }
                });
                if is_generic {
                    bounds.push(parse_quote! {
                        #field_type: ::structbind::Bindable + 'static
                    });
                }
            }
            // Nested when the type is `Bindable`, unbound otherwise
            FieldRole::Inferred if shape == Shape::Struct => {
                dispatches_inferred = true;
                descriptors.push(quote! {
                    (&&::structbind::__private::Inferred::<#field_type>::new())
                        .descriptor(#field_name, #shape_tokens)
                });
                appliers.push(quote! {
                    if let Some(value) = mapping.remove(#field_name) {
                        (&&::structbind::__private::Inferred::<#field_type>::new())
                            .apply(#field_name, &mut self.#field_ident, value, coercer)?;
                    }
                });
            }
            FieldRole::Skip | FieldRole::Inferred => {
                descriptors.push(quote! {
                    ::structbind::FieldDescriptor::unbound::<#field_type>(
                        #field_name,
                        #shape_tokens,
                    )
                });
            }
        }
    }

    let mut generics = input.generics.clone();
    generics.make_where_clause().predicates.extend(bounds);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    // Structures without bound fields never read the mapping
    let apply_body = if appliers.is_empty() {
        quote! {
            let _ = (mapping, coercer);
            Ok(())
        }
    } else {
        quote! {
            let mut mapping = mapping;
            #(#appliers)*
            Ok(())
        }
    };

    let dispatch = if dispatches_inferred {
        quote! {
            #[allow(unused_imports)]
            use ::structbind::__private::{NestedKind as _, UnboundKind as _};
        }
    } else {
        TokenStream2::new()
    };

    Ok(quote! {
        #[allow(clippy::needless_borrow, reason = "inferred field dispatch")]
        impl #impl_generics ::structbind::Bindable for #struct_name #ty_generics #where_clause {
            fn field_descriptors() -> ::std::vec::Vec<::structbind::FieldDescriptor> {
                #dispatch
                ::std::vec![
                    #(#descriptors,)*
                ]
            }

            fn apply_mapping(
                &mut self,
                mapping: ::structbind::Mapping,
                coercer: &::structbind::Coercer,
            ) -> ::structbind::Result<()> {
                #dispatch
                #apply_body
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, reason = "tests")]

    use super::*;

    fn expand_str(input: &DeriveInput) -> String {
        expand(input).unwrap().to_string()
    }

    #[test]
    fn test_expands_each_role() {
        let input: DeriveInput = parse_quote! {
            struct Params {
                #[bind("query=param1")]
                param1: i32,
                embedded: Embedded,
                #[bind(skip)]
                cache: Cache,
                note: String,
            }
        };
        let expanded = expand_str(&input);

        assert!(expanded.contains("FieldDescriptor :: directed :: < i32 >"));
        assert!(expanded.contains("\"query=param1\""));
        assert!(expanded.contains("Inferred :: < Embedded > :: new ()"));
        assert!(expanded.contains(". descriptor (\"embedded\""));
        assert!(expanded.contains(". apply (\"embedded\""));
        assert!(expanded.contains("FieldDescriptor :: unbound :: < Cache >"));
        assert!(expanded.contains("FieldDescriptor :: unbound :: < String >"));
        assert!(expanded.contains("NestedKind as _"));
    }

    #[test]
    fn test_explicit_nested_skips_inferred_dispatch() {
        let input: DeriveInput = parse_quote! {
            struct Params {
                #[bind(nested)]
                embedded: Embedded,
                #[bind("query=q")]
                q: String,
            }
        };
        let expanded = expand_str(&input);

        assert!(expanded.contains("FieldDescriptor :: nested :: < Embedded >"));
        assert!(expanded.contains("apply_nested (\"embedded\""));
        assert!(!expanded.contains("Inferred"));
        assert!(!expanded.contains("NestedKind"));
    }

    #[test]
    fn test_raw_identifiers_are_unprefixed() {
        let input: DeriveInput = parse_quote! {
            struct Params {
                #[bind("query=type")]
                r#type: String,
            }
        };
        let expanded = expand_str(&input);
        assert!(expanded.contains("mapping . remove (\"type\")"));
        assert!(expanded.contains("self . r#type"));
    }

    #[test]
    fn test_generic_fields_get_bounds() {
        let input: DeriveInput = parse_quote! {
            struct Page<T> {
                #[bind("query=items")]
                items: Vec<T>,
            }
        };
        let expanded = expand_str(&input);
        assert!(expanded.contains("Vec < T > : :: structbind :: __private :: DeserializeOwned"));
    }

    #[test]
    fn test_rejects_non_structs() {
        let tuple: DeriveInput = parse_quote! { struct Pair(u8, u8); };
        let enumeration: DeriveInput = parse_quote! { enum Mode { A, B } };
        assert!(expand(&tuple).is_err());
        assert!(expand(&enumeration).is_err());
    }
}
