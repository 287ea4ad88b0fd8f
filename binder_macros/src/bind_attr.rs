//! Parsing of `#[bind(...)]` field attributes

use syn::Field;
use syn::LitStr;

/// How a field was declared
pub enum FieldRole {
    /// `#[bind("strategy=hint")]`
    Directed(LitStr),
    /// `#[bind(nested)]`
    Nested,
    /// `#[bind(skip)]`
    Skip,
    /// No `bind` attribute, decided from the field's type
    Inferred,
}

/// Read the role of a field from its attributes
pub fn parse_field_role(field: &Field) -> syn::Result<FieldRole> {
    let mut role = FieldRole::Inferred;

    for attr in &field.attrs {
        if !attr.path().is_ident("bind") {
            continue;
        }
        if !matches!(role, FieldRole::Inferred) {
            return Err(syn::Error::new_spanned(
                attr,
                "only one `bind` attribute is allowed per field",
            ));
        }

        // The common form is a bare directive string
        if let Ok(directive) = attr.parse_args::<LitStr>() {
            role = FieldRole::Directed(directive);
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("nested") {
                role = FieldRole::Nested;
                Ok(())
            } else if meta.path.is_ident("skip") {
                role = FieldRole::Skip;
                Ok(())
            } else {
                Err(meta.error(
                    "unsupported bind attribute, expected a directive string, `nested` or `skip`",
                ))
            }
        })?;
    }

    Ok(role)
}
