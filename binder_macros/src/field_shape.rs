//! Classification of field types from their tokens

use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericArgument, Ident, PathArguments, Type};

const TEXT: &[&str] = &["String", "str", "char"];
const INTEGER: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];
const FLOAT: &[&str] = &["f32", "f64"];
const SEQUENCE: &[&str] = &[
    "Vec",
    "VecDeque",
    "LinkedList",
    "HashSet",
    "BTreeSet",
    "BinaryHeap",
];
const MAP: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];

// Library types that are never user-defined bindable structures
const OPAQUE: &[&str] = &[
    "Box",
    "Rc",
    "Arc",
    "Cow",
    "Cell",
    "RefCell",
    "Mutex",
    "RwLock",
    "PhantomData",
    "PathBuf",
    "Path",
    "OsString",
    "Duration",
    "Instant",
    "SystemTime",
    "IpAddr",
    "Ipv4Addr",
    "Ipv6Addr",
    "SocketAddr",
    "Value",
    "Uuid",
    "Url",
];

/// Coarse shape of a field type, mirroring `structbind::FieldShape`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Text,
    Integer,
    Float,
    Boolean,
    Sequence,
    Optional,
    Map,
    Struct,
    Other,
}

impl Shape {
    /// Classify `ty`; the struct's own type parameters are never treated as structures
    pub fn of(ty: &Type, type_params: &[&Ident]) -> Self {
        match ty {
            Type::Group(group) => Self::of(&group.elem, type_params),
            Type::Paren(paren) => Self::of(&paren.elem, type_params),
            Type::Array(_) | Type::Slice(_) => Self::Sequence,
            Type::Reference(reference) => match Self::of(&reference.elem, type_params) {
                Self::Text => Self::Text,
                _ => Self::Other,
            },
            Type::Path(type_path) => {
                if type_path.qself.is_some() {
                    return Self::Other;
                }
                let path = &type_path.path;
                let Some(last) = path.segments.last() else {
                    return Self::Other;
                };
                let name = last.ident.to_string();

                if path.segments.len() == 1 && type_params.iter().any(|param| last.ident == **param)
                {
                    Self::Other
                } else if TEXT.contains(&name.as_str()) {
                    Self::Text
                } else if INTEGER.contains(&name.as_str()) || name.starts_with("NonZero") {
                    Self::Integer
                } else if FLOAT.contains(&name.as_str()) {
                    Self::Float
                } else if name == "bool" {
                    Self::Boolean
                } else if name == "Option" {
                    Self::Optional
                } else if SEQUENCE.contains(&name.as_str()) {
                    Self::Sequence
                } else if MAP.contains(&name.as_str()) {
                    Self::Map
                } else if OPAQUE.contains(&name.as_str()) || is_library_path(path) {
                    Self::Other
                } else if has_type_arguments(&last.arguments) {
                    // Generic library wrappers are far more common than generic bindables
                    Self::Other
                } else {
                    Self::Struct
                }
            }
            _ => Self::Other,
        }
    }

    /// Path to the matching `structbind::FieldShape` variant
    pub fn to_tokens(self) -> TokenStream {
        match self {
            Self::Text => quote! { ::structbind::FieldShape::Text },
            Self::Integer => quote! { ::structbind::FieldShape::Integer },
            Self::Float => quote! { ::structbind::FieldShape::Float },
            Self::Boolean => quote! { ::structbind::FieldShape::Boolean },
            Self::Sequence => quote! { ::structbind::FieldShape::Sequence },
            Self::Optional => quote! { ::structbind::FieldShape::Optional },
            Self::Map => quote! { ::structbind::FieldShape::Map },
            Self::Struct => quote! { ::structbind::FieldShape::Struct },
            Self::Other => quote! { ::structbind::FieldShape::Other },
        }
    }
}

fn is_library_path(path: &syn::Path) -> bool {
    path.segments.len() > 1
        && path.segments.first().is_some_and(|first| {
            ["std", "core", "alloc", "serde_json"].contains(&first.ident.to_string().as_str())
        })
}

fn has_type_arguments(arguments: &PathArguments) -> bool {
    match arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .any(|arg| matches!(arg, GenericArgument::Type(_))),
        _ => false,
    }
}
