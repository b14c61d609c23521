use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type};

const WRAPPERS: [&str; 4] = ["Option", "Box", "Arc", "Rc"];
const COLLECTIONS: [&str; 5] = ["Vec", "HashSet", "BTreeSet", "VecDeque", "LinkedList"];

/// The shape of a field type after unwrapping.
pub(crate) struct TypeInfo<'a> {
    /// The innermost type, e.g. `Address` for `Option<Vec<Address>>`.
    pub(crate) inner: &'a Type,
    pub(crate) collection: bool,
}

pub(crate) fn analyze(ty: &Type) -> TypeInfo<'_> {
    let ty = unwrap_wrappers(ty);
    match generic_argument(ty, &COLLECTIONS) {
        Some(element) => TypeInfo {
            inner: unwrap_wrappers(element),
            collection: true,
        },
        None => TypeInfo {
            inner: ty,
            collection: false,
        },
    }
}

fn unwrap_wrappers(ty: &Type) -> &Type {
    let mut ty = ty;
    while let Some(inner) = generic_argument(ty, &WRAPPERS) {
        ty = inner;
    }
    ty
}

// the single type argument of `ty` when its last segment is one of `names`
fn generic_argument<'a>(ty: &'a Type, names: &[&str]) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if !names.iter().any(|name| segment.ident == *name) {
        return None;
    }

    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    }
}

/// Last path segment of `ty`, e.g. `NaiveDate` for `chrono::NaiveDate`.
pub(crate) fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(reference) => type_name(&reference.elem),
        _ => None,
    }
}

/// Tokens building the `ValueType` for a scalar type name, if it is one.
pub(crate) fn scalar_value_type(name: &str) -> Option<TokenStream> {
    let variant = match name {
        "bool" => quote!(Bool),
        "i8" => quote!(I8),
        "i16" => quote!(I16),
        "i32" => quote!(I32),
        "i64" | "isize" => quote!(I64),
        "u8" => quote!(U8),
        "u16" => quote!(U16),
        "u32" => quote!(U32),
        "u64" | "usize" => quote!(U64),
        "f32" => quote!(F32),
        "f64" => quote!(F64),
        "char" => quote!(Char),
        "String" | "str" => quote!(String),
        "Uuid" => quote!(Uuid),
        "NaiveDate" => quote!(Date),
        "NaiveTime" => quote!(Time),
        "NaiveDateTime" => quote!(DateTime),
        "DateTime" => quote!(OffsetDateTime),
        _ => return None,
    };
    Some(quote!(rsql::common::ValueType::#variant))
}

/// Tokens building the `ValueType` for a type name, falling back to `Custom`.
pub(crate) fn value_type_for_name(name: &str) -> TokenStream {
    scalar_value_type(name)
        .unwrap_or_else(|| quote!(rsql::common::ValueType::Custom(#name.to_string())))
}
