#![recursion_limit = "128"]
//! # RSQL Derive Macros
//!
//! Procedural macros generating schema descriptors for the `rsql` crate.
//!
//! ## Macros
//!
//! ### `RsqlEntity`
//!
//! Derives `rsql::resolver::RsqlEntity` for structs with named fields. Every
//! field becomes an attribute descriptor whose value type is inferred from the
//! field type: scalars map to their `ValueType`, `Option<T>` and `Box<T>` are
//! unwrapped, and `Vec<T>`, `HashSet<T>`, `BTreeSet<T>` and `VecDeque<T>`
//! become element collections. Unknown types become `ValueType::Custom`.
//!
//! - **Struct attribute**: `#[rsql(name = "...")]` renames the entity
//! - **Field attributes**:
//!   - `#[rsql(embedded)]` - the field is an embedded entity
//!   - `#[rsql(association)]` - the field references another entity
//!   - `#[rsql(enumeration)]` - the field type implements `RsqlEnum`
//!   - `#[rsql(value_type = "...")]` - overrides the inferred value type
//!   - `#[rsql(rename = "...")]` - renames the attribute
//!   - `#[rsql(skip)]` - excludes the field
//!
//! ```rust,ignore
//! use rsql_derive::{RsqlEntity, RsqlEnum};
//!
//! #[derive(RsqlEnum)]
//! pub enum Status {
//!     Active,
//!     Closed,
//! }
//!
//! #[derive(RsqlEntity)]
//! #[rsql(name = "Person")]
//! pub struct PersonEntity {
//!     pub name: String,
//!     pub age: Option<i32>,
//!     #[rsql(enumeration)]
//!     pub status: Status,
//!     #[rsql(embedded)]
//!     pub address: Address,
//!     #[rsql(association)]
//!     pub friends: Vec<PersonEntity>,
//!     #[rsql(skip)]
//!     pub password: String,
//! }
//! ```
//!
//! ### `RsqlEnum`
//!
//! Derives `rsql::resolver::RsqlEnum` for enums with unit variants, so string
//! arguments can be matched against variant names. `#[rsql(name = "...")]`
//! renames the enum and `#[rsql(rename = "...")]` renames a variant.

extern crate proc_macro;
mod rsql_entity;
mod rsql_enum;
mod type_info;

use crate::rsql_entity::generate_entity_for_struct;
use crate::rsql_enum::generate_enum_type;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives the `RsqlEntity` trait.
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum or union
/// - Used on tuple structs or unit structs
/// - An `rsql` attribute is unknown or malformed
#[proc_macro_derive(RsqlEntity, attributes(rsql))]
pub fn derive_rsql_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => e.to_compile_error().into(),
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive RsqlEntity for enums. Use #[derive(RsqlEnum)] instead.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive RsqlEntity for unions. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
    }
}

/// Derives the `RsqlEnum` trait.
///
/// # Errors
///
/// Returns a compile error if the type is not an enum or a variant carries data.
#[proc_macro_derive(RsqlEnum, attributes(rsql))]
pub fn derive_rsql_enum(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Enum(ref data) => match generate_enum_type(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => e.to_compile_error().into(),
        },
        _ => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive RsqlEnum for structs or unions. Only enums are supported.",
            );
            error.to_compile_error().into()
        }
    }
}
