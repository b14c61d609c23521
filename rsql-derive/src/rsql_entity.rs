use proc_macro::TokenStream;
use quote::quote;
use syn::{DataStruct, DeriveInput, Fields, LitStr, Result};

use crate::type_info::{analyze, type_name, value_type_for_name};

#[derive(Default)]
struct FieldOptions {
    embedded: bool,
    association: bool,
    enumeration: bool,
    skip: bool,
    rename: Option<String>,
    value_type: Option<String>,
}

fn parse_field_options(field: &syn::Field) -> Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("rsql") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("embedded") {
                options.embedded = true;
                Ok(())
            } else if meta.path.is_ident("association") {
                options.association = true;
                Ok(())
            } else if meta.path.is_ident("enumeration") {
                options.enumeration = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let s: LitStr = meta.value()?.parse()?;
                options.rename = Some(s.value());
                Ok(())
            } else if meta.path.is_ident("value_type") {
                let s: LitStr = meta.value()?.parse()?;
                options.value_type = Some(s.value());
                Ok(())
            } else {
                Err(meta.error("Unknown rsql field attribute"))
            }
        })?;
    }

    let kinds = [options.embedded, options.association, options.enumeration]
        .iter()
        .filter(|set| **set)
        .count();
    if kinds > 1 || (kinds == 1 && options.value_type.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "embedded, association, enumeration and value_type are mutually exclusive",
        ));
    }
    Ok(options)
}

pub(crate) fn generate_entity_for_struct(
    ast: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut entity_name = name.to_string();
    for attr in &ast.attrs {
        if attr.path().is_ident("rsql") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let s: LitStr = meta.value()?.parse()?;
                    entity_name = s.value();
                    Ok(())
                } else {
                    Err(meta.error("Unknown rsql struct attribute"))
                }
            })?;
        }
    }

    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ast,
            format!(
                "Failed to derive RsqlEntity for struct '{}': only structs with named fields are supported",
                name
            ),
        ));
    };

    let mut attributes = Vec::with_capacity(fields.named.len());
    let mut dependencies = Vec::new();

    for field in &fields.named {
        let options = parse_field_options(field)?;
        if options.skip {
            continue;
        }

        let attribute_name = match (&options.rename, &field.ident) {
            (Some(rename), _) => rename.clone(),
            (None, Some(ident)) => ident.to_string(),
            (None, None) => continue,
        };

        let info = analyze(&field.ty);
        let inner = info.inner;
        let collection = info.collection;

        let descriptor = if options.embedded || options.association {
            dependencies.push(quote! {
                registry.register_entity::<#inner>();
            });
            let target = quote!(<#inner as rsql::resolver::RsqlEntity>::entity_name());

            if options.association {
                quote! {
                    rsql::resolver::AttributeDescriptor::association(#attribute_name, &#target, #collection)
                }
            } else if collection {
                quote! {
                    rsql::resolver::AttributeDescriptor::element_collection(
                        #attribute_name,
                        rsql::common::ValueType::Entity(#target),
                    )
                }
            } else {
                quote! {
                    rsql::resolver::AttributeDescriptor::embedded(#attribute_name, &#target)
                }
            }
        } else {
            let value_type = if options.enumeration {
                quote!(rsql::common::ValueType::Enum(<#inner as rsql::resolver::RsqlEnum>::enum_type()))
            } else if let Some(explicit) = &options.value_type {
                value_type_for_name(explicit)
            } else {
                let inferred = type_name(inner).ok_or_else(|| {
                    syn::Error::new_spanned(
                        &field.ty,
                        "Cannot infer the value type of this field, use #[rsql(value_type = \"...\")]",
                    )
                })?;
                value_type_for_name(&inferred)
            };

            if collection {
                quote! {
                    rsql::resolver::AttributeDescriptor::element_collection(#attribute_name, #value_type)
                }
            } else {
                quote! {
                    rsql::resolver::AttributeDescriptor::basic(#attribute_name, #value_type)
                }
            }
        };
        attributes.push(descriptor);
    }

    let register_code = if dependencies.is_empty() {
        quote!()
    } else {
        quote! {
            fn register_dependencies(registry: &rsql::resolver::SchemaRegistry) {
                #(#dependencies)*
            }
        }
    };

    let gen = quote! {
        impl #impl_generics rsql::resolver::RsqlEntity for #name #ty_generics #where_clause {
            fn entity_name() -> String {
                #entity_name.to_string()
            }

            fn entity_schema() -> rsql::resolver::EntitySchema {
                rsql::resolver::EntitySchema::new(#entity_name, vec![#(#attributes),*])
            }

            #register_code
        }
    };

    Ok(TokenStream::from(gen))
}
