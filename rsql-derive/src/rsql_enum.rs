use proc_macro::TokenStream;
use quote::quote;
use syn::{DataEnum, DeriveInput, Fields, LitStr, Result};

pub(crate) fn generate_enum_type(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut type_name = name.to_string();
    for attr in &ast.attrs {
        if attr.path().is_ident("rsql") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let s: LitStr = meta.value()?.parse()?;
                    type_name = s.value();
                    Ok(())
                } else {
                    Err(meta.error("Unknown rsql enum attribute"))
                }
            })?;
        }
    }

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                format!(
                    "Failed to derive RsqlEnum for enum '{}': variant '{}' carries data, only unit variants are supported",
                    name, variant.ident
                ),
            ));
        }

        let mut variant_name = variant.ident.to_string();
        for attr in &variant.attrs {
            if attr.path().is_ident("rsql") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        let s: LitStr = meta.value()?.parse()?;
                        variant_name = s.value();
                        Ok(())
                    } else {
                        Err(meta.error("Unknown rsql variant attribute"))
                    }
                })?;
            }
        }
        variants.push(variant_name);
    }

    let gen = quote! {
        impl #impl_generics rsql::resolver::RsqlEnum for #name #ty_generics #where_clause {
            fn enum_type() -> rsql::common::EnumType {
                rsql::common::EnumType::new(#type_name, &[#(#variants),*])
            }
        }
    };

    Ok(TokenStream::from(gen))
}
