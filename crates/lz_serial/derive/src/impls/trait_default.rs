use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::ReflectStruct;

/// Generates `Default` for `#[reflect(default)]`.
///
/// Fields with `#[reflect(default = expr)]` start as `expr`, the others as
/// `Default::default()`. Skipped fields are included.
pub(crate) fn impl_default(info: &ReflectStruct) -> TokenStream {
    if info.attrs().default.is_none() {
        return crate::utils::empty();
    }
    let self_ty = info.self_ty();
    let (impl_generics, _, _) = info.generics().split_for_impl();

    let mut where_clause = info.generics().where_clause.clone();

    let inits = info.fields().iter().map(|field| {
        let member = field.ident;
        match &field.attrs.default {
            Some(expr) => quote!(#member: #expr),
            None => quote!(#member: ::core::default::Default::default()),
        }
    });

    if info.is_generic() {
        let where_clause = where_clause.get_or_insert_with(|| syn::parse_quote!(where));
        for field in info.fields().iter().filter(|f| f.attrs.default.is_none()) {
            let ty = field.ty;
            where_clause
                .predicates
                .push(syn::parse_quote!(#ty: ::core::default::Default));
        }
    }

    quote! {
        impl #impl_generics ::core::default::Default for #self_ty #where_clause {
            fn default() -> Self {
                Self {
                    #(#inits,)*
                }
            }
        }
    }
}
