use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::ReflectStruct;

/// Generates `Serializable` for `#[reflect(format = F)]`.
pub(crate) fn impl_serializable(info: &ReflectStruct) -> TokenStream {
    let Some(format) = &info.attrs().format else {
        return crate::utils::empty();
    };
    let lz_serial = info.lz_serial_path();
    let serializable_ = crate::path::serializable_(lz_serial);
    let codec_ = crate::path::codec_(lz_serial);

    let self_ty = info.self_ty();
    let (impl_generics, _, _) = info.generics().split_for_impl();
    let where_clause = info.where_clause_with(&codec_);

    quote! {
        impl #impl_generics #serializable_ for #self_ty #where_clause {
            type Format = #format;
        }
    }
}

/// Generates `MultiSerializable` for `#[reflect(multi)]`.
///
/// Every active field type and the struct itself are added to the tables
/// of all formats.
pub(crate) fn impl_multi_serializable(info: &ReflectStruct) -> TokenStream {
    if !info.attrs().impl_multi() {
        return crate::utils::empty();
    }
    let lz_serial = info.lz_serial_path();
    let multi_serializable_ = crate::path::multi_serializable_(lz_serial);
    let multi_ = crate::path::multi_(lz_serial);
    let codec_ = crate::path::codec_(lz_serial);

    let self_ty = info.self_ty();
    let (impl_generics, _, _) = info.generics().split_for_impl();
    let where_clause = info.where_clause_with(&codec_);

    let field_types = info.active_fields().map(|field| field.ty);

    quote! {
        impl #impl_generics #multi_serializable_ for #self_ty #where_clause {
            fn register_field_types() {
                #( #multi_::register_type_with_all_formats::<#field_types>(); )*
                #multi_::register_type_with_all_formats::<Self>();
            }
        }
    }
}
