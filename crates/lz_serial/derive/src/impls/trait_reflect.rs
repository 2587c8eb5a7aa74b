use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::ReflectStruct;

/// Generates `Reflect`, with a process-wide registry cell.
///
/// A `static` in a generic impl is shared by every instantiation, so generic
/// structs use a `GenericRegistryCell` keyed by `TypeId`.
pub(crate) fn impl_reflect(info: &ReflectStruct) -> TokenStream {
    let lz_serial = info.lz_serial_path();
    let reflect_ = crate::path::reflect_(lz_serial);
    let codec_ = crate::path::codec_(lz_serial);
    let field_registry_ = crate::path::field_registry_(lz_serial);
    let field_descriptor_ = crate::path::field_descriptor_(lz_serial);

    let ident = info.ident();
    let self_ty = info.self_ty();
    let (impl_generics, _, _) = info.generics().split_for_impl();
    let where_clause = info.where_clause_with(&codec_);

    let descriptors = info.active_fields().map(|field| {
        let member = field.ident;
        let ty = field.ty;
        let key = field.key();
        quote! {
            #field_descriptor_::<Self>::new::<#ty>(#key, |v| &v.#member, |v| &mut v.#member)
        }
    });

    let build = quote! {
        #field_registry_::new(::std::vec![#(#descriptors),*])
    };

    let cell = if info.is_generic() {
        let generic_registry_cell_ = crate::path::generic_registry_cell_(lz_serial);
        quote! {
            static CELL: #generic_registry_cell_ = #generic_registry_cell_::new();
            CELL.get_or_init::<Self>(|| #build)
        }
    } else {
        let registry_cell_ = crate::path::registry_cell_(lz_serial);
        quote! {
            static CELL: #registry_cell_<#ident> = #registry_cell_::new();
            CELL.get_or_init(|| #build)
        }
    };

    quote! {
        impl #impl_generics #reflect_ for #self_ty #where_clause {
            fn field_registry() -> &'static #field_registry_<Self> {
                #cell
            }
        }
    }
}
