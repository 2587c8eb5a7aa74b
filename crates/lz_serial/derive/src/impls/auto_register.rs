use proc_macro2::TokenStream;

use crate::derive_data::ReflectStruct;

/// Generates the `inventory` submission of `#[reflect(auto_register)]`.
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(info: &ReflectStruct) -> TokenStream {
    let Some(span) = info.attrs().auto_register else {
        return crate::utils::empty();
    };
    // The instantiations of a generic type are unknown here.
    if info.is_generic() {
        return crate::utils::empty();
    }
    let ident = info.ident();
    let ty: syn::Type = syn::parse_quote!(#ident);
    impl_auto_register_for(info.lz_serial_path(), &ty, span)
}

#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_: &ReflectStruct) -> TokenStream {
    crate::utils::empty()
}

/// `inventory::submit!` of `ensure_registered::<ty>`.
#[cfg(feature = "auto_register")]
pub(crate) fn impl_auto_register_for(
    lz_serial: &syn::Path,
    ty: &syn::Type,
    span: proc_macro2::Span,
) -> TokenStream {
    let auto_register_ = crate::path::auto_register_(lz_serial);
    let multi_ = crate::path::multi_(lz_serial);
    quote::quote_spanned! { span =>
        #auto_register_::inventory::submit! {
            #auto_register_::__AutoRegisterFunc(#multi_::ensure_registered::<#ty>)
        }
    }
}

#[cfg(not(feature = "auto_register"))]
pub(crate) fn impl_auto_register_for(
    _: &syn::Path,
    _: &syn::Type,
    _: proc_macro2::Span,
) -> TokenStream {
    crate::utils::empty()
}
