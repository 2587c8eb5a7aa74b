//! Paths of `lz_serial` items used by generated code.
//!
//! Kept in one place so that moving an item only touches this file.

use proc_macro2::TokenStream;
use quote::quote;

/// Path of the `lz_serial` crate as seen from the invoking crate.
///
/// Resolved from the invoking crate's `Cargo.toml`, which is costly, so it is
/// looked up once per expansion and passed around.
pub(crate) fn lz_serial() -> syn::Path {
    lz_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("lz_serial"))
}

#[inline(always)]
pub(crate) fn reflect_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::Reflect)
}

#[inline(always)]
pub(crate) fn codec_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::Codec)
}

#[inline(always)]
pub(crate) fn codec_mod_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::codec)
}

#[inline(always)]
pub(crate) fn field_kind_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::FieldKind)
}

#[inline(always)]
pub(crate) fn adapter_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::Adapter)
}

#[inline(always)]
pub(crate) fn node_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::Node)
}

#[inline(always)]
pub(crate) fn field_registry_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::FieldRegistry)
}

#[inline(always)]
pub(crate) fn field_descriptor_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::FieldDescriptor)
}

#[inline(always)]
pub(crate) fn registry_cell_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::registry::RegistryCell)
}

#[inline(always)]
pub(crate) fn generic_registry_cell_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::registry::GenericRegistryCell)
}

#[inline(always)]
pub(crate) fn serializable_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::Serializable)
}

#[inline(always)]
pub(crate) fn multi_serializable_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::MultiSerializable)
}

#[inline(always)]
pub(crate) fn multi_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::multi)
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(lz_serial: &syn::Path) -> TokenStream {
    quote!(#lz_serial::__macro_exports::auto_register)
}
