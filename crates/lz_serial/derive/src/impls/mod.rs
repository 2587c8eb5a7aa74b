//! Code generators, one per implemented trait.

mod auto_register;
mod trait_codec;
mod trait_default;
mod trait_reflect;
mod trait_serializable;

use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::ReflectStruct;

pub(crate) use auto_register::impl_auto_register_for;

/// Everything `#[derive(Reflect)]` emits, wrapped in an anonymous const.
pub(crate) fn impl_reflect_struct(info: &ReflectStruct) -> TokenStream {
    let reflect = trait_reflect::impl_reflect(info);
    let codec = trait_codec::impl_codec(info);
    let serializable = trait_serializable::impl_serializable(info);
    let multi = trait_serializable::impl_multi_serializable(info);
    let default = trait_default::impl_default(info);
    let auto_register = auto_register::get_auto_register_impl(info);

    quote! {
        const _: () = {
            #reflect
            #codec
            #serializable
            #multi
            #default
            #auto_register
        };
    }
}
