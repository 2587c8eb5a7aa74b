use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::ReflectStruct;

/// Generates `Codec` with the object strategy, so the struct can be a field.
pub(crate) fn impl_codec(info: &ReflectStruct) -> TokenStream {
    let lz_serial = info.lz_serial_path();
    let codec_ = crate::path::codec_(lz_serial);
    let codec_mod_ = crate::path::codec_mod_(lz_serial);
    let field_kind_ = crate::path::field_kind_(lz_serial);
    let adapter_ = crate::path::adapter_(lz_serial);
    let node_ = crate::path::node_(lz_serial);

    let self_ty = info.self_ty();
    let (impl_generics, _, _) = info.generics().split_for_impl();
    let where_clause = info.where_clause_with(&codec_);

    quote! {
        impl #impl_generics #codec_ for #self_ty #where_clause {
            #[inline]
            fn field_kind() -> #field_kind_ {
                #field_kind_::Object
            }

            #[inline]
            fn encode(&self, adapter: &mut dyn #adapter_, node: #node_, key: &str) {
                #codec_mod_::encode_object(self, adapter, node, key);
            }

            #[inline]
            fn decode(&mut self, adapter: &mut dyn #adapter_, node: #node_, key: &str) {
                #codec_mod_::decode_object(self, adapter, node, key);
            }
        }
    }
}
