//! See following macros:
//!
//! - [`Reflect`]
//! - [`impl_auto_register`]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static REFLECT_ATTRIBUTE_NAME: &str = "reflect";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;
mod utils;

// -----------------------------------------------------------------------------
// Macros

/// # Field Registry Derivation
///
/// `#[derive(Reflect)]` on a struct with named fields implements:
///
/// - `Reflect`: a field registry listing every field in declaration order.
/// - `Codec` with `FieldKind::Object`, so the struct can be a field of
///   another reflectable struct.
///
/// Every field type must implement `Codec`: the primitives, `Vec<E>`, other
/// reflectable structs, `impl_custom_type!` types and `Serde<T>`.
///
/// Generic structs are supported. Each instantiation gets its own registry,
/// and the impls require every field type to implement `Codec`.
///
/// ## Type Attributes
///
/// ### Fixed Format
///
/// `format = F` implements `Serializable` with the format marker `F`:
///
/// ```rust, ignore
/// #[derive(Reflect, Default)]
/// #[reflect(format = Text)]
/// struct Settings { /* ... */ }
/// ```
///
/// ### Runtime Format
///
/// `multi` implements `MultiSerializable`. The first `serialize_as` or
/// `deserialize_as` call registers every field type with all formats.
///
/// ```rust, ignore
/// #[derive(Reflect, Default)]
/// #[reflect(multi)]
/// struct Settings { /* ... */ }
///
/// settings.serialize_as::<Binary>(&mut out)?;
/// ```
///
/// ### Defaults
///
/// `default` implements `Default`. Fields take the value of their
/// `default = expr` attribute, or `Default::default()` otherwise.
///
/// ```rust, ignore
/// #[derive(Reflect)]
/// #[reflect(default)]
/// struct Window {
///     #[reflect(default = 800)]
///     width: u32,
///     #[reflect(default = String::from("main"))]
///     title: String,
/// }
/// ```
///
/// ### Auto Registration
///
/// `auto_register` implies `multi` and lets `multi::auto_register()` register
/// the type up front. It has no effect on generic types, and none at all
/// when the `auto_register` feature is disabled.
///
/// ## Field Attributes
///
/// - `rename = "key"`: the key used in documents. Keys must be unique, non-empty,
///   free of `.`, `=` and control characters, must not start with `#` and must
///   not be padded with whitespace.
/// - `skip`: the field is neither written nor read.
/// - `default = expr`: see [Defaults](#defaults).
///
/// ```rust, ignore
/// #[derive(Reflect, Default)]
/// struct Player {
///     #[reflect(rename = "displayName")]
///     name: String,
///     #[reflect(skip)]
///     session: Option<Session>,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match derive_data::ReflectStruct::from_input(&ast) {
        Ok(info) => impls::impl_reflect_struct(&info).into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Add the type to the automatic registry.
///
/// If the feature is not enabled, this macro will not do anything.
///
/// The type must be concrete and implement `MultiSerializable`.
///
/// ## Example
///
/// ```ignore
/// impl_auto_register!(foo::Foo);
/// impl_auto_register!(Pair<u32>); // Ok
/// impl_auto_register!(Pair<T>); // Error
/// ```
///
/// This does not conflict with the `reflect(auto_register)` attribute.
#[proc_macro]
pub fn impl_auto_register(input: TokenStream) -> TokenStream {
    let ty = parse_macro_input!(input as syn::Type);
    let lz_serial = path::lz_serial();
    let submit = impls::impl_auto_register_for(&lz_serial, &ty, proc_macro2::Span::call_site());

    quote::quote! {
        const _: () = {
            #submit
        };
    }
    .into()
}
