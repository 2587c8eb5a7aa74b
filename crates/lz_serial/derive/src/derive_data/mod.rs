//! Turns a `DeriveInput` into the data the generators need.

mod attributes;

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Generics, Ident, Type, WhereClause};

pub(crate) use attributes::{FieldAttributes, TypeAttributes};

/// A named field of the derived struct.
pub(crate) struct StructField<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub attrs: FieldAttributes,
}

impl StructField<'_> {
    /// Key of the field in documents.
    pub fn key(&self) -> String {
        match &self.attrs.rename {
            Some(key) => key.value(),
            None => self.ident.unraw().to_string(),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.attrs.skip.is_none()
    }
}

/// A struct with named fields and its `#[reflect(...)]` configuration.
pub(crate) struct ReflectStruct<'a> {
    lz_serial_path: syn::Path,
    ident: &'a Ident,
    generics: &'a Generics,
    attrs: TypeAttributes,
    fields: Vec<StructField<'a>>,
}

impl<'a> ReflectStruct<'a> {
    pub fn from_input(input: &'a DeriveInput) -> syn::Result<Self> {
        let attrs = TypeAttributes::parse_attrs(&input.attrs)?;

        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => Some(&named.named),
                Fields::Unit => None,
                Fields::Unnamed(_) => {
                    return Err(syn::Error::new_spanned(
                        &input.ident,
                        "`Reflect` needs named fields, their names are the document keys",
                    ));
                }
            },
            Data::Enum(_) | Data::Union(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "`Reflect` can only be derived for structs",
                ));
            }
        };

        if let Some(lifetime) = input.generics.lifetimes().next() {
            return Err(syn::Error::new_spanned(
                lifetime,
                "`Reflect` types must be `'static`, lifetime parameters are not supported",
            ));
        }

        let mut fields = Vec::new();
        for field in named.into_iter().flatten() {
            let Some(ident) = field.ident.as_ref() else {
                continue;
            };
            fields.push(StructField {
                ident,
                ty: &field.ty,
                attrs: FieldAttributes::parse_attrs(&field.attrs)?,
            });
        }

        let this = Self {
            lz_serial_path: crate::path::lz_serial(),
            ident: &input.ident,
            generics: &input.generics,
            attrs,
            fields,
        };
        this.check_unique_keys()?;
        Ok(this)
    }

    fn check_unique_keys(&self) -> syn::Result<()> {
        let active: Vec<_> = self.active_fields().collect();
        for (index, field) in active.iter().enumerate() {
            let key = field.key();
            if active[..index].iter().any(|prev| prev.key() == key) {
                return Err(syn::Error::new_spanned(
                    field.ident,
                    format!("duplicate document key `{key}`"),
                ));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn lz_serial_path(&self) -> &syn::Path {
        &self.lz_serial_path
    }

    #[inline]
    pub fn ident(&self) -> &Ident {
        self.ident
    }

    #[inline]
    pub fn generics(&self) -> &Generics {
        self.generics
    }

    #[inline]
    pub fn attrs(&self) -> &TypeAttributes {
        &self.attrs
    }

    #[inline]
    pub fn fields(&self) -> &[StructField<'a>] {
        &self.fields
    }

    /// Fields that are not `skip`ped, in declaration order.
    pub fn active_fields(&self) -> impl Iterator<Item = &StructField<'a>> {
        self.fields.iter().filter(|field| field.is_active())
    }

    /// Whether the struct has type or const parameters.
    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.generics.params.is_empty()
    }

    /// The `where` clause of the derived impls.
    ///
    /// For generic structs every type parameter gets `'static` and every
    /// active field type gets `extra`, usually `Codec`.
    pub fn where_clause_with(&self, extra: &TokenStream) -> Option<WhereClause> {
        if !self.is_generic() {
            return self.generics.where_clause.clone();
        }
        let mut where_clause = self
            .generics
            .where_clause
            .clone()
            .unwrap_or_else(|| syn::parse_quote!(where));
        for param in self.generics.type_params() {
            let ident = &param.ident;
            where_clause.predicates.push(syn::parse_quote!(#ident: 'static));
        }
        for field in self.active_fields() {
            let ty = field.ty;
            where_clause.predicates.push(syn::parse_quote!(#ty: #extra));
        }
        Some(where_clause)
    }

    /// `Ident<A, B>` for use in impl headers.
    pub fn self_ty(&self) -> TokenStream {
        let ident = self.ident;
        let (_, ty_generics, _) = self.generics.split_for_impl();
        quote!(#ident #ty_generics)
    }
}
