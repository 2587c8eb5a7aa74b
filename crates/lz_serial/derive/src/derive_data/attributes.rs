//! `#[reflect(...)]` attribute parsing.

use proc_macro2::Span;
use syn::{Attribute, Expr, Ident, LitStr, Path, Token, parse::ParseStream};

use crate::REFLECT_ATTRIBUTE_NAME;

/// Runs `item` on every comma separated entry of every `#[reflect(...)]`.
fn parse_reflect_attrs(
    attrs: &[Attribute],
    mut item: impl FnMut(&Ident, ParseStream) -> syn::Result<()>,
) -> syn::Result<()> {
    for attr in attrs {
        if !attr.path().is_ident(REFLECT_ATTRIBUTE_NAME) {
            continue;
        }
        attr.parse_args_with(|input: ParseStream| {
            while !input.is_empty() {
                let name: Ident = input.parse()?;
                item(&name, input)?;
                if input.is_empty() {
                    break;
                }
                input.parse::<Token![,]>()?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

fn set_once<T>(slot: &mut Option<T>, value: T, name: &Ident) -> syn::Result<()> {
    if slot.is_some() {
        return Err(syn::Error::new(
            name.span(),
            format!("duplicate `{name}` attribute"),
        ));
    }
    *slot = Some(value);
    Ok(())
}

/// Type level attributes.
///
/// - `format = Path`: implement `Serializable` with that format.
/// - `multi`: implement `MultiSerializable`.
/// - `default`: implement `Default` from the field defaults.
/// - `auto_register`: register with `multi::auto_register`, implies `multi`.
#[derive(Default, Debug)]
pub(crate) struct TypeAttributes {
    pub format: Option<Path>,
    pub multi: Option<Span>,
    pub default: Option<Span>,
    pub auto_register: Option<Span>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        parse_reflect_attrs(attrs, |name, input| {
            if name == "format" {
                input.parse::<Token![=]>()?;
                set_once(&mut this.format, input.parse()?, name)
            } else if name == "multi" {
                set_once(&mut this.multi, name.span(), name)
            } else if name == "default" {
                set_once(&mut this.default, name.span(), name)
            } else if name == "auto_register" {
                set_once(&mut this.auto_register, name.span(), name)
            } else {
                Err(syn::Error::new(
                    name.span(),
                    format!(
                        "unknown type attribute `{name}`, expected one of \
                         `format`, `multi`, `default`, `auto_register`"
                    ),
                ))
            }
        })?;
        Ok(this)
    }

    /// Whether `MultiSerializable` is generated.
    #[inline]
    pub fn impl_multi(&self) -> bool {
        self.multi.is_some() || self.auto_register.is_some()
    }
}

/// Rejects keys that cannot be stored in every format.
///
/// Text documents are `path = value` lines with dot-joined paths and `#`
/// comments, so a key may not contain `.`, `=` or line breaks, start with
/// `#`, or carry surrounding whitespace.
pub(crate) fn check_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("field key must not be empty");
    }
    if key.trim() != key {
        return Err("field key must not start or end with whitespace");
    }
    if key.starts_with('#') {
        return Err("field key must not start with `#`");
    }
    if key.contains('.') {
        return Err("field key must not contain `.`, it separates nested keys");
    }
    if key.contains('=') {
        return Err("field key must not contain `=`");
    }
    if key.chars().any(char::is_control) {
        return Err("field key must not contain control characters");
    }
    Ok(())
}

/// Field level attributes.
///
/// - `rename = "key"`: key used in documents, defaults to the field name.
/// - `skip`: not serialized, still initialized by a generated `Default`.
/// - `default = expr`: value used by a generated `Default`.
#[derive(Default, Debug)]
pub(crate) struct FieldAttributes {
    pub rename: Option<LitStr>,
    pub skip: Option<Span>,
    pub default: Option<Expr>,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        parse_reflect_attrs(attrs, |name, input| {
            if name == "rename" {
                input.parse::<Token![=]>()?;
                let key: LitStr = input.parse()?;
                if let Err(reason) = check_key(&key.value()) {
                    return Err(syn::Error::new(key.span(), reason));
                }
                set_once(&mut this.rename, key, name)
            } else if name == "skip" {
                set_once(&mut this.skip, name.span(), name)
            } else if name == "default" {
                input.parse::<Token![=]>()?;
                set_once(&mut this.default, input.parse()?, name)
            } else {
                Err(syn::Error::new(
                    name.span(),
                    format!(
                        "unknown field attribute `{name}`, expected one of \
                         `rename`, `skip`, `default`"
                    ),
                ))
            }
        })?;
        Ok(this)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn rename_error(key: &str) -> Option<String> {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[reflect(rename = #key)])];
        FieldAttributes::parse_attrs(&attrs)
            .err()
            .map(|err| err.to_string())
    }

    #[test]
    fn accepts_plain_keys() {
        for key in ["displayName", "max size", "r#x", "a-b", "0"] {
            assert_eq!(rename_error(key), None, "{key}");
        }
    }

    #[test]
    fn rejects_keys_text_documents_cannot_hold() {
        for key in ["", "a=b", "#tag", "a.b", " pad", "pad ", "line\nbreak", "tab\t"] {
            assert!(rename_error(key).is_some(), "{key:?} accepted");
        }
        assert_eq!(
            rename_error("a=b").as_deref(),
            Some("field key must not contain `=`")
        );
    }

    #[test]
    fn duplicate_and_unknown_attributes() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[reflect(skip, skip)])];
        assert!(FieldAttributes::parse_attrs(&attrs).is_err());

        let attrs: Vec<Attribute> = vec![parse_quote!(#[reflect(flatten)])];
        assert!(FieldAttributes::parse_attrs(&attrs).is_err());

        let attrs: Vec<Attribute> = vec![parse_quote!(#[reflect(auto_register, format = Text)])];
        let parsed = TypeAttributes::parse_attrs(&attrs).unwrap();
        assert!(parsed.impl_multi());
        assert!(parsed.format.is_some());
    }
}
