//! The tree-shaped document every format adapter exposes.
//!
//! ## Menu
//!
//! - [`Node`]: a stable slot id into an adapter's node storage.
//! - [`Adapter`]: navigation, shape and scalar access over one document.
//! - [`Scalar`] / [`ScalarKind`]: the closed set of leaf values.
//! - [`Primitive`]: the Rust types that map onto a [`Scalar`].
//!
//! Adapters never report field-level failures. A missing node is `None`,
//! and a scalar of the wrong kind reads back as the type's zero value.

use core::fmt;
use std::borrow::Cow;

use crate::SerialError;

// -----------------------------------------------------------------------------
// Node

/// Handle to one node of an adapter's document.
///
/// A `Node` is an index into storage owned by the adapter that produced it,
/// so it stays valid for the whole lifetime of that adapter no matter how much
/// the document grows. Using it with another adapter is meaningless but safe.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Node(u32);

impl Node {
    /// The document root. Every adapter places it in slot `0`.
    pub const ROOT: Node = Node(0);

    /// # Panics
    ///
    /// If `index` does not fit in a `u32`.
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "document exceeds u32::MAX nodes");
        Node(index as u32)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// -----------------------------------------------------------------------------
// Scalar

/// Discriminant of a [`Scalar`], used to tell an adapter what a reader expects.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Str,
}

impl ScalarKind {
    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64
        )
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/// A leaf value of a document.
#[derive(Clone, PartialEq, Debug)]
pub enum Scalar<'a> {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(Cow<'a, str>),
}

impl<'a> Scalar<'a> {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::U8(_) => ScalarKind::U8,
            Self::U16(_) => ScalarKind::U16,
            Self::U32(_) => ScalarKind::U32,
            Self::U64(_) => ScalarKind::U64,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            Self::Str(_) => ScalarKind::Str,
        }
    }

    pub fn into_owned(self) -> Scalar<'static> {
        match self {
            Self::Bool(v) => Scalar::Bool(v),
            Self::I8(v) => Scalar::I8(v),
            Self::I16(v) => Scalar::I16(v),
            Self::I32(v) => Scalar::I32(v),
            Self::I64(v) => Scalar::I64(v),
            Self::U8(v) => Scalar::U8(v),
            Self::U16(v) => Scalar::U16(v),
            Self::U32(v) => Scalar::U32(v),
            Self::U64(v) => Scalar::U64(v),
            Self::F32(v) => Scalar::F32(v),
            Self::F64(v) => Scalar::F64(v),
            Self::Str(v) => Scalar::Str(Cow::Owned(v.into_owned())),
        }
    }

    /// Returns the string slice of a [`Scalar::Str`].
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Converts into a scalar of `kind`.
    ///
    /// - Same kind: unchanged.
    /// - Integer to integer: only when the value fits the target.
    /// - Number to float: `as` conversion.
    /// - Float to integer: only when the float holds an integral value that fits.
    /// - Anything involving `Bool` or `Str` across kinds: `None`.
    pub fn convert(self, kind: ScalarKind) -> Option<Scalar<'static>> {
        if self.kind() == kind {
            return Some(self.into_owned());
        }
        match kind {
            ScalarKind::Bool | ScalarKind::Str => None,
            ScalarKind::F32 => self.as_f64().map(|v| Scalar::F32(v as f32)),
            ScalarKind::F64 => self.as_f64().map(Scalar::F64),
            _ => self.as_i128().and_then(|v| Scalar::from_i128(kind, v)),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        Some(match *self {
            Self::I8(v) => v.into(),
            Self::I16(v) => v.into(),
            Self::I32(v) => v.into(),
            Self::I64(v) => v as f64,
            Self::U8(v) => v.into(),
            Self::U16(v) => v.into(),
            Self::U32(v) => v.into(),
            Self::U64(v) => v as f64,
            Self::F32(v) => v.into(),
            Self::F64(v) => v,
            Self::Bool(_) | Self::Str(_) => return None,
        })
    }

    fn as_i128(&self) -> Option<i128> {
        match *self {
            Self::I8(v) => Some(v.into()),
            Self::I16(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v.into()),
            Self::U8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => Some(v.into()),
            Self::F32(v) => integral(v.into()),
            Self::F64(v) => integral(v),
            Self::Bool(_) | Self::Str(_) => None,
        }
    }

    fn from_i128(kind: ScalarKind, v: i128) -> Option<Scalar<'static>> {
        match kind {
            ScalarKind::I8 => i8::try_from(v).ok().map(Scalar::I8),
            ScalarKind::I16 => i16::try_from(v).ok().map(Scalar::I16),
            ScalarKind::I32 => i32::try_from(v).ok().map(Scalar::I32),
            ScalarKind::I64 => i64::try_from(v).ok().map(Scalar::I64),
            ScalarKind::U8 => u8::try_from(v).ok().map(Scalar::U8),
            ScalarKind::U16 => u16::try_from(v).ok().map(Scalar::U16),
            ScalarKind::U32 => u32::try_from(v).ok().map(Scalar::U32),
            ScalarKind::U64 => u64::try_from(v).ok().map(Scalar::U64),
            _ => None,
        }
    }
}

#[inline]
fn integral(v: f64) -> Option<i128> {
    // `i128` covers every integer representable by `u64` and `i64`.
    (v.is_finite() && v.fract() == 0.0 && v.abs() < 1e38).then_some(v as i128)
}

impl fmt::Display for Scalar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => fmt::Display::fmt(v, f),
            Self::I8(v) => fmt::Display::fmt(v, f),
            Self::I16(v) => fmt::Display::fmt(v, f),
            Self::I32(v) => fmt::Display::fmt(v, f),
            Self::I64(v) => fmt::Display::fmt(v, f),
            Self::U8(v) => fmt::Display::fmt(v, f),
            Self::U16(v) => fmt::Display::fmt(v, f),
            Self::U32(v) => fmt::Display::fmt(v, f),
            Self::U64(v) => fmt::Display::fmt(v, f),
            Self::F32(v) => fmt::Display::fmt(v, f),
            Self::F64(v) => fmt::Display::fmt(v, f),
            Self::Str(v) => f.write_str(v),
        }
    }
}

// -----------------------------------------------------------------------------
// Primitive

mod sealed {
    pub trait Sealed {}
}

/// A Rust type stored directly as a [`Scalar`].
///
/// The set is closed: `bool`, the 8 to 64 bit integers, `f32`, `f64` and
/// [`String`]. Asking an adapter for any other type does not compile.
///
/// ```compile_fail
/// # use lz_serial::{Adapter, Node};
/// fn read(adapter: &mut dyn Adapter) -> char {
///     adapter.get_value::<char>(Node::ROOT)
/// }
/// ```
pub trait Primitive: sealed::Sealed + Default + Send + Sync + 'static {
    const KIND: ScalarKind;

    fn to_scalar(&self) -> Scalar<'_>;

    /// Converts with [`Scalar::convert`], `None` when the kinds are incompatible.
    fn from_scalar(scalar: Scalar<'_>) -> Option<Self>;
}

macro_rules! impl_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Primitive for $ty {
            const KIND: ScalarKind = ScalarKind::$variant;

            #[inline]
            fn to_scalar(&self) -> Scalar<'_> {
                Scalar::$variant(*self)
            }

            #[inline]
            fn from_scalar(scalar: Scalar<'_>) -> Option<Self> {
                match scalar.convert(ScalarKind::$variant)? {
                    Scalar::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    )*};
}

impl_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

impl sealed::Sealed for String {}

impl Primitive for String {
    const KIND: ScalarKind = ScalarKind::Str;

    #[inline]
    fn to_scalar(&self) -> Scalar<'_> {
        Scalar::Str(Cow::Borrowed(self))
    }

    #[inline]
    fn from_scalar(scalar: Scalar<'_>) -> Option<Self> {
        match scalar {
            Scalar::Str(v) => Some(v.into_owned()),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Adapter

/// One document in one wire format, open for either reading or writing.
///
/// An adapter is created per top-level call by [`Format::reader`] or
/// [`Format::writer`] and dropped at the end of it. Node handles from
/// [`child`](Adapter::child) and [`array_element`](Adapter::array_element)
/// are for reading; handles from [`add_child`](Adapter::add_child) and
/// [`add_array_element`](Adapter::add_array_element) are for writing.
/// Adapters ignore writes made while reading.
///
/// An empty key always designates the node itself. Sequence elements are
/// visited with `""` so that element codecs work on the element node.
///
/// [`Format::reader`]: crate::Format::reader
/// [`Format::writer`]: crate::Format::writer
pub trait Adapter {
    /// The whole document. Valid right after construction.
    fn root(&self) -> Node;

    /// The existing child `key` of `node`, or `None`.
    fn child(&mut self, node: Node, key: &str) -> Option<Node>;

    /// Creates the child slot `key` under `node`, replacing any previous one.
    fn add_child(&mut self, node: Node, key: &str) -> Node;

    fn is_object(&self, node: Node) -> bool;

    fn set_object(&mut self, node: Node);

    fn is_array(&self, node: Node) -> bool;

    /// Marks `node` as an array of `len` elements.
    ///
    /// For formats that grow arrays on demand this is only a capacity hint.
    fn set_array(&mut self, node: Node, len: usize);

    /// Number of elements of the array at `node`, `0` if it is not an array.
    fn array_len(&mut self, node: Node) -> usize;

    fn array_element(&mut self, node: Node, index: usize) -> Option<Node>;

    /// Appends a new element slot to the array at `node`.
    fn add_array_element(&mut self, node: Node) -> Node;

    /// Reads the scalar at `node`.
    ///
    /// `kind` tells untyped formats how to decode the value. The result may
    /// be of a different kind; [`Primitive::from_scalar`] converts it.
    fn get_scalar(&mut self, node: Node, kind: ScalarKind) -> Option<Scalar<'static>>;

    fn set_scalar(&mut self, node: Node, value: Scalar<'_>);

    /// Stores a `serde` value as the subtree at `node`.
    ///
    /// Returns `false` when the format has no `serde` bridge.
    fn set_serialized(&mut self, node: Node, value: &dyn erased_serde::Serialize) -> bool {
        let _ = (node, value);
        false
    }

    /// Hands a `serde` deserializer over the subtree at `node` to `visit`.
    ///
    /// Returns `false` when the format has no `serde` bridge.
    fn with_deserializer(
        &mut self,
        node: Node,
        visit: &mut dyn FnMut(&mut dyn erased_serde::Deserializer<'static>),
    ) -> bool {
        let _ = (node, visit);
        false
    }

    /// Flushes the document to the output. Called once, after the last write.
    fn finish_serialization(&mut self) -> Result<(), SerialError> {
        Ok(())
    }

    /// Called once, after the last read.
    fn finish_deserialization(&mut self) {}
}

impl dyn Adapter + '_ {
    /// Reads `node` as `T`, falling back to `T::default()` on mismatch.
    #[inline]
    pub fn get_value<T: Primitive>(&mut self, node: Node) -> T {
        self.get_scalar(node, T::KIND)
            .and_then(T::from_scalar)
            .unwrap_or_default()
    }

    #[inline]
    pub fn set_value<T: Primitive>(&mut self, node: Node, value: &T) {
        self.set_scalar(node, value.to_scalar());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_index_round_trips() {
        assert_eq!(Node::from_index(0), Node::ROOT);
        assert_eq!(Node::from_index(u32::MAX as usize).index(), u32::MAX as usize);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "exceeds u32::MAX nodes")]
    fn node_index_overflow_panics() {
        let _ = Node::from_index(u32::MAX as usize + 1);
    }

    #[test]
    fn integer_conversion_checks_range() {
        assert_eq!(Scalar::I64(200).convert(ScalarKind::U8), Some(Scalar::U8(200)));
        assert_eq!(Scalar::I64(300).convert(ScalarKind::U8), None);
        assert_eq!(Scalar::I32(-1).convert(ScalarKind::U32), None);
        assert_eq!(Scalar::U64(7).convert(ScalarKind::I16), Some(Scalar::I16(7)));
    }

    #[test]
    fn float_conversion() {
        assert_eq!(Scalar::I32(3).convert(ScalarKind::F64), Some(Scalar::F64(3.0)));
        assert_eq!(Scalar::F64(4.0).convert(ScalarKind::I32), Some(Scalar::I32(4)));
        assert_eq!(Scalar::F64(4.5).convert(ScalarKind::I32), None);
        assert_eq!(Scalar::F64(f64::NAN).convert(ScalarKind::I64), None);
        assert_eq!(Scalar::F64(0.5).convert(ScalarKind::F32), Some(Scalar::F32(0.5)));
    }

    #[test]
    fn strings_and_bools_never_cross() {
        assert_eq!(Scalar::Str("1".into()).convert(ScalarKind::I32), None);
        assert_eq!(Scalar::I32(1).convert(ScalarKind::Str), None);
        assert_eq!(Scalar::Bool(true).convert(ScalarKind::U8), None);
        assert_eq!(Scalar::U8(1).convert(ScalarKind::Bool), None);
    }

    #[test]
    fn primitive_round_trip_through_scalar() {
        assert_eq!(i16::from_scalar((-12_i16).to_scalar()), Some(-12));
        assert_eq!(
            String::from_scalar("text".to_string().to_scalar()),
            Some("text".to_string())
        );
        assert_eq!(bool::from_scalar(Scalar::Str("true".into())), None);
        assert_eq!(<f32 as Primitive>::KIND, ScalarKind::F32);
    }

    #[test]
    fn display_matches_plain_values() {
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::I32(-5).to_string(), "-5");
        assert_eq!(Scalar::F64(2.5).to_string(), "2.5");
        assert_eq!(Scalar::Str("abc".into()).to_string(), "abc");
    }

    #[test]
    fn node_index_round_trip() {
        assert_eq!(Node::ROOT.index(), 0);
        assert_eq!(Node::from_index(17).index(), 17);
    }
}
