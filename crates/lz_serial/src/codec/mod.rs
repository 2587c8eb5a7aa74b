//! Per-type strategies for walking a value through an [`Adapter`].
//!
//! Every field type implements [`Codec`]. Which strategy an implementation
//! uses is fixed when the type is declared and reported by
//! [`Codec::field_kind`]; a type belongs to exactly one [`FieldKind`].
//!
//! | Kind | Implemented by | Strategy |
//! |------|----------------|----------|
//! | [`Custom`](FieldKind::Custom) | [`impl_custom_type!`](crate::impl_custom_type) | object of scalar members |
//! | [`Object`](FieldKind::Object) | `#[derive(Reflect)]` | [`encode_object`] / [`decode_object`] |
//! | [`Sequence`](FieldKind::Sequence) | `Vec<E>` | [`encode_sequence`] / [`decode_sequence`] |
//! | [`Primitive`](FieldKind::Primitive) | [`Primitive`] types | [`encode_primitive`] / [`decode_primitive`] |
//! | [`Serde`](FieldKind::Serde) | [`Serde<T>`] | handed to `serde` when the adapter allows it |
//!
//! All strategies share one shape: `encode` creates the child `key` under
//! `node` and fills it, `decode` looks the child up and leaves the value
//! untouched when it is missing or has the wrong shape.

use core::any::Any;

use crate::document::{Adapter, Node, Primitive};
use crate::registry::Reflect;

mod custom;
mod serde_bridge;

pub use serde_bridge::Serde;

// -----------------------------------------------------------------------------
// Codec

/// Strategy tag of a [`Codec`] implementation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldKind {
    /// External type with an explicit list of scalar members.
    Custom,
    /// Reflectable type with its own field registry.
    Object,
    /// Homogeneous ordered sequence.
    Sequence,
    /// One scalar.
    Primitive,
    /// Sub-tree owned by `serde`.
    Serde,
}

/// A type that can be stored as the child of a document node.
pub trait Codec: Any {
    /// Strategy used by this type.
    fn field_kind() -> FieldKind
    where
        Self: Sized;

    /// Writes `self` as the child `key` of `node`. An empty key writes into `node`.
    fn encode(&self, adapter: &mut dyn Adapter, node: Node, key: &str);

    /// Reads the child `key` of `node` into `self`. An empty key reads `node`.
    fn decode(&mut self, adapter: &mut dyn Adapter, node: Node, key: &str);
}

// -----------------------------------------------------------------------------
// Primitive

pub fn encode_primitive<T: Primitive>(value: &T, adapter: &mut dyn Adapter, node: Node, key: &str) {
    let child = adapter.add_child(node, key);
    adapter.set_value(child, value);
}

/// A missing child keeps `value`; a mismatching one resets it to the default.
pub fn decode_primitive<T: Primitive>(
    value: &mut T,
    adapter: &mut dyn Adapter,
    node: Node,
    key: &str,
) {
    if let Some(child) = adapter.child(node, key) {
        *value = adapter.get_value(child);
    }
}

macro_rules! impl_primitive_codec {
    ($($ty:ty),* $(,)?) => {$(
        impl Codec for $ty {
            #[inline]
            fn field_kind() -> FieldKind {
                FieldKind::Primitive
            }

            #[inline]
            fn encode(&self, adapter: &mut dyn Adapter, node: Node, key: &str) {
                encode_primitive(self, adapter, node, key);
            }

            #[inline]
            fn decode(&mut self, adapter: &mut dyn Adapter, node: Node, key: &str) {
                decode_primitive(self, adapter, node, key);
            }
        }
    )*};
}

impl_primitive_codec!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String);

// -----------------------------------------------------------------------------
// Sequence

pub fn encode_sequence<E: Codec>(items: &[E], adapter: &mut dyn Adapter, node: Node, key: &str) {
    let array = adapter.add_child(node, key);
    adapter.set_array(array, items.len());
    for item in items {
        let element = adapter.add_array_element(array);
        item.encode(adapter, element, "");
    }
}

/// Resizes `items` to the stored length, then decodes every slot.
///
/// Nothing happens unless the child exists and is an array.
pub fn decode_sequence<E: Codec + Default>(
    items: &mut Vec<E>,
    adapter: &mut dyn Adapter,
    node: Node,
    key: &str,
) {
    let Some(array) = adapter.child(node, key) else {
        return;
    };
    if !adapter.is_array(array) {
        return;
    }
    let len = adapter.array_len(array);
    items.clear();
    items.resize_with(len, E::default);
    for (index, item) in items.iter_mut().enumerate() {
        if let Some(element) = adapter.array_element(array, index) {
            item.decode(adapter, element, "");
        }
    }
}

impl<E: Codec + Default> Codec for Vec<E> {
    #[inline]
    fn field_kind() -> FieldKind {
        FieldKind::Sequence
    }

    #[inline]
    fn encode(&self, adapter: &mut dyn Adapter, node: Node, key: &str) {
        encode_sequence(self, adapter, node, key);
    }

    #[inline]
    fn decode(&mut self, adapter: &mut dyn Adapter, node: Node, key: &str) {
        decode_sequence(self, adapter, node, key);
    }
}

// -----------------------------------------------------------------------------
// Object

pub fn encode_object<T: Reflect>(value: &T, adapter: &mut dyn Adapter, node: Node, key: &str) {
    let object = adapter.add_child(node, key);
    adapter.set_object(object);
    value.serialize_fields(adapter, object);
}

/// Nothing happens unless the child exists and is an object.
pub fn decode_object<T: Reflect>(value: &mut T, adapter: &mut dyn Adapter, node: Node, key: &str) {
    let Some(object) = adapter.child(node, key) else {
        return;
    };
    if adapter.is_object(object) {
        value.deserialize_fields(adapter, object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockAdapter;

    fn round_trip<T: Codec + Default>(value: &T) -> T {
        let mut mock = MockAdapter::new();
        let root = mock.root();
        value.encode(&mut mock, root, "value");
        let mut out = T::default();
        out.decode(&mut mock, root, "value");
        out
    }

    #[test]
    fn kinds_are_fixed_per_type() {
        assert_eq!(i32::field_kind(), FieldKind::Primitive);
        assert_eq!(String::field_kind(), FieldKind::Primitive);
        assert_eq!(<Vec<u8>>::field_kind(), FieldKind::Sequence);
        assert_eq!(<Vec<Vec<f32>>>::field_kind(), FieldKind::Sequence);
    }

    #[test]
    fn nested_sequences() {
        let grid = vec![vec![1, 2, 3], vec![], vec![4]];
        assert_eq!(round_trip(&grid), grid);
        let words = vec!["a".to_string(), String::new()];
        assert_eq!(round_trip(&words), words);
    }

    #[test]
    fn missing_children_leave_values_untouched() {
        let mut mock = MockAdapter::new();
        let root = mock.root();

        let mut number = 17_i32;
        number.decode(&mut mock, root, "absent");
        assert_eq!(number, 17);

        let mut list = vec![1_u8, 2];
        list.decode(&mut mock, root, "absent");
        assert_eq!(list, [1, 2]);
    }

    #[test]
    fn sequence_requires_array_node() {
        let mut mock = MockAdapter::new();
        let root = mock.root();
        7_i32.encode(&mut mock, root, "list");

        let mut list = vec![9_i32];
        list.decode(&mut mock, root, "list");
        assert_eq!(list, [9]);
    }

    #[test]
    fn sequence_is_resized_to_stored_length() {
        let mut mock = MockAdapter::new();
        let root = mock.root();
        vec![5_u16, 6].encode(&mut mock, root, "list");

        let mut list = vec![1_u16, 2, 3, 4];
        list.decode(&mut mock, root, "list");
        assert_eq!(list, [5, 6]);

        assert!(mock.has_operation("setArray", "list[2]"));
        assert!(mock.has_operation("setValue", "=5"));
    }

    #[test]
    fn empty_key_targets_the_node_itself() {
        let mut mock = MockAdapter::new();
        let root = mock.root();
        let slot = mock.add_child(root, "slot");
        true.encode(&mut mock, slot, "");

        let mut flag = false;
        flag.decode(&mut mock, slot, "");
        assert!(flag);
    }
}
