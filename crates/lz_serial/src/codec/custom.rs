//! Explicit member lists for types that cannot derive [`Reflect`](crate::Reflect).

/// Implements [`Codec`](crate::Codec) for a struct from a list of its members.
///
/// The value is stored as an object whose children are the listed members,
/// in list order. Members are read and written as single scalars, so every
/// listed member must be a [`Primitive`](crate::Primitive); sequences and
/// nested objects are rejected at compile time.
///
/// # Examples
///
/// ```
/// use lz_serial::{Adapter, Codec, FieldKind, adapters::mock::MockAdapter, impl_custom_type};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Vec3 {
///     x: f32,
///     y: f32,
///     z: f32,
/// }
///
/// impl_custom_type!(Vec3 { x, y, z });
///
/// let mut mock = MockAdapter::new();
/// let root = mock.root();
/// let position = Vec3 { x: 1.0, y: 2.0, z: 3.0 };
/// position.encode(&mut mock, root, "position");
///
/// let mut read = Vec3::default();
/// read.decode(&mut mock, root, "position");
/// assert_eq!(read, position);
/// assert_eq!(Vec3::field_kind(), FieldKind::Custom);
/// ```
///
/// ```compile_fail
/// use lz_serial::impl_custom_type;
///
/// struct Path {
///     points: Vec<f32>,
/// }
///
/// impl_custom_type!(Path { points });
/// ```
#[macro_export]
macro_rules! impl_custom_type {
    ($ty:ty { $($member:ident),+ $(,)? }) => {
        impl $crate::Codec for $ty {
            #[inline]
            fn field_kind() -> $crate::FieldKind {
                $crate::FieldKind::Custom
            }

            fn encode(&self, adapter: &mut dyn $crate::Adapter, node: $crate::Node, key: &str) {
                let object = adapter.add_child(node, key);
                adapter.set_object(object);
                $(
                    $crate::codec::encode_primitive(
                        &self.$member,
                        adapter,
                        object,
                        ::core::stringify!($member),
                    );
                )+
            }

            fn decode(&mut self, adapter: &mut dyn $crate::Adapter, node: $crate::Node, key: &str) {
                let ::core::option::Option::Some(object) = adapter.child(node, key) else {
                    return;
                };
                if !adapter.is_object(object) {
                    return;
                }
                $(
                    $crate::codec::decode_primitive(
                        &mut self.$member,
                        adapter,
                        object,
                        ::core::stringify!($member),
                    );
                )+
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::adapters::mock::MockAdapter;
    use crate::{Adapter, Codec};

    #[derive(Default, Debug, PartialEq)]
    struct Color {
        r: u8,
        g: u8,
        b: u8,
        name: String,
    }

    crate::impl_custom_type!(Color { r, g, b, name });

    #[test]
    fn members_written_in_list_order() {
        let mut mock = MockAdapter::new();
        let root = mock.root();
        let teal = Color {
            r: 0,
            g: 128,
            b: 128,
            name: "teal".into(),
        };
        teal.encode(&mut mock, root, "accent");

        let details: Vec<_> = mock
            .operations()
            .iter()
            .map(|(op, detail)| format!("{op}:{detail}"))
            .collect();
        assert_eq!(
            details,
            [
                "setObject:accent",
                "setValue:r=0",
                "setValue:g=128",
                "setValue:b=128",
                "setValue:name=teal",
            ]
        );

        let mut read = Color::default();
        read.decode(&mut mock, root, "accent");
        assert_eq!(read, teal);
    }

    #[test]
    fn non_object_child_is_ignored() {
        let mut mock = MockAdapter::new();
        let root = mock.root();
        5_u8.encode(&mut mock, root, "accent");

        let mut read = Color {
            r: 1,
            ..Color::default()
        };
        read.decode(&mut mock, root, "accent");
        assert_eq!(read.r, 1);
    }
}
