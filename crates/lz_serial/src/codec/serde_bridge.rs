use core::fmt;
use core::ops::{Deref, DerefMut};

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;

use super::{Codec, FieldKind};
use crate::document::{Adapter, Node};

/// Field wrapper that stores `T` through `serde`.
///
/// For types that have a `serde` representation but neither derive
/// [`Reflect`](crate::Reflect) nor fit [`impl_custom_type!`](crate::impl_custom_type).
/// Only adapters with a `serde` bridge (the `Json` and `Yaml` formats)
/// store anything; elsewhere the field is skipped.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "json")] {
/// use std::collections::BTreeMap;
/// use lz_serial::{Reflect, Serde, Serializable, format::Json};
///
/// #[derive(Reflect, Default)]
/// #[reflect(format = Json)]
/// struct Palette {
///     colors: Serde<BTreeMap<String, u32>>,
/// }
///
/// let mut palette = Palette::default();
/// palette.colors.insert("red".into(), 0xFF0000);
///
/// let mut out = Vec::new();
/// palette.serialize(&mut out).unwrap();
///
/// let mut read = Palette::default();
/// read.deserialize(&mut out.as_slice());
/// assert_eq!(read.colors["red"], 0xFF0000);
/// # }
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Serde<T>(pub T);

impl<T> Serde<T> {
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Serde<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> Deref for Serde<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Serde<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Serde<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T> Codec for Serde<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    #[inline]
    fn field_kind() -> FieldKind {
        FieldKind::Serde
    }

    fn encode(&self, adapter: &mut dyn Adapter, node: Node, key: &str) {
        let child = adapter.add_child(node, key);
        if !adapter.set_serialized(child, &self.0) {
            tracing::debug!(
                target: "lz_serial::codec",
                key,
                ty = core::any::type_name::<T>(),
                "adapter has no serde bridge, field skipped"
            );
        }
    }

    fn decode(&mut self, adapter: &mut dyn Adapter, node: Node, key: &str) {
        let Some(child) = adapter.child(node, key) else {
            return;
        };
        let mut decoded = None;
        let bridged = adapter.with_deserializer(child, &mut |deserializer| {
            match erased_serde::deserialize::<T>(deserializer) {
                Ok(value) => decoded = Some(value),
                Err(err) => tracing::debug!(
                    target: "lz_serial::codec",
                    key,
                    error = %err,
                    "serde rejected stored value, field kept"
                ),
            }
        });
        if !bridged {
            tracing::debug!(
                target: "lz_serial::codec",
                key,
                ty = core::any::type_name::<T>(),
                "adapter has no serde bridge, field skipped"
            );
        }
        if let Some(value) = decoded {
            self.0 = value;
        }
    }
}
