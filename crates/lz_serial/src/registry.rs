//! Per-type field registries.
//!
//! ## Menu
//!
//! - [`FieldDescriptor`]: one declared field, its key, type and accessors.
//! - [`FieldRegistry`]: the ordered descriptors of one type.
//! - [`RegistryCell`] / [`GenericRegistryCell`]: process-wide storage that
//!   builds a registry exactly once.
//! - [`Reflect`]: types that expose a registry, usually derived.
//! - [`Serializable`]: reflectable types bound to one [`Format`].
//!
//! A registry is built on first use and never changes afterwards. The
//! registry only holds accessor functions, never field values.

use core::any::{Any, TypeId};
use core::fmt;
use std::io::{Read, Write};
use std::sync::{OnceLock, PoisonError, RwLock};

use lz_utils::TypeIdMap;

use crate::SerialError;
use crate::codec::{Codec, FieldKind};
use crate::document::{Adapter, Node};
use crate::format::Format;

// -----------------------------------------------------------------------------
// FieldDescriptor

/// One declared field of `T`.
pub struct FieldDescriptor<T: 'static> {
    name: &'static str,
    kind: FieldKind,
    type_id: TypeId,
    type_name: &'static str,
    get: fn(&T) -> &dyn Codec,
    get_mut: fn(&mut T) -> &mut dyn Codec,
}

impl<T: 'static> FieldDescriptor<T> {
    /// Describes a field of type `F` stored under `name`.
    ///
    /// `get` and `get_mut` must return the same field of type `F`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lz_serial::{FieldDescriptor, FieldKind};
    ///
    /// struct Track {
    ///     gain: f32,
    /// }
    ///
    /// let field = FieldDescriptor::<Track>::new::<f32>("gain", |t| &t.gain, |t| &mut t.gain);
    /// assert_eq!(field.name(), "gain");
    /// assert_eq!(field.kind(), FieldKind::Primitive);
    /// assert_eq!(field.type_name(), "f32");
    /// ```
    pub fn new<F: Codec>(
        name: &'static str,
        get: fn(&T) -> &dyn Codec,
        get_mut: fn(&mut T) -> &mut dyn Codec,
    ) -> Self {
        Self {
            name,
            kind: F::field_kind(),
            type_id: TypeId::of::<F>(),
            type_name: core::any::type_name::<F>(),
            get,
            get_mut,
        }
    }

    /// Key of the field in documents.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn value<'v>(&self, owner: &'v T) -> &'v dyn Codec {
        (self.get)(owner)
    }

    #[inline]
    pub fn value_mut<'v>(&self, owner: &'v mut T) -> &'v mut dyn Codec {
        (self.get_mut)(owner)
    }

    /// Writes this field of `owner` as the child `name` of `node`.
    #[inline]
    pub fn serialize(&self, owner: &T, adapter: &mut dyn Adapter, node: Node) {
        self.value(owner).encode(adapter, node, self.name);
    }

    /// Reads the child `name` of `node` into this field of `owner`.
    #[inline]
    pub fn deserialize(&self, owner: &mut T, adapter: &mut dyn Adapter, node: Node) {
        self.value_mut(owner).decode(adapter, node, self.name);
    }
}

impl<T: 'static> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// FieldRegistry

/// The fields of `T` in declaration order.
pub struct FieldRegistry<T: 'static> {
    type_name: &'static str,
    fields: Box<[FieldDescriptor<T>]>,
}

impl<T: 'static> FieldRegistry<T> {
    pub fn new(fields: Vec<FieldDescriptor<T>>) -> Self {
        Self {
            type_name: core::any::type_name::<T>(),
            fields: fields.into_boxed_slice(),
        }
    }

    /// Name of the owning type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, FieldDescriptor<T>> {
        self.fields.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The field stored under `name`.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Writes every field of `owner` under `node`, in declaration order.
    pub fn serialize(&self, owner: &T, adapter: &mut dyn Adapter, node: Node) {
        for field in self.fields.iter() {
            field.serialize(owner, adapter, node);
        }
    }

    /// Reads every field of `owner` from `node`, in declaration order.
    pub fn deserialize(&self, owner: &mut T, adapter: &mut dyn Adapter, node: Node) {
        for field in self.fields.iter() {
            field.deserialize(owner, adapter, node);
        }
    }
}

impl<'a, T: 'static> IntoIterator for &'a FieldRegistry<T> {
    type Item = &'a FieldDescriptor<T>;
    type IntoIter = core::slice::Iter<'a, FieldDescriptor<T>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<T: 'static> fmt::Debug for FieldRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

fn trace_built<T>(registry: &FieldRegistry<T>) {
    tracing::trace!(
        target: "lz_serial::registry",
        ty = registry.type_name,
        fields = registry.len(),
        "field registry built"
    );
}

// -----------------------------------------------------------------------------
// Cells

/// Process-wide storage of the registry of one non-generic type.
///
/// Concurrent first calls build the registry once; every caller gets the
/// same `&'static` reference.
///
/// ```
/// use lz_serial::{FieldDescriptor, FieldRegistry, registry::RegistryCell};
///
/// struct Meter {
///     level: u8,
/// }
///
/// fn registry() -> &'static FieldRegistry<Meter> {
///     static CELL: RegistryCell<Meter> = RegistryCell::new();
///     CELL.get_or_init(|| {
///         FieldRegistry::new(vec![FieldDescriptor::<Meter>::new::<u8>(
///             "level",
///             |m| &m.level,
///             |m| &mut m.level,
///         )])
///     })
/// }
///
/// assert!(core::ptr::eq(registry(), registry()));
/// assert_eq!(registry().len(), 1);
/// ```
pub struct RegistryCell<T: 'static>(OnceLock<FieldRegistry<T>>);

impl<T: 'static> RegistryCell<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> FieldRegistry<T>) -> &FieldRegistry<T> {
        self.0.get_or_init(|| {
            let registry = f();
            trace_built(&registry);
            registry
        })
    }
}

impl<T: 'static> Default for RegistryCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide storage of registries of a generic type.
///
/// A `static` inside a generic function is shared by every instantiation,
/// so the registries are kept per [`TypeId`], each in its own init-once slot.
pub struct GenericRegistryCell(RwLock<TypeIdMap<&'static (dyn Any + Send + Sync)>>);

impl GenericRegistryCell {
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    /// Returns the registry of `T`, building it with `f` on first use.
    ///
    /// `f` runs once per `T`, even when threads race, and without holding the
    /// map lock, so it may build the registries of other instantiations.
    pub fn get_or_init<T: 'static>(
        &self,
        f: impl FnOnce() -> FieldRegistry<T>,
    ) -> &'static FieldRegistry<T> {
        let type_id = TypeId::of::<T>();
        let found = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied();
        let slot = match found {
            Some(slot) => slot,
            None => *self
                .0
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .get_or_insert(type_id, || -> &'static (dyn Any + Send + Sync) {
                    Box::leak(Box::new(OnceLock::<FieldRegistry<T>>::new()))
                }),
        };
        let Some(slot) = (slot as &dyn Any).downcast_ref::<OnceLock<FieldRegistry<T>>>() else {
            panic!(
                "registry cell holds a different type than `{}`",
                core::any::type_name::<T>()
            )
        };
        slot.get_or_init(|| {
            let registry = f();
            trace_built(&registry);
            registry
        })
    }
}

impl Default for GenericRegistryCell {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// Reflect

/// A type that enumerates its fields through a [`FieldRegistry`].
///
/// Implemented by `#[derive(Reflect)]`.
///
/// Document keys must be storable by every format, so renames containing
/// `.` or `=`, starting with `#`, or padded with whitespace are rejected:
///
/// ```compile_fail
/// use lz_serial::Reflect;
///
/// #[derive(Reflect, Default)]
/// struct Keys {
///     #[reflect(rename = "a=b")]
///     eq: i32,
/// }
/// ```
///
/// ```compile_fail
/// use lz_serial::Reflect;
///
/// #[derive(Reflect, Default)]
/// struct Keys {
///     #[reflect(rename = "#tag")]
///     hash: i32,
/// }
/// ```
pub trait Reflect: Sized + 'static {
    /// The registry of this type, built on first call.
    fn field_registry() -> &'static FieldRegistry<Self>;

    /// Writes every field under `node`.
    #[inline]
    fn serialize_fields(&self, adapter: &mut dyn Adapter, node: Node) {
        Self::field_registry().serialize(self, adapter, node);
    }

    /// Reads every field from `node`. Missing fields keep their values.
    #[inline]
    fn deserialize_fields(&mut self, adapter: &mut dyn Adapter, node: Node) {
        Self::field_registry().deserialize(self, adapter, node);
    }
}

// -----------------------------------------------------------------------------
// Serializable

/// A reflectable type with a fixed [`Format`].
///
/// Implemented by `#[derive(Reflect)]` with `#[reflect(format = ...)]`.
///
/// # Examples
///
/// ```
/// use lz_serial::{Reflect, Serializable, format::Text};
///
/// #[derive(Reflect, Default)]
/// #[reflect(format = Text)]
/// struct Window {
///     title: String,
///     width: u32,
/// }
///
/// let window = Window { title: "main".into(), width: 640 };
/// let mut out = Vec::new();
/// window.serialize(&mut out).unwrap();
/// assert_eq!(out, b"title = \"main\"\nwidth = 640\n");
/// ```
pub trait Serializable: Reflect {
    type Format: Format;

    /// Writes every field into `output`.
    ///
    /// Only failures of `output` itself are reported.
    fn serialize(&self, output: &mut dyn Write) -> Result<(), SerialError> {
        let mut adapter = <Self::Format as Format>::writer(output);
        let root = adapter.root();
        self.serialize_fields(&mut adapter, root);
        adapter.finish_serialization()
    }

    /// Reads every field from `input`.
    ///
    /// Fields missing from `input` keep their values; fields of the wrong
    /// type are reset to their defaults.
    fn deserialize(&mut self, input: &mut dyn Read) {
        let mut adapter = <Self::Format as Format>::reader(input);
        let root = adapter.root();
        self.deserialize_fields(&mut adapter, root);
        adapter.finish_deserialization();
    }
}
