//! Runtime multi-format serialization.
//!
//! [`Serializable`](crate::Serializable) binds a type to one [`Format`] when
//! it is declared. [`MultiSerializable`] picks the format per call instead:
//! each field is routed through the [`TypeDispatchTable`] of the chosen
//! format, keyed by the field's [`TypeId`].
//!
//! ## Menu
//!
//! - [`TypeDispatchTable`]: the per-format map from field type to codec functions.
//! - [`register_type`] / [`register_type_with_all_formats`]: fill the tables.
//! - [`MultiSerializable`]: `serialize_as::<F>` / `deserialize_as::<F>`.
//! - [`ensure_registered`]: one-time registration of a type's field types.
//! - [`auto_register`]: registers every `#[reflect(auto_register)]` type.
//!
//! Field types missing from a table are skipped without error; the skip
//! is reported through `tracing` at `debug` level.

use core::any::{Any, TypeId};
use core::fmt;
use std::io::{Read, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lz_utils::TypeIdMap;

use crate::SerialError;
use crate::codec::Codec;
use crate::document::{Adapter, Node};
use crate::format::{Binary, Format, LazyJson, Mock, Text};
use crate::registry::Reflect;

// -----------------------------------------------------------------------------
// DispatchEntry

type EncodeFn = fn(&dyn Any, &mut dyn Adapter, Node, &str);
type DecodeFn = fn(&mut dyn Any, &mut dyn Adapter, Node, &str);

/// Type-erased codec functions of one registered type.
#[derive(Copy, Clone)]
struct DispatchEntry {
    encode: EncodeFn,
    decode: DecodeFn,
}

impl DispatchEntry {
    fn of<T: Codec>() -> Self {
        fn encode<T: Codec>(value: &dyn Any, adapter: &mut dyn Adapter, node: Node, key: &str) {
            match value.downcast_ref::<T>() {
                Some(value) => value.encode(adapter, node, key),
                None => mismatch::<T>(),
            }
        }

        fn decode<T: Codec>(value: &mut dyn Any, adapter: &mut dyn Adapter, node: Node, key: &str) {
            match value.downcast_mut::<T>() {
                Some(value) => value.decode(adapter, node, key),
                None => mismatch::<T>(),
            }
        }

        Self {
            encode: encode::<T>,
            decode: decode::<T>,
        }
    }
}

#[cold]
#[inline(never)]
fn mismatch<T>() -> ! {
    panic!(
        "dispatch entry of `{}` called with a value of another type",
        core::any::type_name::<T>()
    )
}

// -----------------------------------------------------------------------------
// TypeDispatchTable

/// Map from field type to its codec functions, one per [`Format`].
///
/// Entries are only ever added. Registering a type twice keeps the first
/// entry. Lookups copy the entry out, so the lock is never held while a
/// codec runs and nested values may dispatch through the same table.
///
/// # Examples
///
/// ```
/// use lz_serial::{Adapter, TypeDispatchTable, adapters::mock::MockAdapter};
///
/// static TABLE: TypeDispatchTable = TypeDispatchTable::new("example");
///
/// assert!(TABLE.register::<u32>());
/// assert!(!TABLE.register::<u32>());
///
/// let mut mock = MockAdapter::new();
/// let root = mock.root();
/// assert!(TABLE.serialize(&7_u32, &mut mock, root, "n"));
/// assert!(!TABLE.serialize(&7_i8, &mut mock, root, "m"));
/// assert!(mock.has_operation("setValue", "n=7"));
/// ```
pub struct TypeDispatchTable {
    format: &'static str,
    entries: Mutex<TypeIdMap<DispatchEntry>>,
}

impl TypeDispatchTable {
    #[inline]
    pub const fn new(format: &'static str) -> Self {
        Self {
            format,
            entries: Mutex::new(TypeIdMap::new()),
        }
    }

    /// Name of the format this table belongs to.
    #[inline]
    pub fn format(&self) -> &'static str {
        self.format
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, TypeIdMap<DispatchEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `T`. Returns `false` if it was already present.
    pub fn register<T: Codec>(&self) -> bool {
        let inserted = self.lock().try_insert_type::<T>(DispatchEntry::of::<T>);
        if inserted {
            tracing::trace!(
                target: "lz_serial::multi",
                format = self.format,
                ty = core::any::type_name::<T>(),
                "dispatch entry registered"
            );
        }
        inserted
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.lock().contains(&type_id)
    }

    #[inline]
    pub fn contains_type<T: 'static>(&self) -> bool {
        self.lock().contains_type::<T>()
    }

    /// Number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn entry(&self, type_id: TypeId) -> Option<DispatchEntry> {
        self.lock().get(&type_id).copied()
    }

    /// Writes `value` as the child `key` of `node` with the codec registered
    /// for its concrete type.
    ///
    /// Returns `false` and writes nothing when the type is not registered.
    pub fn serialize(&self, value: &dyn Any, adapter: &mut dyn Adapter, node: Node, key: &str) -> bool {
        match self.entry(Any::type_id(value)) {
            Some(entry) => {
                (entry.encode)(value, adapter, node, key);
                true
            }
            None => {
                self.unregistered(key);
                false
            }
        }
    }

    /// Reads the child `key` of `node` into `value` with the codec
    /// registered for its concrete type.
    ///
    /// Returns `false` and leaves `value` untouched when the type is not registered.
    pub fn deserialize(
        &self,
        value: &mut dyn Any,
        adapter: &mut dyn Adapter,
        node: Node,
        key: &str,
    ) -> bool {
        match self.entry(Any::type_id(&*value)) {
            Some(entry) => {
                (entry.decode)(value, adapter, node, key);
                true
            }
            None => {
                self.unregistered(key);
                false
            }
        }
    }

    fn unregistered(&self, key: &str) {
        tracing::debug!(
            target: "lz_serial::multi",
            format = self.format,
            key,
            "field type has no dispatch entry, skipped"
        );
    }
}

impl fmt::Debug for TypeDispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDispatchTable")
            .field("format", &self.format)
            .field("len", &self.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Registration

/// Adds `T` to the table of `F`. Returns `false` if it was already present.
#[inline]
pub fn register_type<F: Format, T: Codec>() -> bool {
    F::dispatch_table().register::<T>()
}

/// Adds `T` to the table of every built-in format.
pub fn register_type_with_all_formats<T: Codec>() {
    register_type::<Text, T>();
    register_type::<Binary, T>();
    register_type::<LazyJson, T>();
    register_type::<Mock, T>();
    crate::cfg::json! {
        register_type::<crate::format::Json, T>();
    }
    crate::cfg::yaml! {
        register_type::<crate::format::Yaml, T>();
    }
}

static REGISTERED: Mutex<TypeIdMap<()>> = Mutex::new(TypeIdMap::new());

/// Runs [`MultiSerializable::register_field_types`] of `T` once per process.
///
/// Called by every `serialize_as` and `deserialize_as`; calling it up front
/// only moves the one-time cost. The registered-type lock is released while
/// `register_field_types` runs, so it may call `ensure_registered` for nested
/// types. Racing first calls may both register, which table registration
/// tolerates.
pub fn ensure_registered<T: MultiSerializable>() {
    if is_registered::<T>() {
        return;
    }
    T::register_field_types();
    let inserted = REGISTERED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .try_insert_type::<T>(|| ());
    if inserted {
        tracing::debug!(
            target: "lz_serial::multi",
            ty = core::any::type_name::<T>(),
            "field types registered"
        );
    }
}

#[cfg_attr(not(feature = "auto_register"), expect(dead_code, reason = "only used by auto_register"))]
pub(crate) fn mark_registered<T: 'static>() {
    REGISTERED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .try_insert_type::<T>(|| ());
}

/// Whether [`ensure_registered`] already ran for `T`.
pub fn is_registered<T: 'static>() -> bool {
    REGISTERED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_type::<T>()
}

/// Registers every non-generic type declared with `#[reflect(auto_register)]`
/// or [`impl_auto_register!`](crate::impl_auto_register).
///
/// Repeated calls are cheap.
///
/// Returns `true` if static registration works on the current platform.
/// Always `false` when the `auto_register` feature is disabled.
#[cfg_attr(not(feature = "auto_register"), inline(always))]
pub fn auto_register() -> bool {
    crate::cfg::auto_register! {
        if {
            use crate::__macro_exports::auto_register;
            if is_registered::<auto_register::__AvailFlag>() {
                return true;
            }
            auto_register::__register_types();
            is_registered::<auto_register::__AvailFlag>()
        } else {
            false
        }
    }
}

// -----------------------------------------------------------------------------
// MultiSerializable

/// A reflectable type serialized in a format chosen per call.
///
/// Implemented by `#[derive(Reflect)]` with `#[reflect(multi)]`.
///
/// # Examples
///
/// ```
/// use lz_serial::{MultiSerializable, Reflect, format::{Binary, Text}};
///
/// #[derive(Reflect, Default, Debug, PartialEq)]
/// #[reflect(multi)]
/// struct Score {
///     player: String,
///     points: i64,
/// }
///
/// let score = Score { player: "ana".into(), points: 12 };
///
/// let mut text = Vec::new();
/// score.serialize_as::<Text>(&mut text).unwrap();
/// assert_eq!(text, b"player = \"ana\"\npoints = 12\n");
///
/// let mut binary = Vec::new();
/// score.serialize_as::<Binary>(&mut binary).unwrap();
/// let mut read = Score::default();
/// read.deserialize_as::<Binary>(&mut binary.as_slice());
/// assert_eq!(read, score);
/// ```
pub trait MultiSerializable: Reflect {
    /// Adds every field type, and `Self`, to the dispatch tables.
    ///
    /// May call [`ensure_registered`] for nested types.
    fn register_field_types() {}

    /// Writes every field into `output` as `F`.
    fn serialize_as<F: Format>(&self, output: &mut dyn Write) -> Result<(), SerialError> {
        ensure_registered::<Self>();
        let table = F::dispatch_table();
        let mut adapter = F::writer(output);
        let root = adapter.root();
        for field in Self::field_registry() {
            let value: &dyn Any = field.value(self);
            table.serialize(value, &mut adapter, root, field.name());
        }
        adapter.finish_serialization()
    }

    /// Reads every field from `input` as `F`.
    ///
    /// Same recovery rules as [`Serializable::deserialize`](crate::Serializable::deserialize).
    fn deserialize_as<F: Format>(&mut self, input: &mut dyn Read) {
        ensure_registered::<Self>();
        let table = F::dispatch_table();
        let mut adapter = F::reader(input);
        let root = adapter.root();
        for field in Self::field_registry() {
            let value: &mut dyn Any = field.value_mut(self);
            table.deserialize(value, &mut adapter, root, field.name());
        }
        adapter.finish_deserialization();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockAdapter;
    use crate::registry::{FieldDescriptor, FieldRegistry, RegistryCell};

    #[derive(Default, Debug, PartialEq)]
    struct Reading {
        sensor: String,
        samples: Vec<f32>,
    }

    impl Reflect for Reading {
        fn field_registry() -> &'static FieldRegistry<Self> {
            static CELL: RegistryCell<Reading> = RegistryCell::new();
            CELL.get_or_init(|| {
                FieldRegistry::new(vec![
                    FieldDescriptor::<Self>::new::<String>("sensor", |r| &r.sensor, |r| &mut r.sensor),
                    FieldDescriptor::<Self>::new::<Vec<f32>>("samples", |r| &r.samples, |r| &mut r.samples),
                ])
            })
        }
    }

    impl MultiSerializable for Reading {
        fn register_field_types() {
            register_type_with_all_formats::<String>();
            register_type_with_all_formats::<Vec<f32>>();
        }
    }

    // Never registered anywhere.
    #[derive(Default, Debug, PartialEq)]
    struct Orphan {
        id: u16,
    }

    impl Reflect for Orphan {
        fn field_registry() -> &'static FieldRegistry<Self> {
            static CELL: RegistryCell<Orphan> = RegistryCell::new();
            CELL.get_or_init(|| {
                FieldRegistry::new(vec![FieldDescriptor::<Self>::new::<u16>(
                    "id",
                    |o| &o.id,
                    |o| &mut o.id,
                )])
            })
        }
    }

    impl MultiSerializable for Orphan {}

    // Registers another type from inside its own registration.
    #[derive(Default)]
    struct Station {
        channel: u8,
    }

    impl Reflect for Station {
        fn field_registry() -> &'static FieldRegistry<Self> {
            static CELL: RegistryCell<Station> = RegistryCell::new();
            CELL.get_or_init(|| {
                FieldRegistry::new(vec![FieldDescriptor::<Self>::new::<u8>(
                    "channel",
                    |s| &s.channel,
                    |s| &mut s.channel,
                )])
            })
        }
    }

    impl MultiSerializable for Station {
        fn register_field_types() {
            ensure_registered::<Reading>();
            register_type_with_all_formats::<u8>();
        }
    }

    fn sample() -> Reading {
        Reading {
            sensor: "t-01".into(),
            samples: vec![20.5, 21.0],
        }
    }

    #[test]
    fn registration_is_idempotent() {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new("test");
        assert!(TABLE.is_empty());
        assert!(TABLE.register::<i32>());
        assert!(!TABLE.register::<i32>());
        assert!(TABLE.register::<Vec<i32>>());
        assert_eq!(TABLE.len(), 2);
        assert!(TABLE.contains(TypeId::of::<i32>()));
        assert!(TABLE.contains_type::<Vec<i32>>());
        assert!(!TABLE.contains_type::<u32>());
        assert_eq!(TABLE.format(), "test");
    }

    #[test]
    fn nested_registration_does_not_block() {
        ensure_registered::<Station>();
        assert!(is_registered::<Station>());
        assert!(is_registered::<Reading>());
        assert!(Text::dispatch_table().contains_type::<Vec<f32>>());
        assert!(Binary::dispatch_table().contains_type::<u8>());

        let mut out = Vec::new();
        Station { channel: 4 }.serialize_as::<Text>(&mut out).unwrap();
        assert_eq!(out, b"channel = 4\n");
    }

    #[test]
    fn concurrent_registration_keeps_one_entry() {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new("threads");
        let inserted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| TABLE.register::<u64>()))
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });
        assert_eq!(inserted, 1);
        assert_eq!(TABLE.len(), 1);
    }

    #[test]
    fn unregistered_type_is_a_no_op() {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new("empty");
        let mut mock = MockAdapter::new();
        let root = mock.root();
        assert!(!TABLE.serialize(&5_i32, &mut mock, root, "n"));
        assert!(mock.operations().is_empty());

        let mut value = 9_i32;
        assert!(!TABLE.deserialize(&mut value, &mut mock, root, "n"));
        assert_eq!(value, 9);
    }

    #[test]
    fn dispatches_by_concrete_type() {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new("dispatch");
        TABLE.register::<String>();
        TABLE.register::<Vec<f32>>();

        let mut mock = MockAdapter::new();
        let root = mock.root();
        let source = sample();
        assert!(TABLE.serialize(&source.sensor, &mut mock, root, "sensor"));
        assert!(TABLE.serialize(&source.samples, &mut mock, root, "samples"));
        assert!(mock.has_operation("setValue", "sensor=t-01"));
        assert!(mock.has_operation("setArray", "samples[2]"));

        let mut read = Reading::default();
        assert!(TABLE.deserialize(&mut read.sensor, &mut mock, root, "sensor"));
        assert!(TABLE.deserialize(&mut read.samples, &mut mock, root, "samples"));
        assert_eq!(read, source);
    }

    #[test]
    fn serialize_as_each_format() {
        let source = sample();

        let mut text = Vec::new();
        source.serialize_as::<Text>(&mut text).unwrap();
        assert_eq!(
            String::from_utf8(text.clone()).unwrap(),
            "sensor = \"t-01\"\nsamples.count = 2\nsamples.0 = 20.5\nsamples.1 = 21\n"
        );

        let mut read = Reading::default();
        read.deserialize_as::<Text>(&mut text.as_slice());
        assert_eq!(read, source);

        let mut binary = Vec::new();
        source.serialize_as::<Binary>(&mut binary).unwrap();
        let mut read = Reading::default();
        read.deserialize_as::<Binary>(&mut binary.as_slice());
        assert_eq!(read, source);

        let mut json = Vec::new();
        source.serialize_as::<LazyJson>(&mut json).unwrap();
        let mut read = Reading::default();
        read.deserialize_as::<LazyJson>(&mut json.as_slice());
        assert_eq!(read, source);

        let mut mock = Vec::new();
        source.serialize_as::<Mock>(&mut mock).unwrap();
        assert_eq!(mock, b"mock_output");
        assert!(is_registered::<Reading>());
    }

    #[test]
    fn unregistered_fields_are_skipped() {
        let mut out = Vec::new();
        Orphan { id: 3 }.serialize_as::<Text>(&mut out).unwrap();
        assert!(out.is_empty());

        let mut read = Orphan { id: 8 };
        read.deserialize_as::<Text>(&mut "id = 4\n".as_bytes());
        assert_eq!(read.id, 8);
    }
}
