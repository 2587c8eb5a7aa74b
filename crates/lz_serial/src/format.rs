//! Wire format markers.
//!
//! A [`Format`] is a zero-sized type naming one wire format. It knows how to
//! open an [`Adapter`] over a stream and owns that format's
//! [`TypeDispatchTable`] for the runtime multi-format variant.
//!
//! | Marker | Adapter |
//! |--------|---------|
//! | [`Text`] | [`TextAdapter`](crate::adapters::text::TextAdapter) |
//! | [`Binary`] | [`BinaryAdapter`](crate::adapters::binary::BinaryAdapter) |
//! | [`LazyJson`] | [`LazyJsonAdapter`](crate::adapters::lazy_json::LazyJsonAdapter) |
//! | `Json` (feature `json`) | `JsonAdapter` |
//! | `Yaml` (feature `yaml`) | `YamlAdapter` |
//! | [`Mock`] | [`MockAdapter`](crate::adapters::mock::MockAdapter) |

use std::io::{Read, Write};

use crate::document::Adapter;
use crate::multi::TypeDispatchTable;

pub use crate::adapters::binary::Binary;
pub use crate::adapters::lazy_json::LazyJson;
pub use crate::adapters::mock::Mock;
pub use crate::adapters::text::Text;

crate::cfg::json! {
    pub use crate::adapters::json::Json;
}

crate::cfg::yaml! {
    pub use crate::adapters::yaml::Yaml;
}

/// A wire format.
///
/// # Examples
///
/// ```
/// use lz_serial::{Adapter, Format, format::Text};
///
/// let mut out = Vec::new();
/// {
///     let mut writer = Text::writer(&mut out);
///     let adapter: &mut dyn Adapter = &mut writer;
///     let root = adapter.root();
///     let node = adapter.add_child(root, "answer");
///     adapter.set_value(node, &42_i32);
///     adapter.finish_serialization().unwrap();
/// }
/// assert_eq!(out, b"answer = 42\n");
/// ```
pub trait Format: Send + Sync + 'static {
    /// Human readable name, used in logs.
    const NAME: &'static str;

    type Adapter<'a>: Adapter + 'a;

    /// Opens `input` for reading.
    ///
    /// Formats that need the whole document read it here; failures leave an
    /// empty document behind.
    fn reader<'a>(input: &'a mut dyn Read) -> Self::Adapter<'a>;

    /// Opens `output` for writing.
    fn writer<'a>(output: &'a mut dyn Write) -> Self::Adapter<'a>;

    /// Process-wide dispatch table of this format.
    fn dispatch_table() -> &'static TypeDispatchTable;
}
