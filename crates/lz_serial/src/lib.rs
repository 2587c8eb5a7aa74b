#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Compilation config

/// Some macros used for compilation control.
pub mod cfg {
    lz_cfg::define_alias! {
        #[cfg(feature = "json")] => json,
        #[cfg(feature = "yaml")] => yaml,
        #[cfg(feature = "auto_register")] => auto_register,
    }
}

// -----------------------------------------------------------------------------
// Extern Self

// Generated code names this crate `lz_serial` (see `lz_macro_utils::Manifest`),
// which has to resolve inside the crate as well.
extern crate self as lz_serial;

// -----------------------------------------------------------------------------
// Modules

mod error;

pub mod adapters;
pub mod codec;
pub mod document;
pub mod format;
pub mod multi;
pub mod registry;

#[doc(hidden)]
pub mod __macro_exports;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use codec::{Codec, FieldKind, Serde};
pub use document::{Adapter, Node, Primitive, Scalar, ScalarKind};
pub use error::SerialError;
pub use format::Format;
pub use multi::{MultiSerializable, TypeDispatchTable};
pub use registry::{FieldDescriptor, FieldRegistry, Reflect, Serializable};

pub use lz_serial_derive as derive;
pub use lz_serial_derive::{Reflect, impl_auto_register};
