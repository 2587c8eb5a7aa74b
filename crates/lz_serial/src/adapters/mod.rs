//! Format adapters.
//!
//! Every adapter implements [`Adapter`](crate::Adapter) over its own node
//! storage and is paired with a [`Format`](crate::Format) marker.
//!
//! - [`text`]: `path = value` lines, written as fields are visited.
//! - [`binary`]: positional little-endian stream without keys.
//! - [`lazy_json`]: JSON tree whose leaves are converted on first access.
//! - `json` / `yaml`: bridges over `serde_json` / `serde_yaml` values.
//! - [`mock`]: in-memory tree that records every write, for tests.
//! - [`tree`]: arena document shared by the bridges and the mock.

pub mod binary;
pub mod lazy_json;
pub mod mock;
pub mod text;
pub mod tree;

crate::cfg::json! {
    pub mod json;
}

crate::cfg::yaml! {
    pub mod yaml;
}
