//! Containers shared by the `lz_*` crates.
//!
//! - [`hash`]: `hashbrown` containers with a fixed-seed `foldhash` state.
//! - [`TypeIdMap`]: a map keyed by [`TypeId`](core::any::TypeId) that skips hashing.
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod typeid_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use typeid_map::TypeIdMap;
