//! Turn `cfg` predicates into macros.
//!
//! A crate declares its aliases once:
//!
//! ```
//! pub mod cfg {
//!     lz_cfg::define_alias! {
//!         #[cfg(debug_assertions)] => debug,
//!         #[cfg(feature = "never_enabled")] => never,
//!     }
//! }
//!
//! cfg::never! {
//!     compile_error!("removed before expansion");
//! }
//!
//! let checked = cfg::debug! {
//!     if { "checked" } else { "unchecked" }
//! };
//! assert_eq!(checked, if cfg!(debug_assertions) { "checked" } else { "unchecked" });
//! assert!(!cfg::never!());
//! ```
//!
//! Each alias accepts three shapes:
//!
//! - `alias!()`: a `bool` literal.
//! - `alias! { if { .. } else { .. } }`: picks one branch.
//! - `alias! { .. }`: keeps or drops the tokens.
#![no_std]

/// Expansion used by aliases whose predicate holds.
#[doc(hidden)]
#[macro_export]
macro_rules! enabled {
    () => { true };
    (if { $($yes:tt)* } else { $($no:tt)* }) => { $($yes)* };
    ($($tokens:tt)*) => { $($tokens)* };
}

/// Expansion used by aliases whose predicate does not hold.
#[doc(hidden)]
#[macro_export]
macro_rules! disabled {
    () => { false };
    (if { $($yes:tt)* } else { $($no:tt)* }) => { $($no)* };
    ($($tokens:tt)*) => {};
}

/// Define one alias macro per `#[cfg(..)] => name` pair.
///
/// The aliases are `pub use` items, so they are reachable by path
/// (`crate::cfg::name!`) from anywhere in the crate.
#[macro_export]
macro_rules! define_alias {
    ($(#[cfg($meta:meta)] => $alias:ident),* $(,)?) => {
        $(
            #[cfg($meta)]
            #[doc = concat!("Alias of `cfg(", stringify!($meta), ")`, currently enabled.")]
            pub use $crate::enabled as $alias;

            #[cfg(not($meta))]
            #[doc = concat!("Alias of `cfg(", stringify!($meta), ")`, currently disabled.")]
            pub use $crate::disabled as $alias;
        )*
    };
}
