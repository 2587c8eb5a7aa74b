//! Items referenced by code generated in `lz_serial_derive`.

crate::cfg::auto_register! {
    pub mod auto_register {
        pub use inventory;

        /// One `#[reflect(auto_register)]` type, as its registration function.
        pub struct __AutoRegisterFunc(pub fn());

        inventory::collect!(__AutoRegisterFunc);

        /// Registered alongside user types; present after a run only if
        /// static registration works on this platform.
        pub struct __AvailFlag;

        inventory::submit! {
            __AutoRegisterFunc(crate::multi::mark_registered::<__AvailFlag>)
        }

        pub fn __register_types() {
            for func in inventory::iter::<__AutoRegisterFunc> {
                (func.0)();
            }
        }
    }
}
