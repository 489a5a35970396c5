//! Convenience macros for module development.

/// Exports dependency tables from a loadable module.
///
/// Each relation becomes a null-terminated `const char *[]` symbol with the
/// relation's name. Relations that are not listed are simply not exported.
///
/// # Example
/// ```rust,ignore
/// vlock_plugin::declare_dependencies! {
///     requires: ["all"];
///     succeeds: ["new"];
/// }
/// ```
#[macro_export]
macro_rules! declare_dependencies {
    ($($kind:ident: [$($name:literal),* $(,)?]);* $(;)?) => {
        $(
            $crate::declare_dependencies!(@relation $kind);
            $crate::declare_dependencies!(@table $kind [$($name),*]);
        )*
    };
    (@relation succeeds) => {};
    (@relation precedes) => {};
    (@relation requires) => {};
    (@relation needs) => {};
    (@relation depends) => {};
    (@relation conflicts) => {};
    (@table $kind:ident [$($name:literal),*]) => {
        #[allow(non_upper_case_globals)]
        #[unsafe(no_mangle)]
        pub static $kind: $crate::ffi::abi::DependencyTable<{ <[&str]>::len(&[$($name),*]) + 1 }> =
            $crate::ffi::abi::DependencyTable::new([
                $(::core::concat!($name, "\0").as_ptr().cast::<::core::ffi::c_char>(),)*
                ::core::ptr::null(),
            ]);
    };
}
