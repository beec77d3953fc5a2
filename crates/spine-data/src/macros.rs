//! Accessor generation for derived fields.

/// Generates the read / override / clear / peek quartet for one
/// `Derived<T>` struct field named like its getter.
macro_rules! derived_field {
    (
        $(#[$doc:meta])*
        $get:ident, $set:ident, $clear:ident, $peek:ident: $ty:ty,
        rule = $rule:path,
        source = |$this:ident| $source:expr $(,)?
    ) => {
        $(#[$doc])*
        pub fn $get(&self) -> Result<$ty, spine_core::ObjectError> {
            let $this = self;
            self.$get.resolve(&$rule, $source)
        }

        #[doc = concat!("Store an explicit `", stringify!($get), "`, overriding the computed value.")]
        pub fn $set(&mut self, value: $ty) {
            self.$get.set(value);
        }

        #[doc = concat!("Drop the explicit `", stringify!($get), "` so it is computed again.")]
        pub fn $clear(&mut self) -> Option<$ty> {
            self.$get.clear()
        }

        #[doc = concat!("The explicit `", stringify!($get), "`, if one was stored.")]
        pub fn $peek(&self) -> Option<&$ty> {
            self.$get.explicit()
        }
    };
}
