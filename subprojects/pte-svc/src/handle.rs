//! Handle types.

/// Raw kernel object identifier.
///
/// Valid UIDs are strictly positive. Negative values are reserved for error codes by the
/// kernel ABI and never name an object.
pub type Uid = i32;

/// A UID that never refers to a kernel object.
pub const INVALID_UID: Uid = -1;

/// Internal macro to generate [`Uid`] newtypes with common helpers.
macro_rules! define_handle_type {
    {
        $(#[$meta:meta])* $vis:vis struct $name:ident
    } => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name($crate::Uid);

        impl $name {
            /// Converts a raw UID to a [`$name`].
            ///
            /// The UID is not checked here: a stale or foreign UID makes every kernel call
            /// taking the handle fail with an *invalid handle* error.
            pub const fn from_raw(raw: $crate::Uid) -> Self {
                Self(raw)
            }

            /// Returns `true` if the UID is in the range used for kernel objects.
            pub const fn is_valid(&self) -> bool {
                self.0 > 0
            }

            /// Converts the [`$name`] to a raw UID.
            pub const fn to_raw(&self) -> $crate::Uid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };
}
