//! Virtual-address types for engine-side objects.
//!
//! Each address type is a newtype wrapper around u64 to provide type safety.
//! Zero is never a live address.

/// Macro to define a virtual-address type.
macro_rules! define_va {
    ($name:ident) => {
        /// Opaque virtual address of an engine-side object.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            _va: u64,
        }

        impl $name {
            /// Create an invalid (null) address.
            #[inline]
            pub const fn invalid() -> Self {
                Self { _va: 0 }
            }

            /// Check if this address is valid (non-zero).
            #[inline]
            pub const fn is_valid(&self) -> bool {
                self._va != 0
            }

            /// Reinterpret a raw address.
            #[inline]
            pub const fn from_raw(va: u64) -> Self {
                Self { _va: va }
            }

            /// The raw address value.
            #[inline]
            pub const fn raw(&self) -> u64 {
                self._va
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

define_va!(GrSystem);
define_va!(GrShape);
define_va!(GrShapeSettings);
define_va!(GrRefCell);
define_va!(GrResult);
define_va!(GrCollector);
define_va!(GrMutex);
define_va!(GrBodyLock);
define_va!(GrStream);
define_va!(GrTempAlloc);
