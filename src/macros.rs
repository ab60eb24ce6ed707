//! # Wire-Type Macros
//!
//! Declarative macros for the two scalar kinds the generator cannot emit
//! itself: user-declared enums and gated native PODs. Both expand to
//! implementations of the runtime traits, so schema sources just declare
//! the type and the scanner passes the declaration through verbatim.

/// Declares a fieldless enum whose wire form is its underlying integer.
///
/// ```ignore
/// noserde::scalar_enum! {
///     pub enum Kind: u8 {
///         Int = 0,
///         Real = 1,
///     }
/// }
/// ```
///
/// The expansion adds `#[repr(<int>)]`, derives the usual value traits,
/// implements [`Scalar`](crate::Scalar) by delegating to the underlying
/// integer, and implements `Default` as the first declared variant (the
/// value a zero-filled record decodes to when the first discriminant is 0).
///
/// A wire value that matches no declared discriminant decodes as the first
/// declared variant: scalar reads are infallible by contract, and failing
/// closed to a known variant keeps hostile bytes from manufacturing an
/// out-of-range discriminant.
#[macro_export]
macro_rules! scalar_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $first_variant:ident = $first_value:expr
            $(, $variant:ident = $value:expr)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr($repr)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $first_variant = $first_value,
            $($variant = $value,)*
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                $name::$first_variant
            }
        }

        impl $crate::Scalar for $name {
            const WIRE_SIZE: usize = ::core::mem::size_of::<$repr>();

            fn load_le(bytes: &[u8]) -> Self {
                let raw = <$repr as $crate::Scalar>::load_le(bytes);
                if raw == $first_value {
                    return $name::$first_variant;
                }
                $(
                    if raw == $value {
                        return $name::$variant;
                    }
                )*
                $name::$first_variant
            }

            fn store_le(self, bytes: &mut [u8]) {
                <$repr as $crate::Scalar>::store_le(self as $repr, bytes);
            }
        }
    };
}

/// Declares a gated native POD wire type.
///
/// The type must be `#[repr(C)]`, `Copy`, `Default`, and derive zerocopy's
/// `FromBytes`, `IntoBytes`, and `Immutable`. The expansion implements
/// [`Scalar`](crate::Scalar) (so the type can appear as a record field) and
/// [`Record`](crate::Record) (so `Buffer<T>` and the I/O paths accept it
/// directly), both with the raw in-memory bytes as the wire form.
///
/// Only available on little-endian targets; see [`pod`](crate::pod) for the
/// ABI caveats.
#[cfg(target_endian = "little")]
#[macro_export]
macro_rules! native_pod {
    ($name:ty) => {
        impl $crate::NativePod for $name {}

        impl $crate::Scalar for $name {
            const WIRE_SIZE: usize = ::core::mem::size_of::<$name>();

            fn load_le(bytes: &[u8]) -> Self {
                $crate::pod::read_pod(bytes)
            }

            fn store_le(self, bytes: &mut [u8]) {
                $crate::pod::write_pod(bytes, &self);
            }
        }

        impl $crate::Record for $name {
            const SIZE_BYTES: usize = ::core::mem::size_of::<$name>();
            const SCHEMA_HASH: u64 = $crate::pod::pod_schema_hash(
                ::core::stringify!($name),
                ::core::mem::size_of::<$name>(),
            );

            type Ref<'a> = $crate::PodRef<'a, $name>;
            type Mut<'a> = $crate::PodMut<'a, $name>;
            type Data = $name;

            fn make_ref(bytes: &[u8]) -> Self::Ref<'_> {
                $crate::PodRef::new(bytes)
            }

            fn make_mut(bytes: &mut [u8]) -> Self::Mut<'_> {
                $crate::PodMut::new(bytes)
            }

            fn assign(bytes: &mut [u8], data: &Self::Data) {
                $crate::pod::write_pod(bytes, data);
            }
        }
    };
}
