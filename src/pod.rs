//! # Gated Native POD Fast Path
//!
//! A caller-declared trivially-copyable type can opt into being a wire type
//! whose encoded form is its raw in-memory bytes. This is a deliberate ABI
//! coupling: producer and consumer must be built by the same toolchain with
//! the same type definition, and the whole module only exists on
//! little-endian targets (`#[cfg(target_endian = "little")]`), so a
//! big-endian build of POD-using code fails to compile.
//!
//! ## Opting in
//!
//! ```ignore
//! use zerocopy::{FromBytes, Immutable, IntoBytes};
//!
//! #[repr(C)]
//! #[derive(Clone, Copy, Default, FromBytes, IntoBytes, Immutable)]
//! struct Vec3 {
//!     x: f32,
//!     y: f32,
//!     z: f32,
//! }
//!
//! noserde::native_pod!(Vec3);
//! ```
//!
//! The macro synthesizes the full [`Record`](crate::Record) surface:
//! `SIZE_BYTES` is `size_of::<T>()`, views are the copying [`PodRef`] /
//! [`PodMut`] below, and the schema hash mixes the type's declared name
//! with its size.
//!
//! ## Safety model
//!
//! Records are packed back to back in a buffer, so a POD's offset is not
//! necessarily aligned for the type. The views therefore never hand out
//! `&T` into the payload; they copy through zerocopy's `read_from_bytes`
//! and `write_to`, which are defined for unaligned byte slices.

use core::marker::PhantomData;

use zerocopy::{FromBytes, Immutable, IntoBytes};

/// Marker for caller-declared trivially-copyable wire types.
///
/// The zerocopy bounds are what make the raw-byte wire form sound;
/// `Default` is required so a POD buffer can append zero-initialized
/// records the same way generated records do.
pub trait NativePod: FromBytes + IntoBytes + Immutable + Copy + Default {}

/// Copies a POD out of the front of `bytes`. Panics if the slice is
/// shorter than `size_of::<T>()`.
#[inline]
pub fn read_pod<T: NativePod>(bytes: &[u8]) -> T {
    let raw = &bytes[..core::mem::size_of::<T>()];
    match T::read_from_bytes(raw) {
        Ok(value) => value,
        // The slice above is exactly size_of::<T>() long.
        Err(_) => unreachable!(),
    }
}

/// Copies a POD into the front of `bytes`. Panics if the slice is
/// shorter than `size_of::<T>()`.
#[inline]
pub fn write_pod<T: NativePod>(bytes: &mut [u8], value: &T) {
    let raw = &mut bytes[..core::mem::size_of::<T>()];
    match value.write_to(raw) {
        Ok(()) => {}
        // The slice above is exactly size_of::<T>() long.
        Err(_) => unreachable!(),
    }
}

/// Schema hash for a native POD: FNV-1a over a stable textual signature,
/// mixed with the type's size.
///
/// `native_pod!` passes the type's spelled name as the signature. The hash
/// only distinguishes types by name and size, which is the documented
/// limit of the POD fast path: layout changes that keep both are invisible
/// to the guardrail.
pub const fn pod_schema_hash(signature: &str, size: usize) -> u64 {
    let hash = fnv1a64(signature.as_bytes()) ^ size as u64;
    hash.wrapping_mul(0x0000_0100_0000_01b3)
}

const fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        i += 1;
    }
    hash
}

/// Shared view over one POD record inside a buffer.
#[derive(Debug, Clone, Copy)]
pub struct PodRef<'a, T: NativePod> {
    bytes: &'a [u8],
    _pod: PhantomData<T>,
}

impl<'a, T: NativePod> PodRef<'a, T> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: &bytes[..core::mem::size_of::<T>()],
            _pod: PhantomData,
        }
    }

    pub fn get(&self) -> T {
        read_pod(self.bytes)
    }
}

/// Exclusive view over one POD record inside a buffer.
#[derive(Debug)]
pub struct PodMut<'a, T: NativePod> {
    bytes: &'a mut [u8],
    _pod: PhantomData<T>,
}

impl<'a, T: NativePod> PodMut<'a, T> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        let size = core::mem::size_of::<T>();
        Self {
            bytes: &mut bytes[..size],
            _pod: PhantomData,
        }
    }

    pub fn get(&self) -> T {
        read_pod(self.bytes)
    }

    pub fn set(&mut self, value: T) {
        write_pod(self.bytes, &value);
    }
}
