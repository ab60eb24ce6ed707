//! # Record Trait
//!
//! The seam between generated code and the runtime. For every tagged schema
//! struct, `noserde-gen` emits an implementation of [`Record`] exposing the
//! record's byte size, its 64-bit schema hash, and constructors for the
//! typed views over a record's bytes.
//!
//! ## Views
//!
//! `Ref<'a>` is the shared (read-only) cursor, `Mut<'a>` the exclusive
//! (read-write) one; both are thin wrappers around a byte slice of exactly
//! `SIZE_BYTES` bytes. They never own storage: a view borrows from its
//! [`Buffer`](crate::Buffer), and the borrow checker ends its life before
//! any structural mutation can reallocate the bytes underneath it.
//!
//! ## Data
//!
//! `Data` is the plain value type mirroring the record's fields. Its
//! `Default` carries the schema's declared field defaults, which is how a
//! freshly appended record picks them up: the buffer zero-fills the new
//! slot, then runs `assign` with `Data::default()`.
//!
//! Gated native PODs get this whole surface synthesized by
//! [`native_pod!`](crate::native_pod) instead of the generator.

/// A fixed-layout record type: compile-time layout facts plus view and
/// bulk-assignment constructors over raw record bytes.
pub trait Record {
    /// Exact wire size of one record, no padding.
    const SIZE_BYTES: usize;

    /// Structural fingerprint of the declared schema. Producer and consumer
    /// agree iff their schemas are structurally identical.
    const SCHEMA_HASH: u64;

    /// Shared view over one record's bytes.
    type Ref<'a>: Copy;

    /// Exclusive view over one record's bytes.
    type Mut<'a>;

    /// Plain value type mirroring the fields; `default()` carries the
    /// schema's declared field defaults.
    type Data: Default;

    /// Wraps the first `SIZE_BYTES` bytes of `bytes` in a shared view.
    fn make_ref(bytes: &[u8]) -> Self::Ref<'_>;

    /// Wraps the first `SIZE_BYTES` bytes of `bytes` in an exclusive view.
    fn make_mut(bytes: &mut [u8]) -> Self::Mut<'_>;

    /// Writes every field of `data` into the record bytes. Variant and
    /// union fields zero their payload region before the active
    /// alternative is written, so equal data always produces equal bytes.
    fn assign(bytes: &mut [u8], data: &Self::Data);
}
