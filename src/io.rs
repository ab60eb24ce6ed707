//! # Binary File I/O
//!
//! A buffer's payload travels as one file with a fixed 40-byte header in
//! front. The header is type-safe via zerocopy: every multi-byte field is a
//! little-endian wrapper type, the struct is `repr(C)` and `Unaligned`, and
//! its size is asserted at compile time.
//!
//! ## File Layout
//!
//! ```text
//! offset size field
//! 0      8    magic = "NSRDBIN1"
//! 8      8    schema_hash (u64 LE)
//! 16     8    record_size (u64 LE)
//! 24     8    record_count (u64 LE)
//! 32     8    payload_size (u64 LE)
//! 40     N    payload bytes; N == payload_size
//! ```
//!
//! The magic carries the format version; a breaking change changes the
//! magic. `schema_hash` and `record_size` guard against reading a file
//! written for a structurally different record type.
//!
//! ## Failure States
//!
//! Errors are the closed [`IoError`] taxonomy. Header-stage failures
//! (`open_failed`, `invalid_header`, `schema_mismatch`) leave the target
//! buffer untouched; once payload decoding has begun, any failure clears
//! it, so a caller never observes a torn payload.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;
use zerocopy::little_endian::U64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::buffer::{Buffer, ByteStore};
use crate::record::Record;

/// Identifies the binary buffer file format, version included.
pub const BINARY_MAGIC: &[u8; 8] = b"NSRDBIN1";

/// Size of the on-disk header in bytes.
pub const BINARY_HEADER_SIZE: usize = 40;

/// Closed error taxonomy for buffer file and payload decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IoError {
    /// The underlying file could not be opened.
    #[error("open_failed")]
    OpenFailed,
    /// A write failed or reported a short write.
    #[error("write_failed")]
    WriteFailed,
    /// A read failed before reaching the expected length.
    #[error("read_failed")]
    ReadFailed,
    /// Magic mismatch, or the declared sizes are internally inconsistent.
    #[error("invalid_header")]
    InvalidHeader,
    /// Schema hash or record size disagrees with the target type.
    #[error("schema_mismatch")]
    SchemaMismatch,
    /// A byte span's length is not a whole number of records.
    #[error("payload_size_mismatch")]
    PayloadSizeMismatch,
    /// Fewer payload bytes were available than the header declared.
    #[error("truncated_payload")]
    TruncatedPayload,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct BinaryFileHeader {
    magic: [u8; 8],
    schema_hash: U64,
    record_size: U64,
    record_count: U64,
    payload_size: U64,
}

const _: () = assert!(std::mem::size_of::<BinaryFileHeader>() == BINARY_HEADER_SIZE);

impl BinaryFileHeader {
    pub fn new(schema_hash: u64, record_size: u64, record_count: u64, payload_size: u64) -> Self {
        Self {
            magic: *BINARY_MAGIC,
            schema_hash: U64::new(schema_hash),
            record_size: U64::new(record_size),
            record_count: U64::new(record_count),
            payload_size: U64::new(payload_size),
        }
    }

    /// Header describing `buffer` as it would be written to disk.
    pub fn for_buffer<T: Record, S: ByteStore>(buffer: &Buffer<T, S>) -> Self {
        Self::new(
            T::SCHEMA_HASH,
            T::SIZE_BYTES as u64,
            buffer.len() as u64,
            buffer.byte_size() as u64,
        )
    }

    /// Parses and magic-checks a header from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self, IoError> {
        if bytes.len() < BINARY_HEADER_SIZE {
            return Err(IoError::InvalidHeader);
        }
        let header = Self::ref_from_bytes(&bytes[..BINARY_HEADER_SIZE])
            .map_err(|_| IoError::InvalidHeader)?;
        if &header.magic != BINARY_MAGIC {
            return Err(IoError::InvalidHeader);
        }
        Ok(header)
    }

    /// Checks the header against record type `T` and its own internal
    /// consistency.
    pub fn validate_for<T: Record>(&self) -> Result<(), IoError> {
        if self.schema_hash() != T::SCHEMA_HASH || self.record_size() != T::SIZE_BYTES as u64 {
            return Err(IoError::SchemaMismatch);
        }
        let expected = self
            .record_size()
            .checked_mul(self.record_count())
            .ok_or(IoError::InvalidHeader)?;
        if self.payload_size() != expected {
            return Err(IoError::InvalidHeader);
        }
        Ok(())
    }

    pub fn schema_hash(&self) -> u64 {
        self.schema_hash.get()
    }

    pub fn record_size(&self) -> u64 {
        self.record_size.get()
    }

    pub fn record_count(&self) -> u64 {
        self.record_count.get()
    }

    pub fn payload_size(&self) -> u64 {
        self.payload_size.get()
    }
}

/// Writes `buffer` to `path`: header first, then the payload page by page.
pub fn write_binary<T: Record, S: ByteStore>(
    path: impl AsRef<Path>,
    buffer: &Buffer<T, S>,
) -> Result<(), IoError> {
    let mut file = File::create(path).map_err(|_| IoError::OpenFailed)?;

    let header = BinaryFileHeader::for_buffer(buffer);
    file.write_all(header.as_bytes())
        .map_err(|_| IoError::WriteFailed)?;

    let mut offset = 0;
    while offset < buffer.byte_size() {
        let chunk = buffer.payload_chunk(offset);
        file.write_all(chunk).map_err(|_| IoError::WriteFailed)?;
        offset += chunk.len();
    }
    Ok(())
}

/// Reads a buffer file from `path` into `buffer`.
///
/// The header's magic, schema hash, record size, and size arithmetic are
/// all verified before the payload is touched. Payload decoding failures
/// leave `buffer` empty.
pub fn read_binary<T: Record, S: ByteStore>(
    path: impl AsRef<Path>,
    buffer: &mut Buffer<T, S>,
) -> Result<(), IoError> {
    let mut file = File::open(path).map_err(|_| IoError::OpenFailed)?;

    let mut header_bytes = [0u8; BINARY_HEADER_SIZE];
    file.read_exact(&mut header_bytes)
        .map_err(|_| IoError::ReadFailed)?;

    let header = BinaryFileHeader::from_bytes(&header_bytes)?;
    header.validate_for::<T>()?;

    let payload_size = header.payload_size() as usize;
    buffer.read_payload_from(&mut file, payload_size)
}
