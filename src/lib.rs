//! # noserde - Schema-Driven Fixed-Layout Records
//!
//! noserde turns a small declarative schema into strongly typed views over a
//! dense, canonical little-endian byte image, plus a runtime container that
//! stores many records as one flat payload with near-zero-copy bulk I/O.
//!
//! There is no per-record serialization step: a record *is* its bytes. Views
//! read and write fields in place, and moving a whole buffer in or out of a
//! file or stream is a header check followed by a payload copy.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Generator CLI (noserde-gen)                 │   build time
//! │  scan -> schema AST -> emitted Rust source   │
//! ├──────────────────────────────────────────────┤
//! │  Generated views (XRef / XMut / XData)       │
//! ├──────────────────────────────────────────────┤
//! │  Record trait (size, schema hash, views)     │
//! ├──────────────────────────────────────────────┤
//! │  Buffer<T, S> (segmented / contiguous bytes) │   run time
//! ├──────────────────────────────────────────────┤
//! │  Binary file I/O  │  serde stream framing    │
//! ├──────────────────────────────────────────────┤
//! │  Endian codec (Scalar: load_le / store_le)   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The generator and the runtime meet only through the [`Record`] trait:
//! emitted source implements it, and everything in the runtime is generic
//! over it.
//!
//! ## Wire model
//!
//! - Scalars are stored little-endian at fixed offsets, no padding.
//! - Tagged variants are a 4-byte discriminant followed by a payload region
//!   sized to the largest alternative; unused payload bytes are zero.
//! - Untagged unions are the payload region alone; the caller tracks the
//!   live alternative.
//! - A `Buffer<T>` holds `len()` records back to back, so
//!   `byte_size() == len() * T::SIZE_BYTES` always.
//!
//! Identical logical values produce bitwise identical records on every
//! supported host, which is what makes the bulk payload copy sound.
//!
//! ## Schema identity
//!
//! Every record type carries a 64-bit schema hash derived from its field
//! names, kinds, and order. File and stream decoding verify the hash and the
//! record size before touching the payload; a mismatch fails closed and
//! leaves the target buffer empty.
//!
//! ## Quick start
//!
//! ```ignore
//! // schema.rs (input to noserde-gen)
//! #[noserde]
//! struct Point {
//!     x: i32,
//!     y: i32 = 7,
//! }
//! ```
//!
//! ```ignore
//! let mut points: noserde::Buffer<Point> = noserde::Buffer::new();
//! let mut p = points.push_default();
//! p.set_x(3);                       // y keeps its declared default
//! noserde::write_binary("points.bin", &points)?;
//! ```
//!
//! ## Module Overview
//!
//! - [`codec`]: the [`Scalar`] trait and little-endian load/store helpers
//! - [`record`]: the [`Record`] trait generated code implements
//! - [`pod`]: gated native POD fast path (little-endian hosts only)
//! - [`buffer`]: [`Buffer`] over segmented or contiguous byte storage
//! - [`io`]: magic-and-schema-guarded binary file format
//! - [`stream`]: serde integration with framed payloads
//! - [`gen`]: the schema scanner, AST, and Rust source emitter

mod macros;

pub mod buffer;
pub mod codec;
pub mod gen;
pub mod io;
#[cfg(target_endian = "little")]
pub mod pod;
pub mod record;
pub mod stream;

pub use buffer::{Buffer, ByteStore, Contiguous, Segmented, DEFAULT_RECORDS_PER_PAGE};
pub use codec::{max_wire, read_scalar, write_scalar, Scalar};
pub use io::{read_binary, write_binary, BinaryFileHeader, IoError, BINARY_HEADER_SIZE, BINARY_MAGIC};
#[cfg(target_endian = "little")]
pub use pod::{NativePod, PodMut, PodRef};
pub use record::Record;
pub use stream::{decode_frame_into, MAX_STREAM_PAYLOAD_BYTES};
