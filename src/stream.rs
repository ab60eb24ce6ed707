//! # Stream Framing
//!
//! serde integration for [`Buffer`]. A buffer serializes as a
//! self-describing frame:
//!
//! ```text
//! schema_hash  u64
//! record_size  u64
//! payload      length-prefixed raw bytes (byte_size() bytes)
//! ```
//!
//! With a compact binary format (bincode with fixed-width integers) the
//! frame is exactly the two guard words followed by the format's
//! length-prefixed byte blob, so the schema hash occupies the first eight
//! bytes of the encoding.
//!
//! ## Decoding rules
//!
//! Deserialization validates, in order:
//!
//! 1. `schema_hash` and `record_size` must match the target type, else the
//!    frame was produced by a structurally different schema;
//! 2. the payload length must not exceed [`MAX_STREAM_PAYLOAD_BYTES`];
//! 3. the payload length must be a whole number of records.
//!
//! Any violation is reported to the format as an invalid-data error. When
//! decoding in place (see [`decode_frame_into`]), the target is cleared
//! before decoding starts, so a failed decode always leaves it empty.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::buffer::{Buffer, ByteStore};
use crate::record::Record;

/// Upper bound on a framed payload, mirroring the size-prefix limit of the
/// framing format.
pub const MAX_STREAM_PAYLOAD_BYTES: usize = 0x3FFF_FFFF;

const FRAME_FIELDS: &[&str] = &["schema_hash", "record_size", "payload"];

struct PayloadBytes<'a>(&'a [u8]);

impl Serialize for PayloadBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

struct PayloadBuf(Vec<u8>);

impl<'de> Deserialize<'de> for PayloadBuf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = PayloadBuf;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a length-prefixed payload byte blob")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(PayloadBuf(v.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(PayloadBuf(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    out.push(byte);
                }
                Ok(PayloadBuf(out))
            }
        }

        deserializer.deserialize_byte_buf(BytesVisitor)
    }
}

impl<T: Record, S: ByteStore> Serialize for Buffer<T, S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let payload = self.bytes();
        let mut frame = serializer.serialize_struct("Buffer", 3)?;
        frame.serialize_field("schema_hash", &T::SCHEMA_HASH)?;
        frame.serialize_field("record_size", &(T::SIZE_BYTES as u64))?;
        frame.serialize_field("payload", &PayloadBytes(&payload))?;
        frame.end()
    }
}

struct BufferVisitor<T: Record, S: ByteStore> {
    _buffer: PhantomData<fn() -> Buffer<T, S>>,
}

impl<'de, T: Record, S: ByteStore> Visitor<'de> for BufferVisitor<T, S> {
    type Value = Buffer<T, S>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a noserde buffer frame (schema_hash, record_size, payload)")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let schema_hash: u64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let record_size: u64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;

        if schema_hash != T::SCHEMA_HASH || record_size != T::SIZE_BYTES as u64 {
            return Err(de::Error::custom(
                "buffer frame does not match the target record schema",
            ));
        }

        let payload: PayloadBuf = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;
        let payload = payload.0;

        if payload.len() > MAX_STREAM_PAYLOAD_BYTES {
            return Err(de::Error::custom("buffer payload exceeds the frame limit"));
        }

        let mut buffer = Buffer::new();
        buffer
            .assign_bytes(&payload)
            .map_err(|_| de::Error::custom("buffer payload is not a whole number of records"))?;
        Ok(buffer)
    }
}

impl<'de, T: Record, S: ByteStore> Deserialize<'de> for Buffer<T, S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_struct(
            "Buffer",
            FRAME_FIELDS,
            BufferVisitor {
                _buffer: PhantomData,
            },
        )
    }

    fn deserialize_in_place<D: Deserializer<'de>>(
        deserializer: D,
        place: &mut Self,
    ) -> Result<(), D::Error> {
        // Clear first: a failed decode must leave the target empty, never
        // holding the previous payload.
        place.clear();
        *place = Self::deserialize(deserializer)?;
        Ok(())
    }
}

/// Decodes a buffer frame into an existing buffer.
///
/// Thin wrapper over `Deserialize::deserialize_in_place` that makes the
/// clear-on-failure contract reachable without naming the trait method:
/// after an error, `target` is empty.
pub fn decode_frame_into<'de, D, T, S>(
    deserializer: D,
    target: &mut Buffer<T, S>,
) -> Result<(), D::Error>
where
    D: Deserializer<'de>,
    T: Record,
    S: ByteStore,
{
    Deserialize::deserialize_in_place(deserializer, target)
}
