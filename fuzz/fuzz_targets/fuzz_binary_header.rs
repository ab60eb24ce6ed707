//! Fuzz testing for binary header decoding.
//!
//! Arbitrary header bytes must either parse into a consistent header or
//! be rejected; parsing must never panic and accepted headers must
//! round-trip their fields.

#![no_main]

use libfuzzer_sys::fuzz_target;
use noserde::BinaryFileHeader;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = BinaryFileHeader::from_bytes(data) {
        let rebuilt = BinaryFileHeader::new(
            header.schema_hash(),
            header.record_size(),
            header.record_count(),
            header.payload_size(),
        );
        assert_eq!(rebuilt.schema_hash(), header.schema_hash());
        assert_eq!(rebuilt.payload_size(), header.payload_size());
    }
});
