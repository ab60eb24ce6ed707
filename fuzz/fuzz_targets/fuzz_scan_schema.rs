//! Fuzz testing for the schema scanner.
//!
//! The scanner must reject malformed input with a ParseError, never a
//! panic, and accepted input must survive rendering.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(blocks) = noserde::gen::scan::parse_schema(data) {
        if !blocks.is_empty() {
            let _ = noserde::gen::emit::render_source("fuzz.rs", data);
        }
    }
});
