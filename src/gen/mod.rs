//! # Schema Generator
//!
//! A targeted source-to-source rewriter. It reads a schema source file,
//! finds structs tagged with `#[noserde]`, and replaces each tagged block
//! with generated Rust: layout constants, a `Data` value type, `Ref`/`Mut`
//! views, variant/union proxies, and the [`Record`](crate::Record)
//! implementation tying them together. Everything outside a tagged block
//! passes through byte-for-byte.
//!
//! ## Pipeline
//!
//! ```text
//! schema source --> scan (targeted tokenizer) --> ast (layout + hashes)
//!               --> emit (Rust source + digest header) --> output file
//! ```
//!
//! ## Schema dialect
//!
//! ```ignore
//! noserde::scalar_enum! {               // passes through verbatim
//!     pub enum Kind: u8 { Int = 0, Real = 1 }
//! }
//!
//! #[noserde]
//! struct Inner {
//!     score: i16,
//!     enabled: bool,
//! }
//!
//! #[noserde]
//! struct Example {
//!     flag: bool,
//!     id: i32 = 7,                      // declared default
//!     inner: Inner,                     // nested record by value
//!     value: variant<i32, f64>,         // 4-byte tag + max-sized payload
//!     raw: union_<u32, f32>,            // untagged payload overlay
//!     kind: Kind,                       // enum, wire form = underlying int
//! }
//! ```
//!
//! Field types may also be inline records (`meta: struct Meta { ... }`) or
//! gated native PODs declared with [`native_pod!`](crate::native_pod).
//! Unsupported constructs (references, pointers, arrays, generics outside
//! `variant`/`union_`) are fatal errors with `file:line:col` diagnostics,
//! never silently skipped.
//!
//! ## Idempotence
//!
//! The emitted file starts with a header comment carrying a SHA-256 digest
//! of `(generator_version, format_version, source bytes)`. Re-running the
//! generator on unchanged input finds the digest unchanged and leaves the
//! output file untouched, preserving its mtime for build caching. `--check`
//! reports staleness without writing.

pub mod ast;
pub mod emit;
pub mod scan;

use std::fs;
use std::path::Path;

use eyre::WrapErr;

/// Version stamped into generated headers; part of the digest, so bumping
/// the crate version regenerates all outputs.
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the emitted source shape; part of the digest.
pub const FORMAT_VERSION: &str = "1";

/// A schema parse failure at a byte offset in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// `path:line:col: error: message`, the shape build systems parse.
    pub fn render(&self, path: &str, src: &str) -> String {
        let (line, col) = line_col(src, self.offset);
        format!("{path}:{line}:{col}: error: {}", self.message)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.offset)
    }
}

impl std::error::Error for ParseError {}

/// 1-based line and column of a byte offset.
pub fn line_col(src: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(src.len());
    let mut line = 1u32;
    let mut col = 1u32;
    for byte in src.as_bytes()[..offset].iter() {
        if *byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Result of a generation run against an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The output file was written.
    Generated,
    /// The existing output already matches; nothing was written.
    Unchanged,
}

/// Result of a `--check` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    UpToDate,
    Missing,
    Stale,
}

fn render_input(input: &Path) -> eyre::Result<String> {
    let source = fs::read_to_string(input)
        .wrap_err_with(|| format!("failed to read schema source {}", input.display()))?;
    let label = input.display().to_string();
    emit::render_source(&label, &source).map_err(|e| eyre::eyre!("{}", e.render(&label, &source)))
}

/// Generates `output` from `input`, skipping the write when the embedded
/// digest shows the output is already current.
pub fn generate_to_file(input: &Path, output: &Path) -> eyre::Result<Outcome> {
    let rendered = render_input(input)?;

    if let Ok(existing) = fs::read_to_string(output) {
        let digests_match = match (emit::extract_digest(&existing), emit::extract_digest(&rendered))
        {
            (Some(old), Some(new)) => old == new,
            _ => false,
        };
        if digests_match || existing == rendered {
            return Ok(Outcome::Unchanged);
        }
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }
    }
    fs::write(output, &rendered)
        .wrap_err_with(|| format!("failed to write {}", output.display()))?;
    Ok(Outcome::Generated)
}

/// Compares `output` against what generation would produce, without
/// writing anything.
pub fn check_output(input: &Path, output: &Path) -> eyre::Result<CheckOutcome> {
    let rendered = render_input(input)?;
    match fs::read_to_string(output) {
        Ok(existing) if existing == rendered => Ok(CheckOutcome::UpToDate),
        Ok(_) => Ok(CheckOutcome::Stale),
        Err(_) => Ok(CheckOutcome::Missing),
    }
}
