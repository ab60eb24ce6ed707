//! # Source Emitter
//!
//! Renders the replacement Rust source for each tagged block and splices
//! it into the passthrough text. For a struct `Example` the output is:
//!
//! - `example_layout`: `SIZE_BYTES` plus one offset constant per field
//!   (`<FIELD>_TAG_OFFSET`/`<FIELD>_PAYLOAD_OFFSET`/`<FIELD>_PAYLOAD_SIZE`
//!   for variants), written as constant expressions over `Scalar::WIRE_SIZE`
//!   and `Record::SIZE_BYTES` so the compiler, not the generator, owns
//!   every width;
//! - `ExampleData` with the declared defaults in its `Default` impl;
//! - `ExampleRef<'a>` / `ExampleMut<'a>` field-accessor views;
//! - per variant/union field: a `...Data` enum, `...Ref`/`...Mut` proxies,
//!   and (variants only) a `...Case` dispatch enum;
//! - `impl ::noserde::Record for Example` wiring the surface together.
//!
//! The emitted file opens with a header comment carrying the source path,
//! generator and format versions, and a SHA-256 digest of
//! `generator_version || 0x00 || format_version || 0x00 || source_bytes`.
//! The digest is what makes regeneration idempotent: equal digest, no
//! rewrite.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use crate::gen::ast::{self, Alt, Field, FieldKind, SchemaStruct};
use crate::gen::{scan, ParseError, FORMAT_VERSION, GENERATOR_VERSION};

/// Renders the full generated file for one schema source.
pub fn render_source(source_label: &str, source: &str) -> Result<String, ParseError> {
    let blocks = scan::parse_schema(source)?;
    let model = ast::analyze(blocks)?;

    let mut out = String::with_capacity(source.len() * 4);
    let digest = compute_digest(source.as_bytes());
    let _ = write!(
        out,
        "// @generated by noserde-gen; do not edit.\n\
         // source: {source_label}\n\
         // generator_version: {GENERATOR_VERSION}\n\
         // format_version: {FORMAT_VERSION}\n\
         // digest: {digest}\n\n"
    );

    let mut cursor = 0;
    for unit in &model.units {
        out.push_str(&source[cursor..unit.span.0]);
        let rendered: Vec<String> = unit
            .structs
            .iter()
            .map(|s| render_struct(s, model.hashes[&s.name]))
            .collect();
        out.push_str(&rendered.join("\n\n"));
        cursor = unit.span.1;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

/// SHA-256 over generator version, format version, and the source bytes.
pub fn compute_digest(source_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(GENERATOR_VERSION.as_bytes());
    hasher.update([0u8]);
    hasher.update(FORMAT_VERSION.as_bytes());
    hasher.update([0u8]);
    hasher.update(source_bytes);
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Pulls the embedded digest out of a generated file, if present.
pub fn extract_digest(text: &str) -> Option<&str> {
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("// digest: ") {
            let rest = rest.trim();
            if rest.len() == 64 && rest.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Some(rest);
            }
        }
    }
    None
}

/// `CamelCase` -> `camel_case`; a digit boundary does not get an
/// underscore, so `Vec2D` stays `vec2d`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

/// `field_name` -> `FieldName`.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn const_case(name: &str) -> String {
    snake_case(name).to_ascii_uppercase()
}

fn last_path_segment(spelling: &str) -> &str {
    spelling.rsplit("::").next().unwrap_or(spelling)
}

/// Accessor suffix for an alternative: `i32` -> `i32`, `Vec2D` -> `vec2d`.
fn alt_suffix(alt: &Alt) -> String {
    snake_case(last_path_segment(&alt.spelling))
}

/// Case-enum variant name for an alternative: `i32` -> `I32`.
fn alt_variant(alt: &Alt) -> String {
    let seg = last_path_segment(&alt.spelling);
    let mut chars = seg.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn scalar_size_expr(spelling: &str) -> String {
    format!("<{spelling} as ::noserde::Scalar>::WIRE_SIZE")
}

fn record_size_expr(spelling: &str) -> String {
    format!("<{spelling} as ::noserde::Record>::SIZE_BYTES")
}

fn alt_size_expr(alt: &Alt) -> String {
    if alt.is_record {
        record_size_expr(&alt.spelling)
    } else {
        scalar_size_expr(&alt.spelling)
    }
}

fn alt_data_type(alt: &Alt) -> String {
    if alt.is_record {
        format!("{}Data", alt.spelling)
    } else {
        alt.spelling.clone()
    }
}

/// Region bounds of a variant/union field inside the record, as constant
/// expressions over the layout module.
struct SumRegion {
    start: String,
    end: String,
}

fn sum_region(layout: &str, field: &Field) -> SumRegion {
    let fc = const_case(&field.name);
    match &field.kind {
        FieldKind::Variant { .. } => SumRegion {
            start: format!("{layout}::{fc}_TAG_OFFSET"),
            end: format!("{layout}::{fc}_PAYLOAD_OFFSET + {layout}::{fc}_PAYLOAD_SIZE"),
        },
        FieldKind::Union { .. } => SumRegion {
            start: format!("{layout}::{fc}_OFFSET"),
            end: format!("{layout}::{fc}_OFFSET + {layout}::{fc}_PAYLOAD_SIZE"),
        },
        _ => unreachable!("sum_region is only called for variant/union fields"),
    }
}

fn render_struct(block: &SchemaStruct, hash: u64) -> String {
    let name = &block.name;
    let layout = format!("{}_layout", snake_case(name));
    let mut out = String::new();

    render_layout_module(&mut out, block, &layout);
    out.push('\n');

    for field in &block.fields {
        if let FieldKind::Variant { alts } | FieldKind::Union { alts } = &field.kind {
            render_sum_data_enum(&mut out, block, field, alts);
            out.push('\n');
        }
    }

    render_data_struct(&mut out, block);
    out.push('\n');

    for field in &block.fields {
        match &field.kind {
            FieldKind::Variant { alts } => {
                render_sum_proxies(&mut out, block, field, alts, true);
                out.push('\n');
            }
            FieldKind::Union { alts } => {
                render_sum_proxies(&mut out, block, field, alts, false);
                out.push('\n');
            }
            _ => {}
        }
    }

    render_ref(&mut out, block, &layout);
    out.push('\n');
    render_mut(&mut out, block, &layout);
    out.push('\n');
    render_record_impl(&mut out, block, &layout, hash);

    out
}

fn render_layout_module(out: &mut String, block: &SchemaStruct, layout: &str) {
    let _ = writeln!(out, "/// Byte layout of one `{}` record.", block.name);
    let _ = writeln!(out, "pub mod {layout} {{");
    let _ = writeln!(out, "    #[allow(unused_imports)]");
    let _ = writeln!(out, "    use super::*;");
    let _ = writeln!(out);

    let mut cursor = "0".to_string();
    for field in &block.fields {
        let fc = const_case(&field.name);
        match &field.kind {
            FieldKind::Scalar { spelling } => {
                let _ = writeln!(out, "    pub const {fc}_OFFSET: usize = {cursor};");
                cursor = format!("{fc}_OFFSET + {}", scalar_size_expr(spelling));
            }
            FieldKind::Record { spelling } => {
                let _ = writeln!(out, "    pub const {fc}_OFFSET: usize = {cursor};");
                cursor = format!("{fc}_OFFSET + {}", record_size_expr(spelling));
            }
            FieldKind::Variant { alts } => {
                let _ = writeln!(out, "    pub const {fc}_TAG_OFFSET: usize = {cursor};");
                let _ = writeln!(
                    out,
                    "    pub const {fc}_PAYLOAD_OFFSET: usize = {fc}_TAG_OFFSET + {};",
                    scalar_size_expr("u32")
                );
                render_payload_size(out, &fc, alts);
                cursor = format!("{fc}_PAYLOAD_OFFSET + {fc}_PAYLOAD_SIZE");
            }
            FieldKind::Union { alts } => {
                let _ = writeln!(out, "    pub const {fc}_OFFSET: usize = {cursor};");
                render_payload_size(out, &fc, alts);
                cursor = format!("{fc}_OFFSET + {fc}_PAYLOAD_SIZE");
            }
            FieldKind::Inline { .. } => unreachable!("inline records are lifted during analysis"),
        }
    }
    let _ = writeln!(out, "    pub const SIZE_BYTES: usize = {cursor};");
    let _ = writeln!(out, "}}");
}

fn render_payload_size(out: &mut String, fc: &str, alts: &[Alt]) {
    let _ = writeln!(
        out,
        "    pub const {fc}_PAYLOAD_SIZE: usize = ::noserde::max_wire(&["
    );
    for alt in alts {
        let _ = writeln!(out, "        {},", alt_size_expr(alt));
    }
    let _ = writeln!(out, "    ]);");
}

fn data_field_type(block: &SchemaStruct, field: &Field) -> String {
    match &field.kind {
        FieldKind::Scalar { spelling } => spelling.clone(),
        FieldKind::Record { spelling } => format!("{spelling}Data"),
        FieldKind::Variant { .. } | FieldKind::Union { .. } => {
            format!("{}{}Data", block.name, camel_case(&field.name))
        }
        FieldKind::Inline { .. } => unreachable!("inline records are lifted during analysis"),
    }
}

fn render_sum_data_enum(out: &mut String, block: &SchemaStruct, field: &Field, alts: &[Alt]) {
    let enum_name = format!("{}{}Data", block.name, camel_case(&field.name));
    let what = if matches!(field.kind, FieldKind::Variant { .. }) {
        "variant"
    } else {
        "union"
    };
    let _ = writeln!(
        out,
        "/// Value form of the `{}` {what} of `{}`.",
        field.name, block.name
    );
    let _ = writeln!(out, "#[derive(Debug, Clone, PartialEq)]");
    let _ = writeln!(out, "pub enum {enum_name} {{");
    for alt in alts {
        let _ = writeln!(out, "    {}({}),", alt_variant(alt), alt_data_type(alt));
    }
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(out, "impl ::core::default::Default for {enum_name} {{");
    let _ = writeln!(out, "    fn default() -> Self {{");
    let _ = writeln!(
        out,
        "        Self::{}(::core::default::Default::default())",
        alt_variant(&alts[0])
    );
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
}

fn render_data_struct(out: &mut String, block: &SchemaStruct) {
    let name = &block.name;
    let _ = writeln!(
        out,
        "/// Plain value form of a `{name}` record, used for construction\n\
         /// and bulk assignment. `default()` carries the declared field\n\
         /// defaults."
    );
    let _ = writeln!(out, "#[derive(Debug, Clone, PartialEq)]");
    let _ = writeln!(out, "pub struct {name}Data {{");
    for field in &block.fields {
        let _ = writeln!(
            out,
            "    pub {}: {},",
            field.name,
            data_field_type(block, field)
        );
    }
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(out, "impl ::core::default::Default for {name}Data {{");
    let _ = writeln!(out, "    fn default() -> Self {{");
    let _ = writeln!(out, "        Self {{");
    for field in &block.fields {
        let value = field
            .default
            .clone()
            .unwrap_or_else(|| "::core::default::Default::default()".to_string());
        let _ = writeln!(out, "            {}: {value},", field.name);
    }
    let _ = writeln!(out, "        }}");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
}

fn render_sum_proxies(
    out: &mut String,
    block: &SchemaStruct,
    field: &Field,
    alts: &[Alt],
    tagged: bool,
) {
    let base = format!("{}{}", block.name, camel_case(&field.name));
    let has_record_alts = alts.iter().any(|a| a.is_record);
    let what = if tagged { "variant" } else { "union" };

    if tagged {
        render_case_enum(out, &base, field, alts, has_record_alts);
        out.push('\n');
    }

    // Shared proxy.
    let _ = writeln!(
        out,
        "/// Shared view over the `{}` {what} of a `{}` record.",
        field.name, block.name
    );
    let _ = writeln!(out, "#[derive(Debug, Clone, Copy)]");
    let _ = writeln!(out, "pub struct {base}Ref<'a> {{");
    let _ = writeln!(out, "    bytes: &'a [u8],");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(out, "impl<'a> {base}Ref<'a> {{");
    if tagged {
        let _ = writeln!(
            out,
            "    const TAG_SIZE: usize = {};",
            scalar_size_expr("u32")
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "    /// The stored discriminant.");
        let _ = writeln!(out, "    pub fn index(&self) -> u32 {{");
        let _ = writeln!(out, "        ::noserde::read_scalar(self.bytes, 0)");
        let _ = writeln!(out, "    }}");
        for (idx, alt) in alts.iter().enumerate() {
            let suffix = alt_suffix(alt);
            let _ = writeln!(out);
            let _ = writeln!(out, "    pub fn is_{suffix}(&self) -> bool {{");
            let _ = writeln!(out, "        self.index() == {idx}");
            let _ = writeln!(out, "    }}");
            let _ = writeln!(out);
            if alt.is_record {
                let _ = writeln!(
                    out,
                    "    pub fn as_{suffix}(&self) -> ::core::option::Option<{}Ref<'a>> {{",
                    alt.spelling
                );
                let _ = writeln!(out, "        if self.index() == {idx} {{");
                let _ = writeln!(
                    out,
                    "            ::core::option::Option::Some(<{} as ::noserde::Record>::make_ref(&self.bytes[Self::TAG_SIZE..]))",
                    alt.spelling
                );
            } else {
                let _ = writeln!(
                    out,
                    "    pub fn as_{suffix}(&self) -> ::core::option::Option<{}> {{",
                    alt.spelling
                );
                let _ = writeln!(out, "        if self.index() == {idx} {{");
                let _ = writeln!(
                    out,
                    "            ::core::option::Option::Some(::noserde::read_scalar(self.bytes, Self::TAG_SIZE))"
                );
            }
            let _ = writeln!(out, "        }} else {{");
            let _ = writeln!(out, "            ::core::option::Option::None");
            let _ = writeln!(out, "        }}");
            let _ = writeln!(out, "    }}");
        }
        let case_ty = if has_record_alts {
            format!("{base}Case<'a>")
        } else {
            format!("{base}Case")
        };
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "    /// Dispatch on the live alternative. `None` for an\n\
             \x20   /// out-of-range discriminant: no arm is invoked that the\n\
             \x20   /// stored bytes cannot satisfy."
        );
        let _ = writeln!(
            out,
            "    pub fn case(&self) -> ::core::option::Option<{case_ty}> {{"
        );
        let _ = writeln!(out, "        match self.index() {{");
        for (idx, alt) in alts.iter().enumerate() {
            let variant = alt_variant(alt);
            if alt.is_record {
                let _ = writeln!(
                    out,
                    "            {idx} => ::core::option::Option::Some({base}Case::{variant}(<{} as ::noserde::Record>::make_ref(&self.bytes[Self::TAG_SIZE..]))),",
                    alt.spelling
                );
            } else {
                let _ = writeln!(
                    out,
                    "            {idx} => ::core::option::Option::Some({base}Case::{variant}(::noserde::read_scalar(self.bytes, Self::TAG_SIZE))),"
                );
            }
        }
        let _ = writeln!(out, "            _ => ::core::option::Option::None,");
        let _ = writeln!(out, "        }}");
        let _ = writeln!(out, "    }}");
    } else {
        for alt in alts {
            let suffix = alt_suffix(alt);
            let _ = writeln!(out);
            if alt.is_record {
                let _ = writeln!(out, "    pub fn as_{suffix}(&self) -> {}Ref<'a> {{", alt.spelling);
                let _ = writeln!(
                    out,
                    "        <{} as ::noserde::Record>::make_ref(self.bytes)",
                    alt.spelling
                );
            } else {
                let _ = writeln!(out, "    pub fn as_{suffix}(&self) -> {} {{", alt.spelling);
                let _ = writeln!(out, "        ::noserde::read_scalar(self.bytes, 0)");
            }
            let _ = writeln!(out, "    }}");
        }
    }
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    // Exclusive proxy.
    let _ = writeln!(
        out,
        "/// Exclusive view over the `{}` {what} of a `{}` record.",
        field.name, block.name
    );
    if tagged {
        let _ = writeln!(
            out,
            "///\n\
             /// `set_*` writes the discriminant, zeros the whole payload\n\
             /// region, then writes the new value, so switching alternatives\n\
             /// back and forth is byte-stable."
        );
    } else {
        let _ = writeln!(
            out,
            "///\n\
             /// No discriminant is stored; the caller tracks which\n\
             /// alternative is live. `set_*` zeros the payload before\n\
             /// writing, and writing one alternative invalidates any\n\
             /// interpretation as another."
        );
    }
    let _ = writeln!(out, "pub struct {base}Mut<'a> {{");
    let _ = writeln!(out, "    bytes: &'a mut [u8],");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(out, "impl<'a> {base}Mut<'a> {{");
    if tagged {
        let _ = writeln!(
            out,
            "    const TAG_SIZE: usize = {};",
            scalar_size_expr("u32")
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "    /// The stored discriminant.");
        let _ = writeln!(out, "    pub fn index(&self) -> u32 {{");
        let _ = writeln!(out, "        ::noserde::read_scalar(self.bytes, 0)");
        let _ = writeln!(out, "    }}");
        for (idx, alt) in alts.iter().enumerate() {
            let suffix = alt_suffix(alt);
            let _ = writeln!(out);
            let _ = writeln!(out, "    pub fn is_{suffix}(&self) -> bool {{");
            let _ = writeln!(out, "        self.index() == {idx}");
            let _ = writeln!(out, "    }}");
            let _ = writeln!(out);
            if alt.is_record {
                let _ = writeln!(
                    out,
                    "    pub fn as_{suffix}(&self) -> ::core::option::Option<{}Ref<'_>> {{",
                    alt.spelling
                );
                let _ = writeln!(out, "        if self.index() == {idx} {{");
                let _ = writeln!(
                    out,
                    "            ::core::option::Option::Some(<{} as ::noserde::Record>::make_ref(&self.bytes[Self::TAG_SIZE..]))",
                    alt.spelling
                );
                let _ = writeln!(out, "        }} else {{");
                let _ = writeln!(out, "            ::core::option::Option::None");
                let _ = writeln!(out, "        }}");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "    pub fn as_{suffix}_mut(&mut self) -> ::core::option::Option<{}Mut<'_>> {{",
                    alt.spelling
                );
                let _ = writeln!(out, "        if self.index() == {idx} {{");
                let _ = writeln!(
                    out,
                    "            ::core::option::Option::Some(<{} as ::noserde::Record>::make_mut(&mut self.bytes[Self::TAG_SIZE..]))",
                    alt.spelling
                );
                let _ = writeln!(out, "        }} else {{");
                let _ = writeln!(out, "            ::core::option::Option::None");
                let _ = writeln!(out, "        }}");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(out, "    pub fn set_{suffix}(&mut self) -> {}Mut<'_> {{", alt.spelling);
                let _ = writeln!(out, "        self.bytes[Self::TAG_SIZE..].fill(0);");
                let _ = writeln!(
                    out,
                    "        ::noserde::write_scalar(self.bytes, 0, {idx}u32);"
                );
                let _ = writeln!(
                    out,
                    "        <{} as ::noserde::Record>::make_mut(&mut self.bytes[Self::TAG_SIZE..])",
                    alt.spelling
                );
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "    pub fn set_{suffix}_from(&mut self, data: &{}Data) {{",
                    alt.spelling
                );
                let _ = writeln!(out, "        self.bytes[Self::TAG_SIZE..].fill(0);");
                let _ = writeln!(
                    out,
                    "        ::noserde::write_scalar(self.bytes, 0, {idx}u32);"
                );
                let _ = writeln!(
                    out,
                    "        <{} as ::noserde::Record>::assign(&mut self.bytes[Self::TAG_SIZE..], data);",
                    alt.spelling
                );
                let _ = writeln!(out, "    }}");
            } else {
                let _ = writeln!(
                    out,
                    "    pub fn as_{suffix}(&self) -> ::core::option::Option<{}> {{",
                    alt.spelling
                );
                let _ = writeln!(out, "        if self.index() == {idx} {{");
                let _ = writeln!(
                    out,
                    "            ::core::option::Option::Some(::noserde::read_scalar(self.bytes, Self::TAG_SIZE))"
                );
                let _ = writeln!(out, "        }} else {{");
                let _ = writeln!(out, "            ::core::option::Option::None");
                let _ = writeln!(out, "        }}");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "    pub fn set_{suffix}(&mut self, value: {}) {{",
                    alt.spelling
                );
                let _ = writeln!(out, "        self.bytes[Self::TAG_SIZE..].fill(0);");
                let _ = writeln!(
                    out,
                    "        ::noserde::write_scalar(self.bytes, 0, {idx}u32);"
                );
                let _ = writeln!(
                    out,
                    "        ::noserde::write_scalar(self.bytes, Self::TAG_SIZE, value);"
                );
                let _ = writeln!(out, "    }}");
            }
        }
    } else {
        for alt in alts {
            let suffix = alt_suffix(alt);
            let _ = writeln!(out);
            if alt.is_record {
                let _ = writeln!(out, "    pub fn as_{suffix}(&self) -> {}Ref<'_> {{", alt.spelling);
                let _ = writeln!(
                    out,
                    "        <{} as ::noserde::Record>::make_ref(self.bytes)",
                    alt.spelling
                );
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "    pub fn as_{suffix}_mut(&mut self) -> {}Mut<'_> {{",
                    alt.spelling
                );
                let _ = writeln!(
                    out,
                    "        <{} as ::noserde::Record>::make_mut(self.bytes)",
                    alt.spelling
                );
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(out, "    pub fn set_{suffix}(&mut self) -> {}Mut<'_> {{", alt.spelling);
                let _ = writeln!(out, "        self.bytes.fill(0);");
                let _ = writeln!(
                    out,
                    "        <{} as ::noserde::Record>::make_mut(&mut *self.bytes)",
                    alt.spelling
                );
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "    pub fn set_{suffix}_from(&mut self, data: &{}Data) {{",
                    alt.spelling
                );
                let _ = writeln!(out, "        self.bytes.fill(0);");
                let _ = writeln!(
                    out,
                    "        <{} as ::noserde::Record>::assign(self.bytes, data);",
                    alt.spelling
                );
                let _ = writeln!(out, "    }}");
            } else {
                let _ = writeln!(out, "    pub fn as_{suffix}(&self) -> {} {{", alt.spelling);
                let _ = writeln!(out, "        ::noserde::read_scalar(self.bytes, 0)");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "    pub fn set_{suffix}(&mut self, value: {}) {{",
                    alt.spelling
                );
                let _ = writeln!(out, "        self.bytes.fill(0);");
                let _ = writeln!(out, "        ::noserde::write_scalar(self.bytes, 0, value);");
                let _ = writeln!(out, "    }}");
            }
        }
    }
    let _ = writeln!(out, "}}");
}

fn render_case_enum(
    out: &mut String,
    base: &str,
    field: &Field,
    alts: &[Alt],
    has_record_alts: bool,
) {
    let generics = if has_record_alts { "<'a>" } else { "" };
    let _ = writeln!(
        out,
        "/// One arm per alternative of the `{}` variant, for dispatch.",
        field.name
    );
    let _ = writeln!(out, "#[derive(Debug, Clone, Copy)]");
    let _ = writeln!(out, "pub enum {base}Case{generics} {{");
    for alt in alts {
        if alt.is_record {
            let _ = writeln!(out, "    {}({}Ref<'a>),", alt_variant(alt), alt.spelling);
        } else {
            let _ = writeln!(out, "    {}({}),", alt_variant(alt), alt.spelling);
        }
    }
    let _ = writeln!(out, "}}");
}

fn render_ref(out: &mut String, block: &SchemaStruct, layout: &str) {
    let name = &block.name;
    let _ = writeln!(out, "/// Shared view over one `{name}` record.");
    let _ = writeln!(out, "#[derive(Debug, Clone, Copy)]");
    let _ = writeln!(out, "pub struct {name}Ref<'a> {{");
    let _ = writeln!(out, "    bytes: &'a [u8],");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(out, "impl<'a> {name}Ref<'a> {{");
    let _ = writeln!(out, "    pub fn new(bytes: &'a [u8]) -> Self {{");
    let _ = writeln!(out, "        Self {{");
    let _ = writeln!(out, "            bytes: &bytes[..{layout}::SIZE_BYTES],");
    let _ = writeln!(out, "        }}");
    let _ = writeln!(out, "    }}");
    for field in &block.fields {
        let fname = &field.name;
        let fc = const_case(fname);
        let _ = writeln!(out);
        match &field.kind {
            FieldKind::Scalar { spelling } => {
                let _ = writeln!(out, "    pub fn {fname}(&self) -> {spelling} {{");
                let _ = writeln!(
                    out,
                    "        ::noserde::read_scalar(self.bytes, {layout}::{fc}_OFFSET)"
                );
                let _ = writeln!(out, "    }}");
            }
            FieldKind::Record { spelling } => {
                let _ = writeln!(out, "    pub fn {fname}(&self) -> {spelling}Ref<'a> {{");
                let _ = writeln!(
                    out,
                    "        <{spelling} as ::noserde::Record>::make_ref(&self.bytes[{layout}::{fc}_OFFSET..])"
                );
                let _ = writeln!(out, "    }}");
            }
            FieldKind::Variant { .. } | FieldKind::Union { .. } => {
                let base = format!("{}{}", name, camel_case(fname));
                let region = sum_region(layout, field);
                let _ = writeln!(out, "    pub fn {fname}(&self) -> {base}Ref<'a> {{");
                let _ = writeln!(out, "        {base}Ref {{");
                let _ = writeln!(
                    out,
                    "            bytes: &self.bytes[{}..{}],",
                    region.start, region.end
                );
                let _ = writeln!(out, "        }}");
                let _ = writeln!(out, "    }}");
            }
            FieldKind::Inline { .. } => unreachable!("inline records are lifted during analysis"),
        }
    }
    let _ = writeln!(out, "}}");
}

fn render_mut(out: &mut String, block: &SchemaStruct, layout: &str) {
    let name = &block.name;
    let _ = writeln!(out, "/// Exclusive view over one `{name}` record.");
    let _ = writeln!(out, "pub struct {name}Mut<'a> {{");
    let _ = writeln!(out, "    bytes: &'a mut [u8],");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(out, "impl<'a> {name}Mut<'a> {{");
    let _ = writeln!(out, "    pub fn new(bytes: &'a mut [u8]) -> Self {{");
    let _ = writeln!(out, "        Self {{");
    let _ = writeln!(out, "            bytes: &mut bytes[..{layout}::SIZE_BYTES],");
    let _ = writeln!(out, "        }}");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out);
    let _ = writeln!(out, "    pub fn as_ref(&self) -> {name}Ref<'_> {{");
    let _ = writeln!(out, "        {name}Ref::new(self.bytes)");
    let _ = writeln!(out, "    }}");
    for field in &block.fields {
        let fname = &field.name;
        let fc = const_case(fname);
        let _ = writeln!(out);
        match &field.kind {
            FieldKind::Scalar { spelling } => {
                let _ = writeln!(out, "    pub fn {fname}(&self) -> {spelling} {{");
                let _ = writeln!(
                    out,
                    "        ::noserde::read_scalar(self.bytes, {layout}::{fc}_OFFSET)"
                );
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(out, "    pub fn set_{fname}(&mut self, value: {spelling}) {{");
                let _ = writeln!(
                    out,
                    "        ::noserde::write_scalar(self.bytes, {layout}::{fc}_OFFSET, value);"
                );
                let _ = writeln!(out, "    }}");
            }
            FieldKind::Record { spelling } => {
                let _ = writeln!(out, "    pub fn {fname}(&self) -> {spelling}Ref<'_> {{");
                let _ = writeln!(
                    out,
                    "        <{spelling} as ::noserde::Record>::make_ref(&self.bytes[{layout}::{fc}_OFFSET..])"
                );
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(out, "    pub fn {fname}_mut(&mut self) -> {spelling}Mut<'_> {{");
                let _ = writeln!(
                    out,
                    "        <{spelling} as ::noserde::Record>::make_mut(&mut self.bytes[{layout}::{fc}_OFFSET..])"
                );
                let _ = writeln!(out, "    }}");
            }
            FieldKind::Variant { .. } | FieldKind::Union { .. } => {
                let base = format!("{}{}", name, camel_case(fname));
                let region = sum_region(layout, field);
                let _ = writeln!(out, "    pub fn {fname}(&self) -> {base}Ref<'_> {{");
                let _ = writeln!(out, "        {base}Ref {{");
                let _ = writeln!(
                    out,
                    "            bytes: &self.bytes[{}..{}],",
                    region.start, region.end
                );
                let _ = writeln!(out, "        }}");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out);
                let _ = writeln!(out, "    pub fn {fname}_mut(&mut self) -> {base}Mut<'_> {{");
                let _ = writeln!(out, "        {base}Mut {{");
                let _ = writeln!(
                    out,
                    "            bytes: &mut self.bytes[{}..{}],",
                    region.start, region.end
                );
                let _ = writeln!(out, "        }}");
                let _ = writeln!(out, "    }}");
            }
            FieldKind::Inline { .. } => unreachable!("inline records are lifted during analysis"),
        }
    }
    let _ = writeln!(out, "}}");
}

fn render_record_impl(out: &mut String, block: &SchemaStruct, layout: &str, hash: u64) {
    let name = &block.name;
    let _ = writeln!(out, "/// Marker type for `{name}` records in buffers and I/O.");
    let _ = writeln!(out, "#[derive(Debug, Clone, Copy)]");
    let _ = writeln!(out, "pub struct {name};");
    let _ = writeln!(out);
    let _ = writeln!(out, "impl ::noserde::Record for {name} {{");
    let _ = writeln!(out, "    const SIZE_BYTES: usize = {layout}::SIZE_BYTES;");
    let _ = writeln!(out, "    const SCHEMA_HASH: u64 = 0x{hash:016x};");
    let _ = writeln!(out);
    let _ = writeln!(out, "    type Ref<'a> = {name}Ref<'a>;");
    let _ = writeln!(out, "    type Mut<'a> = {name}Mut<'a>;");
    let _ = writeln!(out, "    type Data = {name}Data;");
    let _ = writeln!(out);
    let _ = writeln!(out, "    fn make_ref(bytes: &[u8]) -> {name}Ref<'_> {{");
    let _ = writeln!(out, "        {name}Ref::new(bytes)");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out);
    let _ = writeln!(out, "    fn make_mut(bytes: &mut [u8]) -> {name}Mut<'_> {{");
    let _ = writeln!(out, "        {name}Mut::new(bytes)");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out);
    let _ = writeln!(out, "    fn assign(bytes: &mut [u8], data: &{name}Data) {{");
    for field in &block.fields {
        let fname = &field.name;
        let fc = const_case(fname);
        match &field.kind {
            FieldKind::Scalar { .. } => {
                let _ = writeln!(
                    out,
                    "        ::noserde::write_scalar(bytes, {layout}::{fc}_OFFSET, data.{fname});"
                );
            }
            FieldKind::Record { spelling } => {
                let _ = writeln!(
                    out,
                    "        <{spelling} as ::noserde::Record>::assign(&mut bytes[{layout}::{fc}_OFFSET..], &data.{fname});"
                );
            }
            FieldKind::Variant { alts } | FieldKind::Union { alts } => {
                let base = format!("{}{}", name, camel_case(fname));
                let region = sum_region(layout, field);
                let _ = writeln!(out, "        {{");
                let _ = writeln!(out, "            let mut {fname} = {base}Mut {{");
                let _ = writeln!(
                    out,
                    "                bytes: &mut bytes[{}..{}],",
                    region.start, region.end
                );
                let _ = writeln!(out, "            }};");
                let _ = writeln!(out, "            match &data.{fname} {{");
                for alt in alts {
                    let variant = alt_variant(alt);
                    let suffix = alt_suffix(alt);
                    if alt.is_record {
                        let _ = writeln!(
                            out,
                            "                {base}Data::{variant}(v) => {fname}.set_{suffix}_from(v),"
                        );
                    } else {
                        let _ = writeln!(
                            out,
                            "                {base}Data::{variant}(v) => {fname}.set_{suffix}(*v),"
                        );
                    }
                }
                let _ = writeln!(out, "            }}");
                let _ = writeln!(out, "        }}");
            }
            FieldKind::Inline { .. } => unreachable!("inline records are lifted during analysis"),
        }
    }
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
}
