//! # Schema Source Scanner
//!
//! A targeted scanner, deliberately not a Rust parser. It walks the source
//! byte-wise with a small state machine that understands just enough of
//! the host syntax to stay out of trouble: line comments, nesting block
//! comments, string literals with escapes, and the char-literal /
//! lifetime-tick ambiguity. Only regions introduced by the `#[noserde]`
//! attribute are parsed; everything else is passthrough for the emitter.
//!
//! ## Grammar of a tagged block
//!
//! ```text
//! #[noserde] [pub] struct Name {
//!     field: Type [= default-expr],
//!     ...
//! }
//! ```
//!
//! `Type` is a primitive, a named enum/POD/record, `variant<T1, ...>`,
//! `union_<T1, ...>`, or an inline `struct Name { ... }`. Fields split on
//! top-level commas with `()[]{}<>` depth tracking, which is why a bare
//! comparison operator inside a default expression must be parenthesized.
//!
//! Unsupported constructs are fatal, never skipped: references, pointers,
//! arrays, slices, `dyn`/`impl`, platform-width and 128-bit integers, and
//! generic types other than the two sum spellings all produce an error
//! pointing at the offending declaration. Attribute tokens hidden behind
//! macros are not seen at all; that is a documented limit of targeted
//! scanning.

use phf::phf_map;
use smallvec::SmallVec;

use crate::gen::ast::{Alt, AltList, Field, FieldKind, SchemaStruct};
use crate::gen::ParseError;

/// The attribute token that introduces a tagged struct.
pub const ATTRIBUTE_TOKEN: &str = "#[noserde]";

/// Wire widths of the primitive scalar spellings.
static SCALAR_WIDTHS: phf::Map<&'static str, u8> = phf_map! {
    "bool" => 1,
    "i8" => 1,
    "u8" => 1,
    "i16" => 2,
    "u16" => 2,
    "i32" => 4,
    "u32" => 4,
    "f32" => 4,
    "i64" => 8,
    "u64" => 8,
    "f64" => 8,
};

/// Wire width of a primitive spelling, if it is one.
pub fn primitive_width(spelling: &str) -> Option<u8> {
    SCALAR_WIDTHS.get(spelling).copied()
}

/// Parses every tagged struct in `src`, in source order.
pub fn parse_schema(src: &str) -> Result<Vec<SchemaStruct>, ParseError> {
    let mut blocks = Vec::new();
    let mut consumed_until = 0;
    for pos in attribute_positions(src) {
        if pos < consumed_until {
            continue;
        }
        let block = parse_tagged_struct(src, pos)?;
        consumed_until = block.span.1;
        blocks.push(block);
    }
    Ok(blocks)
}

/// Byte offsets of every `#[noserde]` token outside comments and strings.
fn attribute_positions(src: &str) -> Vec<usize> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'"' => i = skip_string(bytes, i),
            b'\'' => i = skip_char_or_lifetime(bytes, i),
            b'#' if src[i..].starts_with(ATTRIBUTE_TOKEN) => {
                out.push(i);
                i += ATTRIBUTE_TOKEN.len();
            }
            _ => i += 1,
        }
    }
    out
}

fn skip_line_comment(bytes: &[u8], i: usize) -> usize {
    let mut j = i + 2;
    while j < bytes.len() && bytes[j] != b'\n' {
        j += 1;
    }
    j
}

fn skip_block_comment(bytes: &[u8], i: usize) -> usize {
    let mut depth = 1usize;
    let mut j = i + 2;
    while j < bytes.len() && depth > 0 {
        if bytes[j] == b'/' && bytes.get(j + 1) == Some(&b'*') {
            depth += 1;
            j += 2;
        } else if bytes[j] == b'*' && bytes.get(j + 1) == Some(&b'/') {
            depth -= 1;
            j += 2;
        } else {
            j += 1;
        }
    }
    j
}

fn skip_string(bytes: &[u8], i: usize) -> usize {
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'"' => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

/// A `'` is a char literal when a closing quote follows within the
/// literal forms `'x'` or `'\...'`; otherwise it is a lifetime tick and
/// only the tick itself is consumed.
fn skip_char_or_lifetime(bytes: &[u8], i: usize) -> usize {
    match bytes.get(i + 1) {
        Some(b'\\') => {
            let mut j = i + 2;
            while j < bytes.len() {
                if bytes[j] == b'\'' {
                    return j + 1;
                }
                j += 1;
            }
            bytes.len()
        }
        Some(_) if bytes.get(i + 2) == Some(&b'\'') => i + 3,
        _ => i + 1,
    }
}

/// Advances over whitespace and comments.
fn skip_ws_comments(src: &str, mut i: usize) -> Result<usize, ParseError> {
    let bytes = src.as_bytes();
    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = skip_block_comment(bytes, i);
                if end >= bytes.len() && !src.ends_with("*/") {
                    return Err(ParseError::new("unterminated block comment", i));
                }
                i = end;
            }
            _ => break,
        }
    }
    Ok(i)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn parse_identifier(src: &str, i: usize) -> Result<(&str, usize), ParseError> {
    let bytes = src.as_bytes();
    if i >= bytes.len() || !is_ident_start(bytes[i]) {
        return Err(ParseError::new("expected identifier", i));
    }
    let mut j = i + 1;
    while j < bytes.len() && is_ident_byte(bytes[j]) {
        j += 1;
    }
    Ok((&src[i..j], j))
}

fn starts_with_word(src: &str, i: usize, word: &str) -> bool {
    src[i..].starts_with(word)
        && !src
            .as_bytes()
            .get(i + word.len())
            .copied()
            .is_some_and(is_ident_byte)
}

/// Finds the `}` matching the `{` at `open`, honoring comments and
/// strings in between.
fn find_matching_brace(src: &str, open: usize) -> Result<usize, ParseError> {
    let bytes = src.as_bytes();
    debug_assert_eq!(bytes.get(open), Some(&b'{'));
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'"' => i = skip_string(bytes, i),
            b'\'' => i = skip_char_or_lifetime(bytes, i),
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    Err(ParseError::new("unbalanced braces in struct body", open))
}

fn parse_tagged_struct(src: &str, attr_pos: usize) -> Result<SchemaStruct, ParseError> {
    let bytes = src.as_bytes();
    let mut i = skip_ws_comments(src, attr_pos + ATTRIBUTE_TOKEN.len())?;

    if starts_with_word(src, i, "pub") {
        i = skip_ws_comments(src, i + 3)?;
    }
    if !starts_with_word(src, i, "struct") {
        return Err(ParseError::new(
            format!("expected `struct` after {ATTRIBUTE_TOKEN}"),
            i,
        ));
    }
    i = skip_ws_comments(src, i + "struct".len())?;

    let (name, after_name) = parse_identifier(src, i)?;
    i = skip_ws_comments(src, after_name)?;
    if bytes.get(i) != Some(&b'{') {
        return Err(ParseError::new("expected `{` to open the struct body", i));
    }

    let close = find_matching_brace(src, i)?;
    let fields = parse_fields(&src[i + 1..close], i + 1)?;
    if fields.is_empty() {
        return Err(ParseError::new(
            format!("tagged struct `{name}` must declare at least one field"),
            attr_pos,
        ));
    }

    let mut seen = SmallVec::<[&str; 8]>::new();
    for field in &fields {
        if seen.contains(&field.name.as_str()) {
            return Err(ParseError::new(
                format!("duplicate field name `{}` in `{name}`", field.name),
                field.offset,
            ));
        }
        seen.push(field.name.as_str());
    }
    drop(seen);

    Ok(SchemaStruct {
        name: name.to_string(),
        fields,
        span: (attr_pos, close + 1),
    })
}

/// Rewrites comments to spaces (newlines kept), so later slicing sees
/// only code while every byte offset still maps 1:1 to the original.
fn blank_comments(src: &str) -> String {
    let bytes = src.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = skip_line_comment(bytes, i);
                blank_range(&mut out, i, end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = skip_block_comment(bytes, i);
                blank_range(&mut out, i, end);
                i = end;
            }
            b'"' => i = skip_string(bytes, i),
            b'\'' => i = skip_char_or_lifetime(bytes, i),
            _ => i += 1,
        }
    }
    // Only ASCII bytes were rewritten, so this is still valid UTF-8.
    String::from_utf8(out).expect("comment blanking preserves UTF-8")
}

fn blank_range(out: &mut [u8], start: usize, end: usize) {
    for byte in &mut out[start..end] {
        if *byte != b'\n' {
            *byte = b' ';
        }
    }
}

/// Splits a struct body into field declarations on top-level commas.
/// Depth counts `()`, `[]`, `{}`, and `<>`.
fn split_fields(body: &str) -> Vec<(String, usize)> {
    let cleaned = blank_comments(body);
    let bytes = cleaned.as_bytes();
    let mut decls = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'\'' => {
                i = skip_char_or_lifetime(bytes, i);
                continue;
            }
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' | b'>' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                decls.push((cleaned[start..i].to_string(), start));
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    decls.push((cleaned[start..].to_string(), start));
    decls
        .into_iter()
        .filter(|(text, _)| !text.trim().is_empty())
        .collect()
}

fn parse_fields(body: &str, body_offset: usize) -> Result<Vec<Field>, ParseError> {
    let mut fields = Vec::new();
    for (decl, decl_start) in split_fields(body) {
        fields.push(parse_field_decl(&decl, body_offset + decl_start)?);
    }
    Ok(fields)
}

fn parse_field_decl(decl: &str, decl_offset: usize) -> Result<Field, ParseError> {
    let bytes = decl.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let field_start = decl_offset + i;

    let (name, after_name) = parse_identifier(decl, i)
        .map_err(|_| ParseError::new("expected `name: type` field declaration", field_start))?;
    i = after_name;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) != Some(&b':') {
        return Err(ParseError::new(
            format!("expected `:` after field name `{name}`"),
            decl_offset + i,
        ));
    }
    i += 1;

    let rest = &decl[i..];
    let rest_offset = decl_offset + i;
    let (type_part, default) = split_default(rest);
    let leading_ws = type_part.len() - type_part.trim_start().len();
    let type_text = type_part.trim();
    let type_offset = rest_offset + leading_ws;
    if type_text.is_empty() {
        return Err(ParseError::new(
            format!("missing type for field `{name}`"),
            rest_offset,
        ));
    }

    let kind = parse_type_spelling(type_text, type_offset)?;
    Ok(Field {
        name: name.to_string(),
        kind,
        default: default.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        offset: field_start,
    })
}

/// Splits `type [= default]` at the first top-level `=` that is not part
/// of `==`, `<=`, `>=`, or `!=`.
fn split_default(rest: &str) -> (&str, Option<&str>) {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'\'' => {
                i = skip_char_or_lifetime(bytes, i);
                continue;
            }
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' | b'>' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let prev = if i > 0 { bytes[i - 1] } else { 0 };
                let next = bytes.get(i + 1).copied().unwrap_or(0);
                if next != b'=' && !matches!(prev, b'=' | b'<' | b'>' | b'!') {
                    return (&rest[..i], Some(&rest[i + 1..]));
                }
            }
            _ => {}
        }
        i += 1;
    }
    (rest, None)
}

fn parse_type_spelling(type_text: &str, offset: usize) -> Result<FieldKind, ParseError> {
    if let Some(after) = strip_word(type_text, "variant") {
        let alts = parse_alt_list(after, "variant", offset)?;
        return Ok(FieldKind::Variant { alts });
    }
    if let Some(after) = strip_word(type_text, "union_") {
        let alts = parse_alt_list(after, "union_", offset)?;
        return Ok(FieldKind::Union { alts });
    }
    if let Some(after) = strip_word(type_text, "struct") {
        return parse_inline_struct(after, offset + "struct".len(), offset);
    }

    let spelling = validate_plain_spelling(type_text, offset)?;
    Ok(FieldKind::Scalar { spelling })
}

/// Strips a leading keyword if present as a whole word.
fn strip_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(word)?;
    match rest.as_bytes().first() {
        Some(&b) if is_ident_byte(b) => None,
        _ => Some(rest),
    }
}

fn parse_alt_list(after_keyword: &str, keyword: &str, offset: usize) -> Result<AltList, ParseError> {
    let rest = after_keyword.trim_start();
    let Some(inner) = rest.strip_prefix('<') else {
        return Err(ParseError::new(
            format!("expected `<` after `{keyword}`"),
            offset,
        ));
    };
    let Some(inner) = inner.strip_suffix('>').map(str::trim) else {
        return Err(ParseError::new(
            format!("expected `>` to close the `{keyword}` alternative list"),
            offset,
        ));
    };

    let mut alts = AltList::new();
    for alt_text in split_top_level_commas(inner) {
        let alt_text = alt_text.trim();
        if alt_text.is_empty() {
            continue;
        }
        let spelling = validate_plain_spelling(alt_text, offset)?;
        if alts.iter().any(|a: &Alt| a.spelling == spelling) {
            return Err(ParseError::new(
                format!("duplicate alternative `{spelling}` in `{keyword}` list"),
                offset,
            ));
        }
        alts.push(Alt {
            spelling,
            is_record: false,
        });
    }
    if alts.is_empty() {
        return Err(ParseError::new(
            format!("`{keyword}` must list at least one alternative"),
            offset,
        ));
    }
    Ok(alts)
}

fn split_top_level_commas(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' | b'>' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_inline_struct(
    after_keyword: &str,
    after_offset: usize,
    type_offset: usize,
) -> Result<FieldKind, ParseError> {
    let trimmed_ws = after_keyword.len() - after_keyword.trim_start().len();
    let rest = after_keyword.trim_start();
    let rest_offset = after_offset + trimmed_ws;
    if rest.starts_with('{') {
        return Err(ParseError::new(
            "anonymous inline structs are not supported; use `struct Name { ... }`",
            type_offset,
        ));
    }
    let (name, after_name) = parse_identifier(rest, 0)
        .map_err(|_| ParseError::new("expected a name after `struct`", type_offset))?;
    let Some(open) = rest[after_name..].find('{').map(|rel| after_name + rel) else {
        return Err(ParseError::new(
            format!("expected `{{` to open inline struct `{name}`"),
            type_offset,
        ));
    };
    if !rest[after_name..open].trim().is_empty() {
        return Err(ParseError::new(
            format!("unexpected tokens before the body of inline struct `{name}`"),
            rest_offset + after_name,
        ));
    }
    let close = find_matching_brace(rest, open)?;
    if !rest[close + 1..].trim().is_empty() {
        return Err(ParseError::new(
            format!("unexpected tokens after inline struct `{name}`"),
            rest_offset + close + 1,
        ));
    }
    let fields = parse_fields(&rest[open + 1..close], rest_offset + open + 1)?;
    if fields.is_empty() {
        return Err(ParseError::new(
            format!("inline struct `{name}` must declare at least one field"),
            type_offset,
        ));
    }
    Ok(FieldKind::Inline {
        name: name.to_string(),
        fields,
    })
}

/// Validates a plain type spelling: an identifier path, optionally
/// `::`-separated. Everything the wire layout cannot express is fatal.
fn validate_plain_spelling(type_text: &str, offset: usize) -> Result<String, ParseError> {
    let spelling = normalize_spelling(type_text);

    for (construct, what) in [
        ("&", "references"),
        ("*", "raw pointers"),
        ("[", "arrays and slices"),
        ("dyn ", "trait objects"),
        ("impl ", "impl-trait types"),
        ("(", "tuples and function types"),
        ("<", "generic types other than `variant` and `union_`"),
    ] {
        if spelling.contains(construct) {
            return Err(ParseError::new(
                format!("unsupported field kind: {what} cannot have a fixed wire layout"),
                offset,
            ));
        }
    }
    match spelling.as_str() {
        "usize" | "isize" => {
            return Err(ParseError::new(
                "unsupported field kind: platform-width integers have no portable wire size",
                offset,
            ));
        }
        "i128" | "u128" => {
            return Err(ParseError::new(
                "unsupported field kind: 128-bit integers are not wire scalars",
                offset,
            ));
        }
        "char" | "str" | "String" => {
            return Err(ParseError::new(
                "unsupported field kind: text types are variable-length",
                offset,
            ));
        }
        _ => {}
    }

    let valid_path = spelling
        .split("::")
        .all(|seg| !seg.is_empty() && parse_identifier(seg, 0).is_ok_and(|(id, end)| id.len() == seg.len() && end == seg.len()));
    if !valid_path {
        return Err(ParseError::new(
            format!("unsupported field kind: `{spelling}` is not a type name"),
            offset,
        ));
    }
    Ok(spelling)
}

/// Collapses whitespace runs so `my :: Type` and `my::Type` spell the
/// same type.
fn normalize_spelling(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            last_space = true;
            continue;
        }
        // Whitespace only separates tokens when both sides are idents.
        if last_space
            && out
                .chars()
                .next_back()
                .is_some_and(|p| p.is_ascii_alphanumeric() || p == '_')
            && (ch.is_ascii_alphanumeric() || ch == '_')
        {
            out.push(' ');
        }
        last_space = false;
        out.push(ch);
    }
    out
}
