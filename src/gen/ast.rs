//! # Schema AST
//!
//! Data model for tagged structs between the scanner and the emitter:
//! ordered fields, each with a kind, an optional default expression, and
//! the source offset for diagnostics.
//!
//! Analysis turns raw scanned blocks into an emit-ready model:
//!
//! 1. inline nested records are lifted into synthesized helper structs
//!    with deterministic path-derived names;
//! 2. field type spellings naming another tagged struct are reclassified
//!    from scalar to record (same for variant/union alternatives);
//! 3. every struct gets its 64-bit schema hash.
//!
//! ## Schema hash
//!
//! The hash folds the record name and, per field, the kind tag, the type
//! spelling, the primitive wire width (0 for enums and PODs, which the
//! spelling distinguishes), and the field name into a SHA-256 digest
//! truncated to its first 8 bytes (little-endian). Nested records contribute their own
//! hash recursively, so editing a nested struct's fields changes every
//! record embedding it. Defaults are excluded: they affect initialization,
//! not the wire image. Renaming, reordering, or retyping any field, or
//! reordering variant alternatives, changes the hash.

use hashbrown::{HashMap, HashSet};
use sha2::{Digest, Sha256};
use smallvec::SmallVec;

use crate::gen::scan::primitive_width;
use crate::gen::ParseError;

/// One alternative of a `variant<...>` or `union_<...>` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alt {
    pub spelling: String,
    pub is_record: bool,
}

/// Alternative lists are short in practice; keep them inline.
pub type AltList = SmallVec<[Alt; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A primitive, enum, or gated POD, by spelling. May be reclassified
    /// to `Record` during analysis.
    Scalar { spelling: String },
    /// Another tagged struct embedded by value.
    Record { spelling: String },
    /// Tagged sum: 4-byte discriminant plus max-sized payload.
    Variant { alts: AltList },
    /// Untagged overlay: max-sized payload, caller tracks the live arm.
    Union { alts: AltList },
    /// An inline `struct Name { ... }` field type; lifted into a helper
    /// record during analysis.
    Inline { name: String, fields: Vec<Field> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    /// Declared default expression, verbatim.
    pub default: Option<String>,
    /// Byte offset of the declaration in the schema source.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStruct {
    pub name: String,
    pub fields: Vec<Field>,
    /// Byte range of the tagged block in the source (attribute through
    /// closing brace); the emitter splices the replacement here.
    pub span: (usize, usize),
}

/// One tagged block ready to emit: synthesized helpers first, then the
/// declared struct, all sharing the block's source span.
#[derive(Debug, Clone)]
pub struct EmitUnit {
    pub span: (usize, usize),
    pub structs: Vec<SchemaStruct>,
}

/// Fully analyzed schema: emit units in source order plus the hash of
/// every record name.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    pub units: Vec<EmitUnit>,
    pub hashes: HashMap<String, u64>,
}

/// Lifts inline records, classifies fields, and computes schema hashes.
pub fn analyze(blocks: Vec<SchemaStruct>) -> Result<SchemaModel, ParseError> {
    let mut units = Vec::with_capacity(blocks.len());
    let mut names: HashSet<String> = HashSet::new();

    for block in blocks {
        let span = block.span;
        let mut structs = Vec::new();
        let lifted = lift_inline_records(block, &mut structs)?;
        structs.push(lifted);

        for s in &structs {
            if !names.insert(s.name.clone()) {
                return Err(ParseError::new(
                    format!("duplicate record name `{}`", s.name),
                    span.0,
                ));
            }
        }
        units.push(EmitUnit { span, structs });
    }

    for unit in &mut units {
        for s in &mut unit.structs {
            classify_fields(&mut s.fields, &names);
        }
    }

    let by_name: HashMap<&str, &SchemaStruct> = units
        .iter()
        .flat_map(|u| u.structs.iter())
        .map(|s| (s.name.as_str(), s))
        .collect();

    let mut hashes = HashMap::new();
    let mut visiting = HashSet::new();
    for unit in &units {
        for s in &unit.structs {
            hash_of(&s.name, &by_name, &mut hashes, &mut visiting)?;
        }
    }
    drop(by_name);

    Ok(SchemaModel { units, hashes })
}

/// Replaces every `Inline` field with a reference to a synthesized helper
/// struct named `{path}{InlineName}`, recursively. Helpers land in `out`
/// innermost-first so every struct is emitted before its first use.
fn lift_inline_records(
    mut block: SchemaStruct,
    out: &mut Vec<SchemaStruct>,
) -> Result<SchemaStruct, ParseError> {
    let span = block.span;
    let prefix = block.name.clone();
    for field in &mut block.fields {
        if let FieldKind::Inline { name, fields } = &mut field.kind {
            let helper_name = format!("{prefix}{name}");
            let helper = SchemaStruct {
                name: helper_name.clone(),
                fields: std::mem::take(fields),
                span,
            };
            let helper = lift_inline_records(helper, out)?;
            out.push(helper);
            field.kind = FieldKind::Record {
                spelling: helper_name,
            };
        }
    }
    Ok(block)
}

fn classify_fields(fields: &mut [Field], names: &HashSet<String>) {
    for field in fields {
        match &mut field.kind {
            FieldKind::Scalar { spelling } => {
                if names.contains(spelling.as_str()) {
                    let spelling = std::mem::take(spelling);
                    field.kind = FieldKind::Record { spelling };
                }
            }
            FieldKind::Variant { alts } | FieldKind::Union { alts } => {
                for alt in alts {
                    alt.is_record = names.contains(alt.spelling.as_str());
                }
            }
            FieldKind::Record { .. } | FieldKind::Inline { .. } => {}
        }
    }
}

/// Memoized recursive schema hash. By-value nesting cannot legally cycle,
/// so a revisit while in progress is reported as an error instead of
/// recursing forever.
fn hash_of(
    name: &str,
    by_name: &HashMap<&str, &SchemaStruct>,
    memo: &mut HashMap<String, u64>,
    visiting: &mut HashSet<String>,
) -> Result<u64, ParseError> {
    if let Some(hash) = memo.get(name) {
        return Ok(*hash);
    }
    let block = by_name[name];
    if !visiting.insert(name.to_string()) {
        return Err(ParseError::new(
            format!("record `{name}` contains itself by value"),
            block.span.0,
        ));
    }

    let mut parts: Vec<String> = vec![block.name.clone()];
    for field in &block.fields {
        match &field.kind {
            FieldKind::Scalar { spelling } => {
                // Primitive widths are known at generation time; enums and
                // PODs contribute width 0 and are distinguished by spelling.
                let width = primitive_width(spelling).unwrap_or(0);
                parts.push(format!("scalar:{spelling}:{width}:{}", field.name));
            }
            FieldKind::Record { spelling } => {
                let nested = hash_of(spelling, by_name, memo, visiting)?;
                parts.push(format!("record:{spelling}:{}:{nested:016x}", field.name));
            }
            FieldKind::Variant { alts } => {
                parts.push(format!("variant:{}", field.name));
                push_alt_parts(alts, by_name, memo, visiting, &mut parts)?;
            }
            FieldKind::Union { alts } => {
                parts.push(format!("union:{}", field.name));
                push_alt_parts(alts, by_name, memo, visiting, &mut parts)?;
            }
            FieldKind::Inline { .. } => {
                // Lifted before hashing.
                unreachable!("inline records are lifted during analysis");
            }
        }
    }

    let digest = Sha256::digest(parts.join("\n").as_bytes());
    let mut first = [0u8; 8];
    first.copy_from_slice(&digest[..8]);
    let hash = u64::from_le_bytes(first);

    visiting.remove(name);
    memo.insert(name.to_string(), hash);
    Ok(hash)
}

fn push_alt_parts(
    alts: &AltList,
    by_name: &HashMap<&str, &SchemaStruct>,
    memo: &mut HashMap<String, u64>,
    visiting: &mut HashSet<String>,
    parts: &mut Vec<String>,
) -> Result<(), ParseError> {
    for alt in alts {
        let nested = if alt.is_record {
            hash_of(&alt.spelling, by_name, memo, visiting)?
        } else {
            0
        };
        let width = if alt.is_record {
            0
        } else {
            primitive_width(&alt.spelling).unwrap_or(0)
        };
        parts.push(format!(
            "alt:{}:{}:{width}:{nested:016x}",
            alt.spelling, alt.is_record as u8
        ));
    }
    Ok(())
}
