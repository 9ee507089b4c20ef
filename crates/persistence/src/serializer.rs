// ---------------------------------------------------------------------------
// Serializer: snapshot <-> stored text
// ---------------------------------------------------------------------------
//
// Write path:
//   Snapshot graph --flatten (visited set, "[Circular]" sentinel)--> JSON value
//     --> pretty canonical text --> strip insignificant whitespace
//     --> envelope (magic, version, checksum)
//
// Read path:
//   envelope check --> JSON parse --> header fields --> sections imported into
//   a fresh arena
//
// The compaction step is a whitespace stripper, not a real compressor. The
// ratio it reports is (uncompressed - compressed) / uncompressed over the
// canonical and compacted JSON texts.

use std::collections::HashSet;

use game_state::{Node, NodeId, Section, ValueGraph};
use serde_json::{Map, Value};

use crate::envelope::{unwrap_header, wrap_with_header, UnwrapResult};
use crate::save_error::SaveError;
use crate::save_types::*;

/// Written in place of a composite node that was already serialized.
pub const CIRCULAR_SENTINEL: &str = "[Circular]";

/// Result of serializing one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSnapshot {
    /// Enveloped, compacted text ready for the store.
    pub text: String,
    /// Length of the canonical (pretty) JSON text.
    pub uncompressed_len: usize,
    /// Length of the compacted JSON payload (envelope excluded).
    pub compressed_len: usize,
    pub compression_ratio: f64,
    /// Composite nodes replaced by the circular sentinel.
    pub cycles_broken: u32,
    /// Composite nodes replaced by the depth sentinel.
    pub depth_truncated: u32,
}

/// `(uncompressed - compressed) / uncompressed`, or 0 for empty input.
pub fn compression_ratio(uncompressed_len: usize, compressed_len: usize) -> f64 {
    if uncompressed_len == 0 {
        return 0.0;
    }
    (uncompressed_len as f64 - compressed_len as f64) / uncompressed_len as f64
}

/// Written in place of a composite node nested deeper than
/// [`MAX_SECTION_DEPTH`].
pub const DEPTH_SENTINEL: &str = "[MaxDepth]";

/// Deepest composite nesting kept inside one section. The section sits one
/// level below the snapshot object and the parser refuses input nested
/// beyond 128 levels, so anything deeper would save but never load again.
pub const MAX_SECTION_DEPTH: usize = 100;

/// Nodes replaced while flattening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenCounts {
    /// Composite nodes already emitted (shared or cyclic references).
    pub cycles: u32,
    /// Composite nodes cut at [`MAX_SECTION_DEPTH`].
    pub truncated: u32,
}

/// Flatten the subgraph at `id` into a JSON value.
///
/// `visited` holds every composite node already emitted; meeting one again
/// yields the circular sentinel. Composites nested deeper than
/// `MAX_SECTION_DEPTH` yield the depth sentinel. Dangling ids become `null`.
pub fn flatten(
    graph: &ValueGraph,
    id: NodeId,
    visited: &mut HashSet<NodeId>,
    counts: &mut FlattenCounts,
) -> Value {
    flatten_at(graph, id, 1, visited, counts)
}

fn flatten_at(
    graph: &ValueGraph,
    id: NodeId,
    depth: usize,
    visited: &mut HashSet<NodeId>,
    counts: &mut FlattenCounts,
) -> Value {
    let Some(node) = graph.node(id) else {
        return Value::Null;
    };
    if node.is_composite() {
        if depth > MAX_SECTION_DEPTH {
            counts.truncated += 1;
            return Value::String(DEPTH_SENTINEL.to_string());
        }
        if !visited.insert(id) {
            counts.cycles += 1;
            return Value::String(CIRCULAR_SENTINEL.to_string());
        }
    }
    match node {
        Node::Null => Value::Null,
        Node::Bool(b) => Value::Bool(*b),
        Node::Number(n) => Value::Number(n.clone()),
        Node::Text(s) => Value::String(s.clone()),
        Node::List(children) => Value::Array(
            children
                .iter()
                .map(|child| flatten_at(graph, *child, depth + 1, visited, counts))
                .collect(),
        ),
        Node::Map(entries) => {
            let mut out = Map::new();
            for (key, child) in entries {
                let value = flatten_at(graph, *child, depth + 1, visited, counts);
                out.insert(key.clone(), value);
            }
            Value::Object(out)
        }
    }
}

/// The whole snapshot as one JSON object, plus what flattening replaced.
pub fn snapshot_to_value(snapshot: &Snapshot) -> (Value, FlattenCounts) {
    let mut visited = HashSet::new();
    let mut counts = FlattenCounts::default();
    let mut out = Map::new();

    out.insert(FIELD_VERSION.to_string(), Value::from(snapshot.version));
    if let Some(ts) = snapshot.timestamp {
        out.insert(FIELD_TIMESTAMP.to_string(), Value::from(ts));
    }
    out.insert(
        FIELD_SAVE_TYPE.to_string(),
        Value::from(snapshot.save_type.as_str()),
    );
    if snapshot.save_type == SaveType::Incremental {
        let names = snapshot
            .changes
            .iter()
            .map(|s| Value::from(s.name()))
            .collect();
        out.insert(FIELD_CHANGES.to_string(), Value::Array(names));
    }
    for (section, root) in snapshot.sections() {
        let value = flatten(&snapshot.graph, root, &mut visited, &mut counts);
        out.insert(section.name().to_string(), value);
    }

    (Value::Object(out), counts)
}

/// One section flattened on its own. Cycles inside it become sentinels.
pub fn section_value(snapshot: &Snapshot, section: Section) -> Option<Value> {
    let root = snapshot.section(section)?;
    let mut visited = HashSet::new();
    let mut counts = FlattenCounts::default();
    Some(flatten(&snapshot.graph, root, &mut visited, &mut counts))
}

/// Serialize a snapshot into enveloped, compacted text.
pub fn serialize(snapshot: &Snapshot) -> Result<EncodedSnapshot, SaveError> {
    let (value, counts) = snapshot_to_value(snapshot);
    let canonical = serde_json::to_string_pretty(&value)?;
    let compact = strip_insignificant_whitespace(&canonical);

    Ok(EncodedSnapshot {
        uncompressed_len: canonical.len(),
        compressed_len: compact.len(),
        compression_ratio: compression_ratio(canonical.len(), compact.len()),
        cycles_broken: counts.cycles,
        depth_truncated: counts.truncated,
        text: wrap_with_header(&compact),
    })
}

/// Remove whitespace outside string literals. String and key contents,
/// including escaped quotes, are copied untouched.
pub fn strip_insignificant_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ' ' | '\n' | '\r' | '\t' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Parse enveloped stored text.
///
/// # Errors
///
/// `SaveError::Parse` when the envelope is missing, damaged or fails its
/// checksum, or when the payload is not a snapshot object.
pub fn deserialize(text: &str) -> Result<Snapshot, SaveError> {
    match unwrap_header(text).map_err(SaveError::Parse)? {
        UnwrapResult::WithHeader { payload, .. } => deserialize_raw(payload),
        UnwrapResult::Legacy(_) => Err(SaveError::Parse(format!(
            "missing save envelope ({} bytes)",
            text.len()
        ))),
    }
}

/// Parse a bare JSON payload with no envelope.
///
/// Header rules:
/// - `_version` absent: 0 (unversioned)
/// - `_saveType` absent: full
/// - `_changes` names that are not sections are dropped
pub fn deserialize_raw(text: &str) -> Result<Snapshot, SaveError> {
    let value: Value = serde_json::from_str(text.trim())?;
    let Value::Object(fields) = value else {
        return Err(SaveError::Parse(
            "snapshot payload is not a JSON object".to_string(),
        ));
    };

    let version = match fields.get(FIELD_VERSION) {
        None => 0,
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| SaveError::Parse(format!("invalid {FIELD_VERSION}: {v}")))?,
    };
    let timestamp = fields.get(FIELD_TIMESTAMP).and_then(Value::as_u64);
    let save_type = match fields.get(FIELD_SAVE_TYPE) {
        None => SaveType::Full,
        Some(v) => v
            .as_str()
            .and_then(SaveType::from_name)
            .ok_or_else(|| SaveError::Parse(format!("invalid {FIELD_SAVE_TYPE}: {v}")))?,
    };

    let mut snapshot = Snapshot::new(save_type, timestamp);
    snapshot.version = version;

    if let Some(Value::Array(names)) = fields.get(FIELD_CHANGES) {
        let mut changes: Vec<Section> = names
            .iter()
            .filter_map(Value::as_str)
            .filter_map(Section::from_name)
            .collect();
        changes.sort();
        changes.dedup();
        snapshot.changes = changes;
    }

    for (key, value) in &fields {
        if let Some(section) = Section::from_name(key) {
            let root = snapshot.graph.import(value);
            snapshot.set_section(section, root);
        } else if !is_header_field(key) {
            snapshot.unknown_fields.push(key.clone());
        }
    }

    Ok(snapshot)
}

fn is_header_field(key: &str) -> bool {
    matches!(
        key,
        FIELD_VERSION | FIELD_TIMESTAMP | FIELD_SAVE_TYPE | FIELD_CHANGES
    )
}
