//! Canonical form of graph documents
//!
//! Two semantically equal documents serialize to identical bytes no matter
//! the insertion order of object keys, graph objects, relations or
//! identifiers. The canonical bytes are the input to every hash and
//! signature the engine produces.

mod graph;
mod json;

pub use graph::{canonical_graph, canonicalize, format_graph, graph_hash, sort_graph, sorted_graph};
pub use json::{content_hash, to_canonical_bytes, to_canonical_string};
