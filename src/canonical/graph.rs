//! Deterministic ordering of graph documents

use super::{content_hash, to_canonical_bytes};
use crate::model::{Document, GraphObject, Hash, DEFAULT_DIRECTION};
use crate::Result;
use serde::Serialize;

/// Normalize empty fields of `otObject` graph objects, in place:
/// absent `identifiers`/`relations` become `[]`, an empty `properties`
/// map is removed, and relations get `direction: "direct"` when unset.
pub fn format_graph(graph: &mut [GraphObject]) {
    for object in graph.iter_mut().filter(|o| o.is_ot_object()) {
        if object.identifiers.is_none() {
            object.identifiers = Some(Vec::new());
        }
        if object.properties.as_ref().is_some_and(|p| p.is_empty()) {
            object.properties = None;
        }
        for relation in object.relations.get_or_insert_with(Vec::new).iter_mut() {
            if relation.direction.is_none() {
                relation.direction = Some(DEFAULT_DIRECTION.to_string());
            }
        }
    }
}

/// Sort a graph in place
///
/// Each object's `relations` and `identifiers` are ordered by content hash;
/// objects are ordered by `@id`. Objects without an id keep their slot.
pub fn sort_graph(graph: &mut [GraphObject]) -> Result<()> {
    for object in graph.iter_mut() {
        if let Some(relations) = object.relations.as_mut() {
            sort_by_content_hash(relations)?;
        }
        if let Some(identifiers) = object.identifiers.as_mut() {
            sort_by_content_hash(identifiers)?;
        }
    }

    let slots: Vec<usize> = graph
        .iter()
        .enumerate()
        .filter(|(_, o)| !o.id.is_empty())
        .map(|(i, _)| i)
        .collect();
    let mut identified: Vec<GraphObject> = slots
        .iter()
        .map(|&i| std::mem::take(&mut graph[i]))
        .collect();
    identified.sort_by(|a, b| a.id.cmp(&b.id));
    for (slot, object) in slots.into_iter().zip(identified) {
        graph[slot] = object;
    }
    Ok(())
}

/// Sorted copy of a graph
pub fn sorted_graph(graph: &[GraphObject]) -> Result<Vec<GraphObject>> {
    let mut sorted = graph.to_vec();
    sort_graph(&mut sorted)?;
    Ok(sorted)
}

/// Canonical bytes of a graph after sorting
pub fn canonical_graph(graph: &[GraphObject]) -> Result<Vec<u8>> {
    to_canonical_bytes(&sorted_graph(graph)?)
}

/// Canonical bytes of a whole document (header and signature included)
pub fn canonicalize(document: &Document) -> Result<Vec<u8>> {
    let sorted = document.with_graph(sorted_graph(&document.graph)?);
    to_canonical_bytes(&sorted)
}

/// SHA3-256 of the sorted, canonical graph
pub fn graph_hash(graph: &[GraphObject]) -> Result<Hash> {
    Ok(Hash::sha3(&canonical_graph(graph)?))
}

fn sort_by_content_hash<T: Serialize>(items: &mut Vec<T>) -> Result<()> {
    // Keys are computed up front so a failure leaves `items` untouched.
    let keys = items
        .iter()
        .map(|item| content_hash(item))
        .collect::<Result<Vec<_>>>()?;
    let mut keyed: Vec<(Hash, T)> = keys.into_iter().zip(items.drain(..)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    items.extend(keyed.into_iter().map(|(_, item)| item));
    Ok(())
}
