//! Private-data committer: hashes private payloads into the graph and
//! produces the public (stripped) and holder (hidden) forms of a graph

use super::blocks;
use crate::canonical::to_canonical_bytes;
use crate::config::PrivateDataConfig;
use crate::merkle::MerkleTree;
use crate::model::{GraphObject, Hash, PrivateDataObject};
use crate::{Error, Result};
use serde_json::Value;
use tracing::debug;

/// Location of a private-data object inside a graph
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrivateSlot<'a> {
    pub object_id: &'a str,
    pub property: &'a str,
    pub index: usize,
}

impl std::fmt::Display for PrivateSlot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.properties.{}[{}]", self.object_id, self.property, self.index)
    }
}

/// Computes private-data hashes with a fixed block configuration
#[derive(Clone, Debug)]
pub struct PrivateDataCommitter {
    config: PrivateDataConfig,
}

impl PrivateDataCommitter {
    pub fn new(config: PrivateDataConfig) -> Result<Self> {
        config.validate()?;
        Ok(PrivateDataCommitter { config })
    }

    pub fn config(&self) -> &PrivateDataConfig {
        &self.config
    }

    /// Canonical serialization of the object's payload
    pub fn payload_bytes(&self, object: &PrivateDataObject) -> Result<Vec<u8>> {
        let data = object.payload().ok_or_else(|| {
            Error::EmptyPrivateObject("private object has no data".into())
        })?;
        to_canonical_bytes(data)
    }

    /// Commitment tree over the blocked payload
    pub fn tree(&self, object: &PrivateDataObject) -> Result<MerkleTree> {
        let payload = self.payload_bytes(object)?;
        Ok(MerkleTree::build(blocks::split_leaves(&payload, &self.config)?))
    }

    /// Root of the commitment tree
    pub fn hash(&self, object: &PrivateDataObject) -> Result<Hash> {
        Ok(self.tree(object)?.root())
    }

    /// Copy of `object` with `private_data_hash` set
    pub fn commit(&self, object: &PrivateDataObject) -> Result<PrivateDataObject> {
        let hash = self.hash(object)?;
        Ok(PrivateDataObject {
            private_data_hash: Some(hash),
            ..object.clone()
        })
    }

    /// Attach hashes to every private-data object in the graph
    ///
    /// Entries that were already stripped (hash but no data) are kept as
    /// they are; entries with neither fail with `EmptyPrivateObject`.
    pub fn commit_graph(&self, graph: &[GraphObject]) -> Result<Vec<GraphObject>> {
        self.map_private(graph, |slot, object| {
            if object.payload().is_some() {
                let committed = self.commit(&object)?;
                debug!(slot = %slot, hash = ?committed.private_data_hash, "committed private data");
                Ok(committed)
            } else if object.private_data_hash.is_some() {
                Ok(object)
            } else {
                Err(Error::EmptyPrivateObject(format!("{} has no data", slot)))
            }
        })
    }

    /// Public form: `isPrivate` and `data` removed from every entry
    pub fn strip_graph(&self, graph: &[GraphObject]) -> Result<Vec<GraphObject>> {
        self.map_private(graph, |_, object| Ok(object.stripped()))
    }

    /// Holder form: entries flagged private lose `data` but keep the flag
    pub fn hide_graph(&self, graph: &[GraphObject]) -> Result<Vec<GraphObject>> {
        self.map_private(graph, |_, object| Ok(object.hidden()))
    }

    /// Put a purchased payload back into the entry it was committed as
    ///
    /// The payload is hashed and must match a `private_data_hash` in the
    /// named graph object.
    pub fn restore_graph(
        &self,
        graph: &[GraphObject],
        object_id: &str,
        data: Value,
    ) -> Result<Vec<GraphObject>> {
        let hash = self.hash(&PrivateDataObject::new(data.clone()))?;
        let mut restored = false;
        let graph = self.map_private(graph, |slot, object| {
            if slot.object_id == object_id && object.private_data_hash == Some(hash) {
                restored = true;
                Ok(PrivateDataObject {
                    is_private: Some(true),
                    ..object.with_data(data.clone())
                })
            } else {
                Ok(object)
            }
        })?;
        if !restored {
            return Err(Error::DecodeValidation(format!(
                "no private entry in {} is committed to {}",
                object_id, hash
            )));
        }
        Ok(graph)
    }

    /// Ids of graph objects holding at least one entry flagged private
    pub fn private_object_ids(&self, graph: &[GraphObject]) -> Result<Vec<String>> {
        let mut ids: Vec<String> = Vec::new();
        self.map_private(graph, |slot, object| {
            if object.is_private() && !ids.iter().any(|id| id == slot.object_id) {
                ids.push(slot.object_id.to_string());
            }
            Ok(object)
        })?;
        Ok(ids)
    }

    /// Rebuild the graph, passing every private-data entry through `f`
    fn map_private<F>(&self, graph: &[GraphObject], mut f: F) -> Result<Vec<GraphObject>>
    where
        F: FnMut(&PrivateSlot<'_>, PrivateDataObject) -> Result<PrivateDataObject>,
    {
        let mut out = Vec::with_capacity(graph.len());
        for object in graph {
            // Objects without properties carry no private data and pass through
            // unchanged rather than failing the whole graph.
            let Some(properties) = object.properties.as_ref() else {
                out.push(object.clone());
                continue;
            };
            let mut new_properties = properties.clone();
            for (name, value) in properties {
                if !self.config.is_private_property(name) {
                    continue;
                }
                let entries = value.as_array().ok_or_else(|| {
                    Error::MalformedDocument(format!(
                        "{}.properties.{} is not an array",
                        object.id, name
                    ))
                })?;
                let mut new_entries = Vec::with_capacity(entries.len());
                for (index, entry) in entries.iter().enumerate() {
                    let slot = PrivateSlot {
                        object_id: &object.id,
                        property: name,
                        index,
                    };
                    let private = PrivateDataObject::from_value(entry)
                        .map_err(|e| Error::MalformedDocument(format!("{}: {}", slot, e)))?;
                    new_entries.push(serde_json::to_value(f(&slot, private)?)?);
                }
                new_properties.insert(name.clone(), Value::Array(new_entries));
            }
            out.push(GraphObject {
                properties: Some(new_properties),
                ..object.clone()
            });
        }
        Ok(out)
    }
}
