//! Dataset assembly: headers, distribution root hash, signing and the
//! full preparation pipeline

use super::signing::{recover_message, sign_message, Address};
use crate::canonical::{canonicalize, sort_graph, to_canonical_bytes};
use crate::config::EngineConfig;
use crate::merkle::{MerkleProof, MerkleTree};
use crate::model::{
    CreatorIdentifier, DataCreator, DataIntegrity, DatasetHeader, Document, GraphObject, Hash,
    Proof, Signature, ValidationSchema, DEFAULT_OTJSON_VERSION, ERC725_SCHEMA,
    ETHEREUM_SIGNATURE_TYPE, MERKLE_ROOT_SCHEMA,
};
use crate::private::PrivateDataCommitter;
use crate::{canonical, Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use k256::ecdsa::SigningKey;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// `@type` of a prepared dataset
pub const DATASET_TYPE: &str = "Dataset";

/// Descriptive header fields supplied by the publisher
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderInfo {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Defaults to "1.0"
    pub otjson_version: Option<String>,
    pub transpilation_info: Option<Value>,
}

impl HeaderInfo {
    /// Take the descriptive fields from an existing header
    pub fn from_header(header: &DatasetHeader) -> Self {
        HeaderInfo {
            title: header.dataset_title.clone(),
            description: header.dataset_description.clone(),
            tags: header.dataset_tags.clone(),
            otjson_version: Some(header.otjson_version.clone()).filter(|v| !v.is_empty()),
            transpilation_info: header.transpilation_info.clone(),
        }
    }
}

/// Builds, hashes, signs and verifies datasets under one configuration
#[derive(Clone, Debug)]
pub struct Assembler {
    config: EngineConfig,
    committer: PrivateDataCommitter,
}

impl Assembler {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let committer = PrivateDataCommitter::new(config.private_data.clone())?;
        Ok(Assembler { config, committer })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn committer(&self) -> &PrivateDataCommitter {
        &self.committer
    }

    /// Header stamped with the current time
    pub fn build_header(&self, info: &HeaderInfo) -> DatasetHeader {
        self.build_header_at(info, Utc::now())
    }

    pub fn build_header_at(&self, info: &HeaderInfo, created: DateTime<Utc>) -> DatasetHeader {
        let chain = &self.config.blockchain;
        let mut validation_schemas = BTreeMap::new();
        validation_schemas.insert(
            ERC725_SCHEMA.to_string(),
            ValidationSchema {
                schema_type: "ethereum-725".to_string(),
                network_id: chain.network_id.clone(),
                hub_contract_address: None,
                ..Default::default()
            },
        );
        validation_schemas.insert(
            MERKLE_ROOT_SCHEMA.to_string(),
            ValidationSchema {
                schema_type: "merkle-root".to_string(),
                network_id: chain.network_id.clone(),
                hub_contract_address: Some(chain.hub_contract_address.clone()),
                ..Default::default()
            },
        );

        DatasetHeader {
            otjson_version: info
                .otjson_version
                .clone()
                .unwrap_or_else(|| DEFAULT_OTJSON_VERSION.to_string()),
            dataset_creation_timestamp: created.to_rfc3339_opts(SecondsFormat::Millis, true),
            dataset_title: info.title.clone(),
            dataset_description: info.description.clone(),
            dataset_tags: info.tags.clone(),
            related_datasets: Vec::new(),
            validation_schemas,
            data_integrity: DataIntegrity {
                proofs: vec![Proof::merkle_root("")],
                ..Default::default()
            },
            data_creator: DataCreator {
                identifiers: vec![CreatorIdentifier::erc725(&self.config.erc725_identity)],
                ..Default::default()
            },
            transpilation_info: info.transpilation_info.clone(),
            ..Default::default()
        }
    }

    /// Copy with `otObject` fields normalized
    pub fn format(&self, document: &Document) -> Document {
        let mut formatted = document.clone();
        canonical::format_graph(&mut formatted.graph);
        formatted
    }

    /// Copy with `private_data_hash` attached to every private-data object
    pub fn commit_private(&self, document: &Document) -> Result<Document> {
        Ok(document.with_graph(self.committer.commit_graph(&document.graph)?))
    }

    /// Public copy: private payloads and flags removed, hashes kept
    pub fn strip_private(&self, document: &Document) -> Result<Document> {
        Ok(document.with_graph(self.committer.strip_graph(&document.graph)?))
    }

    /// Holder copy: private payloads removed, `isPrivate` kept
    pub fn hide_private(&self, document: &Document) -> Result<Document> {
        Ok(document.with_graph(self.committer.hide_graph(&document.graph)?))
    }

    pub fn private_object_ids(&self, document: &Document) -> Result<Vec<String>> {
        self.committer.private_object_ids(&document.graph)
    }

    /// SHA3-256 of the sorted, stripped graph; used as the dataset id
    pub fn public_graph_hash(&self, graph: &[GraphObject]) -> Result<Hash> {
        canonical::graph_hash(&self.committer.strip_graph(graph)?)
    }

    /// SHA3-256 of the sorted graph, private data included
    pub fn graph_hash(&self, graph: &[GraphObject]) -> Result<Hash> {
        canonical::graph_hash(graph)
    }

    /// Dataset summary: the first leaf of the distribution tree
    ///
    /// `graph` is expected to be stripped and sorted already.
    pub fn summary(&self, graph: &[GraphObject], dataset_id: &str, creator: &DataCreator) -> Value {
        let objects: Vec<Value> = graph
            .iter()
            .map(|object| {
                json!({
                    "@id": object.id,
                    "identifiers": object.identifiers_or_empty(),
                })
            })
            .collect();
        let num_relations: usize = graph.iter().map(GraphObject::relation_count).sum();

        json!({
            "datasetId": dataset_id,
            "datasetCreator": creator,
            "objects": objects,
            "numRelations": num_relations,
        })
    }

    /// Distribution tree with leaves `[summary, object_1, ..., object_n]`
    /// over the stripped, sorted graph
    pub fn distribution_tree(&self, document: &Document) -> Result<MerkleTree> {
        let (graph, summary) = self.distribution_parts(document)?;
        distribution_tree_over(&graph, &summary)
    }

    /// Root of the distribution tree
    pub fn root_hash(&self, document: &Document) -> Result<Hash> {
        let root = self.distribution_tree(document)?.root();
        debug!(dataset = ?document.id, root = %root, "computed dataset root hash");
        Ok(root)
    }

    /// Copy with the root hash written into the header's proof slot
    pub fn with_root_hash(&self, document: &Document) -> Result<Document> {
        let root = self.root_hash(document)?;
        let mut sealed = document.clone();
        if let Some(header) = sealed.header.as_mut() {
            header.set_proof_value(root.to_prefixed_hex());
        }
        Ok(sealed)
    }

    /// Recompute the root hash and compare it with the header's proof slot
    pub fn verify_root_hash(&self, document: &Document) -> Result<Hash> {
        let header = document
            .header
            .as_ref()
            .ok_or_else(|| Error::MalformedDocument("document has no dataset header".into()))?;
        let claimed = header
            .proof_value()
            .ok_or_else(|| Error::MalformedDocument("dataset header has no root hash".into()))?;
        let claimed: Hash = claimed.parse()?;

        let actual = self.root_hash(document)?;
        if actual != claimed {
            warn!(claimed = %claimed, actual = %actual, "dataset root hash mismatch");
            return Err(Error::InvalidHash(format!(
                "header claims {}, graph hashes to {}",
                claimed, actual
            )));
        }
        Ok(actual)
    }

    /// Inclusion proof for one graph object in the distribution tree
    pub fn object_proof(&self, document: &Document, object_id: &str) -> Result<MerkleProof> {
        let (graph, summary) = self.distribution_parts(document)?;
        let index = graph
            .iter()
            .position(|object| object.id == object_id)
            .ok_or_else(|| {
                Error::MalformedDocument(format!("no graph object with id {}", object_id))
            })?;
        let tree = distribution_tree_over(&graph, &summary)?;
        // Leaf 0 is the summary
        tree.proof(index + 1).ok_or_else(|| {
            Error::MalformedDocument(format!("no distribution leaf for {}", object_id))
        })
    }

    /// Sign the public canonical form of the document
    ///
    /// The returned document carries the signature and keeps the caller's
    /// private data; strip it before distributing.
    pub fn sign(&self, document: &Document, key: &SigningKey) -> Result<Document> {
        let message = self.signing_bytes(document)?;
        let value = sign_message(&message, key)?;
        info!(
            dataset = ?document.id,
            signer = %Address::from_signing_key(key),
            "signed dataset"
        );
        Ok(Document {
            signature: Some(Signature {
                value,
                signature_type: ETHEREUM_SIGNATURE_TYPE.to_string(),
            }),
            ..document.clone()
        })
    }

    /// Address that signed the document
    pub fn recover_signer(&self, document: &Document) -> Result<Address> {
        let signature = document
            .signature
            .as_ref()
            .ok_or_else(|| Error::InvalidSignature("document is not signed".into()))?;
        if signature.signature_type != ETHEREUM_SIGNATURE_TYPE {
            return Err(Error::InvalidSignature(format!(
                "unsupported signature type {}",
                signature.signature_type
            )));
        }
        recover_message(&self.signing_bytes(document)?, &signature.value)
    }

    /// Recover the signer and require it to be `expected`
    pub fn verify_signer(&self, document: &Document, expected: &Address) -> Result<()> {
        let signer = self.recover_signer(document)?;
        if signer != *expected {
            warn!(expected = %expected, actual = %signer, "dataset signer mismatch");
            return Err(Error::InvalidSignature(format!(
                "signed by {}, expected {}",
                signer, expected
            )));
        }
        Ok(())
    }

    /// Turn a raw document into a signed dataset
    ///
    /// Commits private data, derives the dataset id from the public graph
    /// hash, builds a fresh header (keeping any descriptive fields of the
    /// input header), records the root hash and signs.
    pub fn prepare(&self, document: &Document, key: &SigningKey) -> Result<Document> {
        self.prepare_at(document, key, Utc::now())
    }

    pub fn prepare_at(
        &self,
        document: &Document,
        key: &SigningKey,
        created: DateTime<Utc>,
    ) -> Result<Document> {
        let graph = self.committer.commit_graph(&document.graph)?;
        let id = self.public_graph_hash(&graph)?;
        let info = document
            .header
            .as_ref()
            .map(HeaderInfo::from_header)
            .unwrap_or_default();

        let dataset = Document {
            id: Some(id.to_prefixed_hex()),
            document_type: Some(DATASET_TYPE.to_string()),
            header: Some(self.build_header_at(&info, created)),
            graph,
            ..Default::default()
        };
        let dataset = self.with_root_hash(&dataset)?;
        info!(
            dataset = %id,
            objects = dataset.graph.len(),
            root = ?dataset.header.as_ref().and_then(|h| h.proof_value()),
            "prepared dataset"
        );
        self.sign(&dataset, key)
    }

    /// Canonical bytes that are signed: stripped graph, no signature
    fn signing_bytes(&self, document: &Document) -> Result<Vec<u8>> {
        let mut working = self.strip_private(document)?;
        working.signature = None;
        canonicalize(&working)
    }

    fn distribution_parts(&self, document: &Document) -> Result<(Vec<GraphObject>, Value)> {
        let dataset_id = document
            .id
            .as_deref()
            .ok_or_else(|| Error::MalformedDocument("dataset has no @id".into()))?;
        let header = document
            .header
            .as_ref()
            .ok_or_else(|| Error::MalformedDocument("document has no dataset header".into()))?;

        let mut graph = self.committer.strip_graph(&document.graph)?;
        sort_graph(&mut graph)?;
        let summary = self.summary(&graph, dataset_id, &header.data_creator);
        Ok((graph, summary))
    }
}

fn distribution_tree_over(graph: &[GraphObject], summary: &Value) -> Result<MerkleTree> {
    let mut leaves = Vec::with_capacity(graph.len() + 1);
    leaves.push(to_canonical_bytes(summary)?);
    for object in graph {
        leaves.push(to_canonical_bytes(object)?);
    }
    Ok(MerkleTree::from_data(leaves))
}
