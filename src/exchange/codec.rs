//! Fair-exchange codec: commit-then-reveal over a private payload's tree

use super::ExchangeKey;
use crate::config::PrivateDataConfig;
use crate::merkle::{node_count_for, MerkleTree};
use crate::model::{Hash, PrivateDataObject};
use crate::private::{blocks, PrivateDataCommitter};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Everything a seller produces for one sale, key included
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    #[serde(rename = "private_data_original_length")]
    pub original_payload_length: usize,
    #[serde(rename = "private_data_array_length")]
    pub first_level_block_count: usize,
    pub key: ExchangeKey,
    #[serde(rename = "encoded_data")]
    pub encoded_array: Vec<Hash>,
    pub private_data_root_hash: Hash,
    pub encoded_data_root_hash: Hash,
}

impl Commitment {
    /// The key-less part that is sent to a buyer before payment
    pub fn offer(&self) -> CommitmentOffer {
        CommitmentOffer {
            original_payload_length: self.original_payload_length,
            first_level_block_count: self.first_level_block_count,
            encoded_array: self.encoded_array.clone(),
            private_data_root_hash: self.private_data_root_hash,
            encoded_data_root_hash: self.encoded_data_root_hash,
        }
    }
}

/// A commitment as seen by a buyer: verifiable, but opaque without the key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentOffer {
    #[serde(rename = "private_data_original_length")]
    pub original_payload_length: usize,
    #[serde(rename = "private_data_array_length")]
    pub first_level_block_count: usize,
    #[serde(rename = "encoded_data")]
    pub encoded_array: Vec<Hash>,
    pub private_data_root_hash: Hash,
    pub encoded_data_root_hash: Hash,
}

/// Encodes private objects for sale and decodes them once the key is known
#[derive(Clone, Debug)]
pub struct ExchangeCodec {
    committer: PrivateDataCommitter,
}

impl ExchangeCodec {
    pub fn new(config: PrivateDataConfig) -> Result<Self> {
        Ok(ExchangeCodec {
            committer: PrivateDataCommitter::new(config)?,
        })
    }

    fn config(&self) -> &PrivateDataConfig {
        self.committer.config()
    }

    /// Encode with a freshly generated key
    pub fn encode(&self, object: &PrivateDataObject) -> Result<Commitment> {
        self.encode_with_key(object, ExchangeKey::generate())
    }

    /// Encode with a caller-supplied key
    ///
    /// Every node of the private-data tree, leaves first and left to right,
    /// is XORed with the pad for its running index. The encoded array gets
    /// its own tree, whose root can be checked without the key. An object
    /// that already carries a `private_data_hash` must hash to it.
    pub fn encode_with_key(&self, object: &PrivateDataObject, key: ExchangeKey) -> Result<Commitment> {
        let payload = self.committer.payload_bytes(object)?;
        let tree = MerkleTree::build(blocks::split_leaves(&payload, self.config())?);
        if let Some(published) = object.private_data_hash {
            if published != tree.root() {
                warn!(published = %published, actual = %tree.root(), "private data does not match its hash");
                return Err(Error::DecodeValidation(format!(
                    "private data hashes to {}, object is committed to {}",
                    tree.root(),
                    published
                )));
            }
        }
        let encoded_array = key.blind(tree.nodes());
        let encoded_root = MerkleTree::build(encoded_array.clone()).root();

        debug!(
            leaves = tree.leaf_count(),
            nodes = encoded_array.len(),
            private_root = %tree.root(),
            encoded_root = %encoded_root,
            "encoded private data"
        );

        Ok(Commitment {
            original_payload_length: payload.len(),
            first_level_block_count: tree.leaf_count(),
            key,
            encoded_array,
            private_data_root_hash: tree.root(),
            encoded_data_root_hash: encoded_root,
        })
    }

    /// Check an offer's structure before paying for it
    ///
    /// The encoded root must match the encoded array, and the array must
    /// be exactly the size of a tree over the announced number of leaves.
    pub fn verify_offer(&self, offer: &CommitmentOffer) -> Result<()> {
        let expected_leaves = blocks::block_count(offer.original_payload_length, self.config());
        if offer.first_level_block_count != expected_leaves {
            return Err(Error::DecodeValidation(format!(
                "{}-byte payload should have {} leaf blocks, offer announces {}",
                offer.original_payload_length, expected_leaves, offer.first_level_block_count
            )));
        }
        if offer.first_level_block_count > offer.encoded_array.len() {
            return Err(Error::DecodeValidation(format!(
                "{} leaf blocks announced for {} encoded nodes",
                offer.first_level_block_count,
                offer.encoded_array.len()
            )));
        }
        let expected_nodes = node_count_for(offer.first_level_block_count);
        if offer.encoded_array.len() != expected_nodes {
            return Err(Error::DecodeValidation(format!(
                "expected {} encoded nodes, got {}",
                expected_nodes,
                offer.encoded_array.len()
            )));
        }
        let root = MerkleTree::build(offer.encoded_array.clone()).root();
        if root != offer.encoded_data_root_hash {
            warn!(expected = %offer.encoded_data_root_hash, actual = %root, "encoded root mismatch");
            return Err(Error::DecodeValidation(format!(
                "encoded root {} does not match announced {}",
                root, offer.encoded_data_root_hash
            )));
        }
        Ok(())
    }

    /// Unblind the encoded array and rebuild the payload
    ///
    /// The recovered leaves are re-hashed into a tree and every recovered
    /// internal node must equal its recomputed counterpart, which also
    /// catches a wrong key.
    pub fn decode(
        &self,
        encoded_array: &[Hash],
        key: &ExchangeKey,
        first_level_block_count: usize,
        original_length: usize,
    ) -> Result<Value> {
        let tree = self.recover_tree(encoded_array, key, first_level_block_count)?;
        let payload = blocks::join(tree.leaves(), original_length, self.config())?;
        serde_json::from_slice(&payload)
            .map_err(|e| Error::DecodeValidation(format!("payload is not valid JSON: {}", e)))
    }

    /// Like [`decode`](Self::decode), and the recovered tree's root must
    /// equal the published `private_data_root_hash`
    pub fn decode_verified(
        &self,
        encoded_array: &[Hash],
        key: &ExchangeKey,
        first_level_block_count: usize,
        original_length: usize,
        expected_root: &Hash,
    ) -> Result<Value> {
        let tree = self.recover_tree(encoded_array, key, first_level_block_count)?;
        if tree.root() != *expected_root {
            warn!(expected = %expected_root, actual = %tree.root(), "private root mismatch");
            return Err(Error::DecodeValidation(format!(
                "recovered root {} does not match published {}",
                tree.root(),
                expected_root
            )));
        }
        let payload = blocks::join(tree.leaves(), original_length, self.config())?;
        serde_json::from_slice(&payload)
            .map_err(|e| Error::DecodeValidation(format!("payload is not valid JSON: {}", e)))
    }

    /// Decode a verified offer with the revealed key
    pub fn decode_offer(&self, offer: &CommitmentOffer, key: &ExchangeKey) -> Result<Value> {
        self.verify_offer(offer)?;
        self.decode_verified(
            &offer.encoded_array,
            key,
            offer.first_level_block_count,
            offer.original_payload_length,
            &offer.private_data_root_hash,
        )
    }

    fn recover_tree(
        &self,
        encoded_array: &[Hash],
        key: &ExchangeKey,
        first_level_block_count: usize,
    ) -> Result<MerkleTree> {
        if first_level_block_count == 0 || first_level_block_count > encoded_array.len() {
            return Err(Error::DecodeValidation(format!(
                "{} leaf blocks announced for {} encoded nodes",
                first_level_block_count,
                encoded_array.len()
            )));
        }
        let recovered = key.blind(encoded_array);
        let tree = MerkleTree::build(recovered[..first_level_block_count].to_vec());

        if tree.node_count() != recovered.len() {
            return Err(Error::DecodeValidation(format!(
                "expected {} encoded nodes, got {}",
                tree.node_count(),
                recovered.len()
            )));
        }
        if let Some(index) = tree
            .nodes()
            .zip(&recovered)
            .position(|(computed, revealed)| computed != revealed)
        {
            warn!(index, "recovered node does not match recomputed tree");
            return Err(Error::DecodeValidation(format!(
                "node {} does not match the recomputed tree",
                index
            )));
        }
        Ok(tree)
    }
}
