//! Inclusion proofs

use super::tree::hash_pair;
use crate::model::Hash;
use serde::{Deserialize, Serialize};

/// One sibling on the path from a leaf to the root
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: Hash,
    /// True if the sibling is the left input of the parent hash
    pub sibling_is_left: bool,
}

/// Merkle inclusion proof for a single leaf
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf: Hash,
    pub index: usize,
    pub path: Vec<ProofStep>,
}

impl MerkleProof {
    /// Recompute the root from the leaf and path and compare
    pub fn verify(&self, root: &Hash) -> bool {
        self.computed_root() == *root
    }

    pub fn computed_root(&self) -> Hash {
        self.path.iter().fold(self.leaf, |current, step| {
            if step.sibling_is_left {
                hash_pair(&step.sibling, &current)
            } else {
                hash_pair(&current, &step.sibling)
            }
        })
    }
}
