//! Level-by-level binary Merkle tree

use super::{MerkleProof, ProofStep};
use crate::model::Hash;

/// Hash of an internal node: Keccak-256(left || right)
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    Hash::keccak_many(&[&left.as_bytes()[..], &right.as_bytes()[..]])
}

/// Root of a tree with no leaves: Keccak-256 of the empty string
pub fn empty_root() -> Hash {
    Hash::keccak(b"")
}

/// A binary Merkle tree that keeps every level
///
/// Level 0 holds the leaves in the order given. Level k+1 pairs consecutive
/// nodes of level k; an unpaired last node is paired with itself. A
/// one-leaf tree has the leaf as its root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree over already-hashed leaves
    pub fn build(leaves: Vec<Hash>) -> Self {
        let mut levels = vec![leaves];
        while let Some(current) = levels.last().filter(|l| l.len() > 1) {
            let next = current
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            levels.push(next);
        }
        MerkleTree { levels }
    }

    /// Build a tree whose leaves are the Keccak-256 of each data item
    pub fn from_data<I, D>(items: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        Self::build(
            items
                .into_iter()
                .map(|item| Hash::keccak(item.as_ref()))
                .collect(),
        )
    }

    /// The root hash
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or_else(empty_root)
    }

    /// Nodes at level `index` (0 = leaves)
    pub fn level(&self, index: usize) -> Option<&[Hash]> {
        self.levels.get(index).map(Vec::as_slice)
    }

    /// All levels, leaves first
    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    pub fn leaves(&self) -> &[Hash] {
        &self.levels[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Number of levels including the leaves
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Every node, level-major and left to right within a level
    pub fn nodes(&self) -> impl Iterator<Item = &Hash> {
        self.levels.iter().flatten()
    }

    /// Total number of nodes across all levels
    pub fn node_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Inclusion proof for the leaf at `index`
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaf = *self.levels[0].get(index)?;
        let mut path = Vec::with_capacity(self.depth().saturating_sub(1));
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let step = if position % 2 == 0 {
                // Unpaired last node is its own sibling
                let sibling = level.get(position + 1).unwrap_or(&level[position]);
                ProofStep {
                    sibling: *sibling,
                    sibling_is_left: false,
                }
            } else {
                ProofStep {
                    sibling: level[position - 1],
                    sibling_is_left: true,
                }
            };
            path.push(step);
            position /= 2;
        }
        Some(MerkleProof { leaf, index, path })
    }
}

/// Number of nodes in a tree with `leaf_count` leaves under the
/// duplicate-last pairing rule
pub fn node_count_for(leaf_count: usize) -> usize {
    if leaf_count == 0 {
        return 0;
    }
    let mut total = leaf_count;
    let mut width = leaf_count;
    while width > 1 {
        width = width.div_ceil(2);
        total = total.saturating_add(width);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: u8) -> Vec<Hash> {
        (0..n).map(|i| Hash::keccak(&[i])).collect()
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let leaf = Hash::keccak(b"only");
        let tree = MerkleTree::build(vec![leaf]);
        assert_eq!(tree.root(), leaf);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::build(vec![]);
        assert!(tree.is_empty());
        assert_eq!(tree.root(), empty_root());
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn test_two_leaves() {
        let l = leaves(2);
        let tree = MerkleTree::build(l.clone());
        assert_eq!(tree.root(), hash_pair(&l[0], &l[1]));
    }

    #[test]
    fn test_odd_level_duplicates_last() {
        let l = leaves(3);
        let tree = MerkleTree::build(l.clone());
        let left = hash_pair(&l[0], &l[1]);
        let right = hash_pair(&l[2], &l[2]);
        assert_eq!(tree.level(1).unwrap(), &[left, right]);
        assert_eq!(tree.root(), hash_pair(&left, &right));
    }

    #[test]
    fn test_order_matters() {
        let mut l = leaves(4);
        let root = MerkleTree::build(l.clone()).root();
        l.swap(0, 1);
        assert_ne!(MerkleTree::build(l).root(), root);
    }

    #[test]
    fn test_input_not_mutated_and_levels_exposed() {
        let l = leaves(5);
        let tree = MerkleTree::build(l.clone());
        assert_eq!(tree.leaves(), l.as_slice());
        assert_eq!(tree.level(1).unwrap().len(), 3);
        assert_eq!(tree.level(2).unwrap().len(), 2);
        assert_eq!(tree.level(3).unwrap().len(), 1);
        assert!(tree.level(4).is_none());
    }

    #[test]
    fn test_node_count_matches_formula() {
        for n in 1..40u8 {
            let tree = MerkleTree::build(leaves(n));
            assert_eq!(tree.node_count(), node_count_for(n as usize));
            assert_eq!(tree.nodes().count(), tree.node_count());
        }
        assert_eq!(node_count_for(256), 511);
    }

    #[test]
    fn test_from_data_hashes_items() {
        let tree = MerkleTree::from_data(["a", "b"]);
        assert_eq!(
            tree.root(),
            hash_pair(&Hash::keccak(b"a"), &Hash::keccak(b"b"))
        );
    }

    #[test]
    fn test_proofs_verify_for_every_leaf() {
        for n in 1..12u8 {
            let tree = MerkleTree::build(leaves(n));
            let root = tree.root();
            for i in 0..n as usize {
                let proof = tree.proof(i).unwrap();
                assert!(proof.verify(&root), "leaf {} of {}", i, n);
            }
            assert!(tree.proof(n as usize).is_none());
        }
    }
}
