//! Merkle engine
//!
//! This implements a plain binary hash tree where:
//! - Leaves are taken in caller order; callers sort when they need a
//!   discovery-order-independent root
//! - Internal nodes are Keccak-256(left || right)
//! - An odd level pairs its last node with itself
//! - Every level is kept, so the codec can blind each node in turn

mod proof;
mod tree;

pub use proof::{MerkleProof, ProofStep};
pub use tree::{empty_root, hash_pair, node_count_for, MerkleTree};
