//! Private data: block splitting and hash commitments
//!
//! A private payload is canonically serialized, split into at least
//! `first_level_blocks` zero-padded 32-byte blocks, and committed to by the
//! root of a Merkle tree over those blocks (`private_data_hash`).

pub mod blocks;
mod committer;

pub use committer::{PrivateDataCommitter, PrivateSlot};
