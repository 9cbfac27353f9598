//! Block splitter: packs a payload into fixed-width 32-byte leaves
//!
//! `block_size = max(1, min(round(len / first_level_blocks), max_block_bytes))`.
//! Blocks are emitted until the payload is exhausted and at least
//! `first_level_blocks` blocks exist; blocks past the end are empty. Each
//! block is left-padded with zeros to one 32-byte word.

use crate::config::{PrivateDataConfig, WORD_BYTES};
use crate::model::Hash;
use crate::{Error, Result};

/// Bytes of payload carried by each block for a payload of `payload_len`
pub fn block_size(payload_len: usize, config: &PrivateDataConfig) -> usize {
    let target = config.first_level_blocks.max(1);
    // Integer round-half-up of payload_len / target, without overflow
    let (quotient, remainder) = (payload_len / target, payload_len % target);
    let rounded = quotient + usize::from(remainder >= target - remainder);
    rounded.min(config.max_block_bytes).max(1)
}

/// Number of blocks emitted for a payload of `payload_len`
pub fn block_count(payload_len: usize, config: &PrivateDataConfig) -> usize {
    payload_len
        .div_ceil(block_size(payload_len, config))
        .max(config.first_level_blocks)
}

/// Split into 64-character, zero-padded hex blocks
pub fn split(payload: &[u8], config: &PrivateDataConfig) -> Vec<String> {
    chunks(payload, config)
        .map(|block| format!("{:0>64}", hex::encode(block)))
        .collect()
}

/// Split into 32-byte Merkle leaves
pub fn split_leaves(payload: &[u8], config: &PrivateDataConfig) -> Result<Vec<Hash>> {
    chunks(payload, config)
        .map(|block| {
            Hash::left_padded(block).ok_or_else(|| {
                Error::Configuration(format!(
                    "block of {} bytes does not fit a {}-byte word",
                    block.len(),
                    WORD_BYTES
                ))
            })
        })
        .collect()
}

/// Reassemble a payload of `original_length` bytes from its leaves
///
/// Each leaf contributes its trailing bytes; the leading bytes must be the
/// zero padding added by [`split_leaves`].
pub fn join(leaves: &[Hash], original_length: usize, config: &PrivateDataConfig) -> Result<Vec<u8>> {
    let capacity = leaves.len().saturating_mul(config.max_block_bytes.min(WORD_BYTES));
    if original_length > capacity {
        return Err(Error::DecodeValidation(format!(
            "{}-byte payload cannot fit in {} leaf blocks",
            original_length,
            leaves.len()
        )));
    }

    let expected = block_count(original_length, config);
    if leaves.len() != expected {
        return Err(Error::DecodeValidation(format!(
            "expected {} leaf blocks for a {}-byte payload, got {}",
            expected,
            original_length,
            leaves.len()
        )));
    }

    let size = block_size(original_length, config);
    let mut payload = Vec::with_capacity(original_length);
    for (index, leaf) in leaves.iter().enumerate() {
        let take = (original_length - payload.len()).min(size);
        let (padding, block) = leaf.as_bytes().split_at(WORD_BYTES - take);
        if padding.iter().any(|b| *b != 0) {
            return Err(Error::DecodeValidation(format!(
                "block {} has non-zero padding",
                index
            )));
        }
        payload.extend_from_slice(block);
    }
    Ok(payload)
}

fn chunks<'a>(payload: &'a [u8], config: &PrivateDataConfig) -> impl Iterator<Item = &'a [u8]> {
    let size = block_size(payload.len(), config);
    (0..block_count(payload.len(), config)).map(move |i| {
        let start = i.saturating_mul(size).min(payload.len());
        let end = start.saturating_add(size).min(payload.len());
        &payload[start..end]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(first_level_blocks: usize, max_block_bytes: usize) -> PrivateDataConfig {
        PrivateDataConfig {
            first_level_blocks,
            max_block_bytes,
            ..Default::default()
        }
    }

    #[test]
    fn test_block_size_rounding() {
        let c = config(4, 32);
        assert_eq!(block_size(0, &c), 1);
        assert_eq!(block_size(5, &c), 1); // 1.25
        assert_eq!(block_size(6, &c), 2); // 1.5 rounds up
        assert_eq!(block_size(10, &c), 3); // 2.5 rounds up
        assert_eq!(block_size(1000, &c), 32);
    }

    #[test]
    fn test_huge_lengths_do_not_overflow() {
        let c = config(256, 32);
        assert_eq!(block_size(usize::MAX, &c), 32);
        assert_eq!(block_count(usize::MAX, &c), usize::MAX.div_ceil(32));
        assert_eq!(block_size(usize::MAX, &config(usize::MAX, 32)), 1);
        assert_eq!(block_size(usize::MAX - 1, &config(usize::MAX, 32)), 1);
    }

    #[test]
    fn test_join_rejects_length_beyond_leaves() {
        let c = config(4, 32);
        let leaves = split_leaves(b"abcd", &c).unwrap();
        for length in [usize::MAX, 4 * 32 + 1] {
            assert!(matches!(
                join(&leaves, length, &c),
                Err(Error::DecodeValidation(_))
            ));
        }
    }

    #[test]
    fn test_empty_payload_gives_target_blocks() {
        let c = PrivateDataConfig::default();
        let blocks = split(&[], &c);
        assert_eq!(blocks.len(), c.first_level_blocks);
        assert!(blocks.iter().all(|b| b == &"0".repeat(64)));
    }

    #[test]
    fn test_full_payload_gives_target_full_blocks() {
        let c = PrivateDataConfig::default();
        let payload = vec![0xffu8; c.first_level_blocks * c.max_block_bytes];
        let blocks = split(&payload, &c);
        assert_eq!(blocks.len(), c.first_level_blocks);
        assert!(blocks.iter().all(|b| b == &"f".repeat(64)));
    }

    #[test]
    fn test_oversized_payload_keeps_splitting() {
        let c = config(4, 2);
        let blocks = split(b"abcdefghij", &c);
        assert_eq!(blocks.len(), 5);
        assert!(blocks[0].ends_with("6162"));
        assert!(blocks[4].ends_with("696a"));
    }

    #[test]
    fn test_blocks_are_fixed_width() {
        let c = config(8, 3);
        for block in split(b"hello world", &c) {
            assert_eq!(block.len(), 64);
        }
    }

    #[test]
    fn test_hex_blocks_match_leaves() {
        let c = config(8, 4);
        let payload = b"{\"a\":1,\"b\":[true,false]}";
        let hex_blocks = split(payload, &c);
        let leaves = split_leaves(payload, &c).unwrap();
        let as_hex: Vec<String> = leaves.iter().map(Hash::to_hex).collect();
        assert_eq!(hex_blocks, as_hex);
    }

    #[test]
    fn test_join_handles_partial_and_empty_blocks() {
        let c = config(4, 32);
        // 5 bytes, block size 1: five full blocks and no trailing empties
        let leaves = split_leaves(b"hello", &c).unwrap();
        assert_eq!(join(&leaves, 5, &c).unwrap(), b"hello");

        // 3 bytes, block size 1: three blocks plus one empty block
        let leaves = split_leaves(b"abc", &c).unwrap();
        assert_eq!(leaves.len(), 4);
        assert_eq!(join(&leaves, 3, &c).unwrap(), b"abc");

        // 10 bytes, block size 3: last block carries a single byte
        let leaves = split_leaves(b"0123456789", &c).unwrap();
        assert_eq!(join(&leaves, 10, &c).unwrap(), b"0123456789");
    }

    #[test]
    fn test_join_rejects_wrong_leaf_count() {
        let c = config(4, 32);
        let mut leaves = split_leaves(b"abcd", &c).unwrap();
        leaves.pop();
        assert!(matches!(
            join(&leaves, 4, &c),
            Err(Error::DecodeValidation(_))
        ));
    }

    #[test]
    fn test_join_rejects_dirty_padding() {
        let c = config(4, 32);
        let mut leaves = split_leaves(b"abcd", &c).unwrap();
        let mut bytes = *leaves[0].as_bytes();
        bytes[0] = 1;
        leaves[0] = Hash::from_bytes(bytes);
        assert!(matches!(
            join(&leaves, 4, &c),
            Err(Error::DecodeValidation(_))
        ));
    }
}
