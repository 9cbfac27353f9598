//! # Property-Based Tests
//!
//! Determinism, commit/reveal and tamper-detection invariants checked with
//! proptest.

use otjson::canonical::canonicalize;
use otjson::private::blocks;
use otjson::{
    Document, ExchangeCodec, ExchangeKey, GraphObject, Hash, MerkleTree, PrivateDataCommitter,
    PrivateDataConfig, PrivateDataObject, Relation,
};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use serde_json::json;

fn small_config(first_level_blocks: usize, max_block_bytes: usize) -> PrivateDataConfig {
    PrivateDataConfig {
        first_level_blocks,
        max_block_bytes,
        ..Default::default()
    }
}

/// Graph whose object and relation order depends on `rotate`/`reverse`
fn build_graph(ids: &[String], values: &[i64], rotate: usize, reverse: bool) -> Vec<GraphObject> {
    let mut graph: Vec<GraphObject> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let mut relations: Vec<Relation> = ids
                .iter()
                .filter(|target| *target != id)
                .map(|target| Relation::to(target.clone()))
                .collect();
            if reverse {
                relations.reverse();
            }
            let mut object = GraphObject::new(id.clone())
                .with_identifier(json!({"@type": "id", "@value": id}))
                .with_identifier(json!({"@type": "index", "@value": i}))
                .with_property("value", values.get(i).copied().unwrap_or_default())
                .with_property(
                    "private",
                    json!([{"isPrivate": true, "data": {"v": values.get(i).copied().unwrap_or_default()}}]),
                );
            object.relations = Some(relations);
            if reverse {
                if let Some(identifiers) = object.identifiers.as_mut() {
                    identifiers.reverse();
                }
            }
            object
        })
        .collect();
    if reverse {
        graph.reverse();
    }
    let len = graph.len();
    graph.rotate_left(rotate % len.max(1));
    graph
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Canonical bytes do not depend on graph, relation or identifier order.
    #[test]
    fn canonical_form_is_order_independent(
        ids in btree_set("[a-z]{1,8}", 1..8),
        values in vec(any::<i64>(), 8),
        rotate in 0usize..8,
    ) {
        let ids: Vec<String> = ids.into_iter().collect();
        let a = Document::new(build_graph(&ids, &values, 0, false));
        let b = Document::new(build_graph(&ids, &values, rotate, true));
        prop_assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    /// Canonicalizing the re-parsed canonical form changes nothing.
    #[test]
    fn canonical_form_is_idempotent(
        ids in btree_set("[a-z]{1,8}", 1..6),
        values in vec(any::<i64>(), 6),
    ) {
        let ids: Vec<String> = ids.into_iter().collect();
        let document = Document::new(build_graph(&ids, &values, 1, true));
        let once = canonicalize(&document).unwrap();
        let reparsed = Document::from_json(std::str::from_utf8(&once).unwrap()).unwrap();
        prop_assert_eq!(canonicalize(&reparsed).unwrap(), once);
    }

    /// Stripping private data twice is the same as stripping once.
    #[test]
    fn strip_is_idempotent(
        ids in btree_set("[a-z]{1,8}", 1..6),
        values in vec(any::<i64>(), 6),
    ) {
        let ids: Vec<String> = ids.into_iter().collect();
        let committer = PrivateDataCommitter::new(small_config(16, 8)).unwrap();
        let committed = committer.commit_graph(&build_graph(&ids, &values, 0, false)).unwrap();
        let once = committer.strip_graph(&committed).unwrap();
        prop_assert_eq!(committer.strip_graph(&once).unwrap(), once);
    }

    /// decode(encode(P, K), K) == P
    #[test]
    fn encode_decode_round_trip(
        text in ".{0,200}",
        numbers in vec(any::<i64>(), 0..20),
        key in any::<[u8; 32]>(),
        first_level_blocks in 1usize..64,
        max_block_bytes in 1usize..=32,
    ) {
        let codec = ExchangeCodec::new(small_config(first_level_blocks, max_block_bytes)).unwrap();
        let data = json!({"text": text, "numbers": numbers});
        let commitment = codec
            .encode_with_key(&PrivateDataObject::new(data.clone()), ExchangeKey::from_bytes(key))
            .unwrap();

        let decoded = codec
            .decode(
                &commitment.encoded_array,
                &commitment.key,
                commitment.first_level_block_count,
                commitment.original_payload_length,
            )
            .unwrap();
        prop_assert_eq!(decoded, data);
    }

    /// Flipping one bit of the encoded array changes the encoded root.
    #[test]
    fn tampering_changes_encoded_root(
        text in ".{1,100}",
        position in any::<prop::sample::Index>(),
        byte in 0usize..32,
        bit in 0u8..8,
    ) {
        let codec = ExchangeCodec::new(small_config(16, 4)).unwrap();
        let commitment = codec.encode(&PrivateDataObject::new(json!(text))).unwrap();

        let mut tampered = commitment.encoded_array.clone();
        let index = position.index(tampered.len());
        let mut bytes = *tampered[index].as_bytes();
        bytes[byte] ^= 1 << bit;
        tampered[index] = Hash::from_bytes(bytes);

        prop_assert_ne!(
            MerkleTree::build(tampered.clone()).root(),
            commitment.encoded_data_root_hash
        );

        let mut offer = commitment.offer();
        offer.encoded_array = tampered;
        prop_assert!(codec.verify_offer(&offer).is_err());
    }

    /// A key other than the one used to encode never decodes.
    #[test]
    fn wrong_key_never_decodes(
        text in ".{0,100}",
        key in any::<[u8; 32]>(),
        other in any::<[u8; 32]>(),
    ) {
        prop_assume!(key != other);
        let codec = ExchangeCodec::new(small_config(16, 8)).unwrap();
        let commitment = codec
            .encode_with_key(&PrivateDataObject::new(json!(text)), ExchangeKey::from_bytes(key))
            .unwrap();
        let result = codec.decode(
            &commitment.encoded_array,
            &ExchangeKey::from_bytes(other),
            commitment.first_level_block_count,
            commitment.original_payload_length,
        );
        prop_assert!(result.is_err());
    }

    /// Minimum width and full-block boundary of the splitter.
    #[test]
    fn block_splitter_widths(
        first_level_blocks in 1usize..300,
        max_block_bytes in 1usize..=32,
    ) {
        let config = small_config(first_level_blocks, max_block_bytes);

        let empty = blocks::split(&[], &config);
        prop_assert_eq!(empty.len(), first_level_blocks);
        prop_assert!(empty.iter().all(|b| b.len() == 64 && b.chars().all(|c| c == '0')));

        let full = vec![0xabu8; first_level_blocks * max_block_bytes];
        let split = blocks::split(&full, &config);
        prop_assert_eq!(split.len(), first_level_blocks);
        let block_hex = "ab".repeat(max_block_bytes);
        prop_assert!(split.iter().all(|b| b.ends_with(&block_hex)));
    }

    /// Every leaf's inclusion proof verifies against the root.
    #[test]
    fn merkle_proofs_verify(data in vec(vec(any::<u8>(), 0..16), 1..40)) {
        let tree = MerkleTree::from_data(&data);
        let root = tree.root();
        for index in 0..tree.leaf_count() {
            let proof = tree.proof(index).unwrap();
            prop_assert!(proof.verify(&root));
        }
    }
}
