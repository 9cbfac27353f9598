//! Symmetric reveal key and the position-keyed pad derived from it

use crate::model::Hash;
use crate::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 256-bit key that blinds a commitment until the seller reveals it
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ExchangeKey([u8; 32]);

impl ExchangeKey {
    /// Fresh key from the operating system CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        ExchangeKey(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ExchangeKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let hash = Hash::from_hex(s).map_err(|e| Error::InvalidHash(format!("key: {}", e)))?;
        Ok(ExchangeKey(*hash.as_bytes()))
    }

    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Pad for node `index`: Keccak-256(key || index as uint256)
    pub fn pad(&self, index: u64) -> Hash {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&index.to_be_bytes());
        Hash::keccak_many(&[&self.0[..], &word[..]])
    }

    /// XOR each node with the pad of its position; applying it twice
    /// with the same key restores the input
    pub fn blind<'a, I>(&self, nodes: I) -> Vec<Hash>
    where
        I: IntoIterator<Item = &'a Hash>,
    {
        nodes
            .into_iter()
            .zip(0u64..)
            .map(|(node, index)| node.xor(&self.pad(index)))
            .collect()
    }
}

impl fmt::Debug for ExchangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExchangeKey(..)")
    }
}

impl std::str::FromStr for ExchangeKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ExchangeKey::from_hex(s)
    }
}

impl Serialize for ExchangeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_prefixed_hex())
    }
}

impl<'de> Deserialize<'de> for ExchangeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ExchangeKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
