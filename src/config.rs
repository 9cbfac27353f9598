//! Engine configuration
//!
//! Fixed parameters injected at construction: block-splitting constants,
//! the property names that may hold private-data objects, and the chain
//! identity written into dataset headers. Stored as JSON, by default in
//! `~/.config/otjson/config.json`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum number of leaves in a private-data commitment tree
pub const DEFAULT_FIRST_LEVEL_BLOCKS: usize = 256;

/// Largest block of payload bytes packed into one 32-byte leaf
pub const DEFAULT_MAX_BLOCK_BYTES: usize = 32;

/// Width of a Merkle word; blocks must fit inside it
pub const WORD_BYTES: usize = 32;

/// Block-splitting constants and private-data property names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateDataConfig {
    pub first_level_blocks: usize,
    pub max_block_bytes: usize,
    pub object_names: Vec<String>,
}

impl Default for PrivateDataConfig {
    fn default() -> Self {
        PrivateDataConfig {
            first_level_blocks: DEFAULT_FIRST_LEVEL_BLOCKS,
            max_block_bytes: DEFAULT_MAX_BLOCK_BYTES,
            object_names: vec!["private".to_string()],
        }
    }
}

impl PrivateDataConfig {
    pub fn validate(&self) -> Result<()> {
        if self.first_level_blocks == 0 {
            return Err(Error::Configuration(
                "first_level_blocks must be at least 1".into(),
            ));
        }
        if self.max_block_bytes == 0 || self.max_block_bytes > WORD_BYTES {
            return Err(Error::Configuration(format!(
                "max_block_bytes must be between 1 and {}, got {}",
                WORD_BYTES, self.max_block_bytes
            )));
        }
        if self.object_names.is_empty() {
            return Err(Error::Configuration(
                "object_names must name at least one property".into(),
            ));
        }
        Ok(())
    }

    /// Whether `name` is a property that may carry private-data objects
    pub fn is_private_property(&self, name: &str) -> bool {
        self.object_names.iter().any(|n| n == name)
    }
}

/// Chain parameters recorded in dataset header validation schemas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockchainConfig {
    pub network_id: String,
    pub hub_contract_address: String,
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub private_data: PrivateDataConfig,
    pub blockchain: BlockchainConfig,
    /// ERC725 identity of the dataset creator
    pub erc725_identity: String,
}

impl EngineConfig {
    /// Default config location (`<config dir>/otjson/config.json`)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Configuration("Could not find config directory".into()))?;
        Ok(config_dir.join("otjson").join("config.json"))
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Load from the default path, falling back to defaults when absent
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a config from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.private_data.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.private_data.first_level_blocks, 256);
        assert_eq!(config.private_data.max_block_bytes, 32);
        assert!(config.private_data.is_private_property("private"));
    }

    #[test]
    fn test_rejects_bad_block_sizes() {
        let mut config = PrivateDataConfig::default();
        config.max_block_bytes = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        config.max_block_bytes = 33;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        config.max_block_bytes = 32;
        config.first_level_blocks = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = EngineConfig::from_json(
            r#"{"erc725_identity": "0xabc", "private_data": {"object_names": ["secret"]}}"#,
        )
        .unwrap();
        assert_eq!(config.erc725_identity, "0xabc");
        assert_eq!(config.private_data.first_level_blocks, 256);
        assert!(config.private_data.is_private_property("secret"));
        assert!(!config.private_data.is_private_property("private"));
    }

    #[test]
    fn test_from_json_validates() {
        let err = EngineConfig::from_json(r#"{"private_data": {"max_block_bytes": 0}}"#);
        assert!(matches!(err, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"blockchain": {"network_id": "mainnet"}}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.blockchain.network_id, "mainnet");
        assert!(EngineConfig::load(dir.path().join("missing.json")).is_err());
    }
}
