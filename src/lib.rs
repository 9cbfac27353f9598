//! # otjson
//!
//! Content integrity and private-data fair exchange for OT-JSON
//! knowledge-graph datasets.
//!
//! The crate turns graph documents into deterministic canonical bytes,
//! commits to them with Merkle trees, and sells the private parts of a
//! dataset with a commit-then-reveal protocol: the buyer can check a keyed,
//! blinded commitment before paying and decode it once the key is revealed.
//!
//! ## Core Concepts
//!
//! - **Canonical form**: sorted keys, sorted relations/identifiers, sorted graph
//! - **Private-data hash**: Merkle root over a payload split into 32-byte blocks
//! - **Distribution root**: Merkle root over the dataset summary and public objects
//! - **Commitment**: every node of a private-data tree, blinded by a keyed pad
//!
//! ## Example
//!
//! ```ignore
//! use otjson::{Assembler, EngineConfig, ExchangeCodec};
//!
//! let assembler = Assembler::new(EngineConfig::default())?;
//! let dataset = assembler.prepare(&document, &signing_key)?;
//! let public = assembler.strip_private(&dataset)?;
//!
//! let codec = ExchangeCodec::new(Default::default())?;
//! let commitment = codec.encode(&private_object)?;
//! let payload = codec.decode_offer(&commitment.offer(), &commitment.key)?;
//! ```

pub mod canonical;
pub mod config;
pub mod dataset;
pub mod exchange;
pub mod merkle;
pub mod model;
pub mod private;

mod error;

pub use config::{BlockchainConfig, EngineConfig, PrivateDataConfig};
pub use dataset::{Address, Assembler, DatasetOrigin, HeaderInfo, TransactionLedger};
pub use error::{Error, Result};
pub use exchange::{Commitment, CommitmentOffer, ExchangeCodec, ExchangeKey};
pub use merkle::{MerkleProof, MerkleTree};
pub use model::{Document, GraphObject, Hash, PrivateDataObject, Relation};
pub use private::PrivateDataCommitter;
