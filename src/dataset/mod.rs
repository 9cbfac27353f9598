//! Dataset assembly, signing and provenance

mod assembler;
mod origin;
pub mod signing;

pub use assembler::{Assembler, HeaderInfo, DATASET_TYPE};
pub use origin::{transaction_hash, DatasetOrigin, TransactionLedger};
pub use signing::Address;
