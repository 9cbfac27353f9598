//! Core data model types for otjson

#[macro_use]
mod nulls;

mod document;
mod hash;
mod header;
mod private;

pub use document::{
    Document, GraphObject, Relation, Signature, DEFAULT_DIRECTION, ETHEREUM_SIGNATURE_TYPE,
    OT_OBJECT_TYPE,
};
pub use hash::Hash;
pub use header::{
    CreatorIdentifier, DataCreator, DataIntegrity, DatasetHeader, Proof, ValidationSchema,
    DEFAULT_OTJSON_VERSION, ERC725_SCHEMA, MERKLE_ROOT_PROOF_TYPE, MERKLE_ROOT_SCHEMA,
};
pub use private::PrivateDataObject;
