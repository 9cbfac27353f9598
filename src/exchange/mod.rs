//! Fair exchange of private data
//!
//! The seller blinds every node of a private object's commitment tree with
//! a keyed pad and publishes the blinded array with its own root. A buyer
//! can check that array's integrity before paying; once the key is
//! revealed the array unblinds back to the payload and its tree.

mod codec;
mod key;

pub use codec::{Commitment, CommitmentOffer, ExchangeCodec};
pub use key::ExchangeKey;
