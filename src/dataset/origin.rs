//! Where a locally known dataset came from, and the transaction behind it

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatasetOrigin {
    /// Bought from another node
    Purchased,
    /// Replicated to this node as a holder
    Holding,
    /// Imported and published by this node
    Imported,
}

impl DatasetOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetOrigin::Purchased => "PURCHASED",
            DatasetOrigin::Holding => "HOLDING",
            DatasetOrigin::Imported => "IMPORTED",
        }
    }
}

impl fmt::Display for DatasetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetOrigin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PURCHASED" => Ok(DatasetOrigin::Purchased),
            "HOLDING" => Ok(DatasetOrigin::Holding),
            "IMPORTED" => Ok(DatasetOrigin::Imported),
            other => Err(Error::UnsupportedOrigin(other.to_string())),
        }
    }
}

/// Lookup of the on-chain transaction recorded for a dataset, one method
/// per origin. Implemented by whatever stores purchase, holding and offer
/// records.
pub trait TransactionLedger {
    fn purchased_transaction(&self, dataset_id: &str) -> Result<Option<String>>;

    fn holding_transaction(&self, dataset_id: &str) -> Result<Option<String>>;

    /// First offer transaction for a dataset this node imported
    fn imported_transaction(&self, dataset_id: &str) -> Result<Option<String>>;
}

pub fn transaction_hash<L: TransactionLedger + ?Sized>(
    ledger: &L,
    dataset_id: &str,
    origin: DatasetOrigin,
) -> Result<Option<String>> {
    match origin {
        DatasetOrigin::Purchased => ledger.purchased_transaction(dataset_id),
        DatasetOrigin::Holding => ledger.holding_transaction(dataset_id),
        DatasetOrigin::Imported => ledger.imported_transaction(dataset_id),
    }
}
