//! Dataset header: descriptive metadata, validation schemas and the
//! single integrity-proof slot that carries the dataset root hash

use super::nulls::KeepsNulls;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const ERC725_SCHEMA: &str = "erc725-main";
pub const MERKLE_ROOT_SCHEMA: &str = "merkleRoot";
pub const MERKLE_ROOT_PROOF_TYPE: &str = "merkleRootHash";
pub const DEFAULT_OTJSON_VERSION: &str = "1.0";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct DatasetHeader {
    #[serde(rename = "OTJSONVersion", default)]
    pub otjson_version: String,

    #[serde(default)]
    pub dataset_creation_timestamp: String,

    #[serde(default)]
    pub dataset_title: String,

    #[serde(default)]
    pub dataset_description: String,

    #[serde(default)]
    pub dataset_tags: Vec<String>,

    #[serde(default)]
    pub related_datasets: Vec<Value>,

    #[serde(default)]
    pub validation_schemas: BTreeMap<String, ValidationSchema>,

    #[serde(default)]
    pub data_integrity: DataIntegrity,

    #[serde(default)]
    pub data_creator: DataCreator,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transpilation_info: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_nulls_serde!(DatasetHeader);

impl KeepsNulls for DatasetHeader {
    const OPTIONAL_FIELDS: &'static [&'static str] = &["transpilationInfo"];

    fn is_written(&self, field: &str) -> bool {
        field == "transpilationInfo" && self.transpilation_info.is_some()
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

impl DatasetHeader {
    /// Value of the first integrity proof, if any
    pub fn proof_value(&self) -> Option<&str> {
        self.data_integrity
            .proofs
            .first()
            .map(|p| p.proof_value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Record the dataset root hash in the integrity-proof slot
    pub fn set_proof_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        match self.data_integrity.proofs.first_mut() {
            Some(proof) => proof.proof_value = value,
            None => self.data_integrity.proofs.push(Proof::merkle_root(value)),
        }
    }

    /// Identifier value of the dataset creator (the ERC725 identity)
    pub fn data_creator(&self) -> crate::Result<&str> {
        self.data_creator
            .identifiers
            .first()
            .map(|i| i.identifier_value.as_str())
            .ok_or_else(|| {
                crate::Error::MalformedDocument("dataset header has no data creator".into())
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct ValidationSchema {
    pub schema_type: String,

    #[serde(default)]
    pub network_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_contract_address: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_nulls_serde!(ValidationSchema);

impl KeepsNulls for ValidationSchema {
    const OPTIONAL_FIELDS: &'static [&'static str] = &["hubContractAddress"];

    fn is_written(&self, field: &str) -> bool {
        field == "hubContractAddress" && self.hub_contract_address.is_some()
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataIntegrity {
    #[serde(default)]
    pub proofs: Vec<Proof>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(default)]
    pub proof_value: String,
    pub proof_type: String,
    pub validation_schema: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Proof {
    /// Merkle-root proof slot
    pub fn merkle_root(value: impl Into<String>) -> Self {
        Proof {
            proof_value: value.into(),
            proof_type: MERKLE_ROOT_PROOF_TYPE.to_string(),
            validation_schema: format!("/schemas/{}", MERKLE_ROOT_SCHEMA),
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataCreator {
    #[serde(default)]
    pub identifiers: Vec<CreatorIdentifier>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorIdentifier {
    pub identifier_value: String,
    pub identifier_type: String,
    pub validation_schema: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreatorIdentifier {
    pub fn erc725(identity: impl Into<String>) -> Self {
        CreatorIdentifier {
            identifier_value: identity.into(),
            identifier_type: "ERC725".to_string(),
            validation_schema: format!("/schemas/{}", ERC725_SCHEMA),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_field_names() {
        let mut header = DatasetHeader {
            otjson_version: DEFAULT_OTJSON_VERSION.into(),
            ..Default::default()
        };
        header.set_proof_value("0xabc");
        let value = serde_json::to_value(&header).unwrap();

        assert_eq!(value["OTJSONVersion"], "1.0");
        assert!(value.get("datasetCreationTimestamp").is_some());
        assert_eq!(
            value["dataIntegrity"]["proofs"][0]["proofType"],
            "merkleRootHash"
        );
        assert!(value.get("transpilationInfo").is_none());
    }

    #[test]
    fn test_header_keeps_unknown_fields_and_nulls() {
        let raw = serde_json::json!({
            "OTJSONVersion": "1.0",
            "datasetCreationTimestamp": "2020-01-01T00:00:00.000Z",
            "datasetTitle": "",
            "datasetDescription": "",
            "datasetTags": [],
            "relatedDatasets": [],
            "validationSchemas": {
                "merkleRoot": {"schemaType": "merkle-root", "networkId": "1", "hubContractAddress": null, "note": 1}
            },
            "dataIntegrity": {"proofs": [{"proofValue": "0x01", "proofType": "merkleRootHash", "validationSchema": "/schemas/merkleRoot", "salt": 2}]},
            "dataCreator": {"identifiers": [{"identifierValue": "0xc", "identifierType": "ERC725", "validationSchema": "/schemas/erc725-main", "tag": 3}], "name": "ACME"},
            "transpilationInfo": null,
            "extraHeaderField": 5
        });
        let header: DatasetHeader = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(header.extra["extraHeaderField"], 5);
        assert_eq!(header.data_creator.extra["name"], "ACME");
        assert_eq!(serde_json::to_value(&header).unwrap(), raw);
    }

    #[test]
    fn test_proof_value_slot() {
        let mut header = DatasetHeader::default();
        assert_eq!(header.proof_value(), None);
        header.set_proof_value("0x01");
        header.set_proof_value("0x02");
        assert_eq!(header.data_integrity.proofs.len(), 1);
        assert_eq!(header.proof_value(), Some("0x02"));
    }

    #[test]
    fn test_data_creator() {
        let mut header = DatasetHeader::default();
        assert!(header.data_creator().is_err());
        header
            .data_creator
            .identifiers
            .push(CreatorIdentifier::erc725("0xcreator"));
        assert_eq!(header.data_creator().unwrap(), "0xcreator");
    }
}
