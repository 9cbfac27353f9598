//! Private-data object: a payload nested in a graph object's properties
//! that is committed to by hash and revealed only after purchase

use super::Hash;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle: created with `isPrivate` and `data`; gains a
/// `private_data_hash`; loses `isPrivate` and `data` when published.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateDataObject {
    #[serde(rename = "isPrivate", default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_data_hash: Option<Hash>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PrivateDataObject {
    /// A fresh private object holding `data`
    pub fn new(data: Value) -> Self {
        PrivateDataObject {
            is_private: Some(true),
            data: Some(data),
            ..Default::default()
        }
    }

    /// Whether the object is flagged private
    pub fn is_private(&self) -> bool {
        self.is_private.unwrap_or(false)
    }

    /// The payload, if present and non-null
    pub fn payload(&self) -> Option<&Value> {
        self.data.as_ref().filter(|v| !v.is_null())
    }

    /// Public form: only the hash commitment (and unrelated fields) remain
    pub fn stripped(&self) -> Self {
        PrivateDataObject {
            is_private: None,
            data: None,
            ..self.clone()
        }
    }

    /// Holder form: private objects keep the flag but lose the payload
    pub fn hidden(&self) -> Self {
        if self.is_private() {
            PrivateDataObject {
                data: None,
                ..self.clone()
            }
        } else {
            self.clone()
        }
    }

    /// Restore a payload received from a verified source
    pub fn with_data(&self, data: Value) -> Self {
        PrivateDataObject {
            data: Some(data),
            ..self.clone()
        }
    }

    pub(crate) fn from_value(value: &Value) -> crate::Result<Self> {
        if !value.is_object() {
            return Err(crate::Error::MalformedDocument(format!(
                "private data entry is not an object: {}",
                value
            )));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| crate::Error::MalformedDocument(e.to_string()))
    }
}
