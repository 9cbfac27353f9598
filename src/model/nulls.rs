//! Explicit `null`s on optional fields
//!
//! serde maps `"field": null` and a missing field to the same `None`, so a
//! parsed document would serialize differently than it was received. Types
//! listed here park such nulls in their flattened `extra` map on parse and
//! write them back unless the field has since been given a value.

use serde_json::{Map, Value};

pub(crate) trait KeepsNulls: Clone {
    /// Wire names of the fields that are skipped when unset
    const OPTIONAL_FIELDS: &'static [&'static str];

    /// Whether `field` will be written by the derived serializer
    fn is_written(&self, field: &str) -> bool;

    fn extra(&self) -> &Map<String, Value>;

    fn extra_mut(&mut self) -> &mut Map<String, Value>;
}

/// Remove optional fields that are explicitly null from `map`
pub(crate) fn take_nulls<T: KeepsNulls>(map: &mut Map<String, Value>) -> Map<String, Value> {
    let mut nulls = Map::new();
    for field in T::OPTIONAL_FIELDS {
        if map.get(*field).is_some_and(Value::is_null) {
            nulls.insert((*field).to_string(), Value::Null);
            map.remove(*field);
        }
    }
    nulls
}

/// Copy without the parked nulls of fields that now hold a value, or
/// `None` when nothing is shadowed
pub(crate) fn unshadowed<T: KeepsNulls>(value: &T) -> Option<T> {
    let shadowed = |key: &String, v: &Value| v.is_null() && value.is_written(key);
    if !value.extra().iter().any(|(k, v)| shadowed(k, v)) {
        return None;
    }
    let mut cleaned = value.clone();
    cleaned.extra_mut().retain(|k, v| !shadowed(k, v));
    Some(cleaned)
}

/// Serialize/Deserialize for a `#[serde(remote = "Self")]` type that
/// implements [`KeepsNulls`]
macro_rules! keep_nulls_serde {
    ($ty:ident) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                match $crate::model::nulls::unshadowed(self) {
                    Some(cleaned) => $ty::serialize(&cleaned, serializer),
                    None => $ty::serialize(self, serializer),
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let mut map = <serde_json::Map<String, serde_json::Value> as serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                let nulls = $crate::model::nulls::take_nulls::<$ty>(&mut map);
                let mut parsed = $ty::deserialize(serde_json::Value::Object(map))
                    .map_err(<D::Error as serde::de::Error>::custom)?;
                $crate::model::nulls::KeepsNulls::extra_mut(&mut parsed).extend(nulls);
                Ok(parsed)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::model::{Document, GraphObject};
    use serde_json::json;

    #[test]
    fn test_explicit_nulls_survive_roundtrip() {
        let raw = json!({
            "@graph": [{"@id": "urn:a", "@type": "otObject", "properties": null, "relations": null}],
            "signature": null
        });
        let document = Document::from_value(raw.clone()).unwrap();
        assert!(document.graph[0].properties.is_none());
        assert_eq!(serde_json::to_value(&document).unwrap(), raw);
    }

    #[test]
    fn test_assigned_field_replaces_parked_null() {
        let mut object: GraphObject =
            serde_json::from_value(json!({"@id": "urn:a", "identifiers": null})).unwrap();
        object.identifiers = Some(vec![json!({"@value": 1})]);

        let value = serde_json::to_value(&object).unwrap();
        assert_eq!(value["identifiers"], json!([{"@value": 1}]));
        assert_eq!(serde_json::to_string(&object).unwrap().matches("identifiers").count(), 1);
    }
}
