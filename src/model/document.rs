//! OT-JSON document, graph object and relation types

use super::nulls::KeepsNulls;
use super::DatasetHeader;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type tag of the graph objects that `format_graph` normalizes
pub const OT_OBJECT_TYPE: &str = "otObject";

/// Default relation direction when none is given
pub const DEFAULT_DIRECTION: &str = "direct";

/// Signature scheme tag written next to the signature value
pub const ETHEREUM_SIGNATURE_TYPE: &str = "ethereum-signature";

/// A signed OT-JSON dataset
///
/// `@graph` holds the graph objects; header and signature are always
/// computed over the private-data-stripped canonical form. Fields other
/// than these (`@context` and the like) are kept in `extra` and covered by
/// both.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Document {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,

    #[serde(
        rename = "datasetHeader",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub header: Option<DatasetHeader>,

    #[serde(rename = "@graph", default)]
    pub graph: Vec<GraphObject>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_nulls_serde!(Document);

impl KeepsNulls for Document {
    const OPTIONAL_FIELDS: &'static [&'static str] = &["@id", "@type", "datasetHeader", "signature"];

    fn is_written(&self, field: &str) -> bool {
        match field {
            "@id" => self.id.is_some(),
            "@type" => self.document_type.is_some(),
            "datasetHeader" => self.header.is_some(),
            "signature" => self.signature.is_some(),
            _ => false,
        }
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

impl Document {
    /// Create a document around a graph, with no header or signature
    pub fn new(graph: Vec<GraphObject>) -> Self {
        Document {
            graph,
            ..Default::default()
        }
    }

    /// Parse a document from JSON text
    pub fn from_json(text: &str) -> crate::Result<Self> {
        serde_json::from_str(text).map_err(|e| crate::Error::MalformedDocument(e.to_string()))
    }

    /// Parse a document from an already-decoded JSON value
    pub fn from_value(value: Value) -> crate::Result<Self> {
        serde_json::from_value(value).map_err(|e| crate::Error::MalformedDocument(e.to_string()))
    }

    /// Copy of this document with a different graph
    pub fn with_graph(&self, graph: Vec<GraphObject>) -> Self {
        Document {
            graph,
            ..self.clone()
        }
    }
}

/// A node in the `@graph` section
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct GraphObject {
    #[serde(rename = "@id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<Relation>>,

    /// Any other fields, carried through hashing untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_nulls_serde!(GraphObject);

impl KeepsNulls for GraphObject {
    const OPTIONAL_FIELDS: &'static [&'static str] =
        &["@id", "@type", "identifiers", "properties", "relations"];

    fn is_written(&self, field: &str) -> bool {
        match field {
            "@id" => !self.id.is_empty(),
            "@type" => self.object_type.is_some(),
            "identifiers" => self.identifiers.is_some(),
            "properties" => self.properties.is_some(),
            "relations" => self.relations.is_some(),
            _ => false,
        }
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

impl GraphObject {
    /// Create an `otObject` with the given id
    pub fn new(id: impl Into<String>) -> Self {
        GraphObject {
            id: id.into(),
            object_type: Some(OT_OBJECT_TYPE.to_string()),
            ..Default::default()
        }
    }

    /// Add an identifier entry
    pub fn with_identifier(mut self, identifier: Value) -> Self {
        self.identifiers.get_or_insert_with(Vec::new).push(identifier);
        self
    }

    /// Set a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a relation
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.get_or_insert_with(Vec::new).push(relation);
        self
    }

    /// Whether this is an `otObject`
    pub fn is_ot_object(&self) -> bool {
        self.object_type.as_deref() == Some(OT_OBJECT_TYPE)
    }

    /// Identifiers, treating an absent list as empty
    pub fn identifiers_or_empty(&self) -> &[Value] {
        self.identifiers.as_deref().unwrap_or(&[])
    }

    /// Number of relations, treating an absent list as empty
    pub fn relation_count(&self) -> usize {
        self.relations.as_ref().map_or(0, Vec::len)
    }
}

/// A relation from a graph object to another object
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Relation {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,

    #[serde(
        rename = "linkedObject",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub linked_object: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_nulls_serde!(Relation);

impl KeepsNulls for Relation {
    const OPTIONAL_FIELDS: &'static [&'static str] =
        &["@type", "linkedObject", "direction", "properties"];

    fn is_written(&self, field: &str) -> bool {
        match field {
            "@type" => self.relation_type.is_some(),
            "linkedObject" => self.linked_object.is_some(),
            "direction" => self.direction.is_some(),
            "properties" => self.properties.is_some(),
            _ => false,
        }
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

impl Relation {
    /// Relation of type `otRelation` pointing at `target`
    pub fn to(target: impl Into<String>) -> Self {
        Relation {
            relation_type: Some("otRelation".to_string()),
            linked_object: Some(serde_json::json!({ "@id": target.into() })),
            ..Default::default()
        }
    }

    /// Set the direction
    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    /// Set the relation properties
    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Id of the linked object, when present
    pub fn linked_id(&self) -> Option<&str> {
        self.linked_object.as_ref()?.get("@id")?.as_str()
    }
}

/// A document signature: value plus scheme tag
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub value: String,
    #[serde(rename = "type")]
    pub signature_type: String,
}
