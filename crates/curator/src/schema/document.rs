//! Typed view of a JSON-LD data model document.
//!
//! Only the fields the extractor reads are modelled; everything else in a
//! node is ignored. Absent fields deserialize to empty values, while a
//! present field with the wrong JSON type is a parse error.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{CuratorError, Result};

/// A field that may hold a single item, a list of items, or null.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOrMany<T>(pub Vec<T>);

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OneOrMany<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape<T> {
            Many(Vec<T>),
            One(T),
            Null(()),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Many(items) => OneOrMany(items),
            Shape::One(item) => OneOrMany(vec![item]),
            Shape::Null(()) => OneOrMany(Vec::new()),
        })
    }
}

/// A `{"@id": ...}` reference to another node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reference {
    #[serde(rename = "@id")]
    pub id: String,
}

/// One entry of `sms:validationRules`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleEntry {
    Text(String),
    Ref(Reference),
}

/// One member of an `owl:oneOf` enumeration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnumMember {
    Ref(Reference),
    Literal(String),
}

/// A node of the `@graph` array.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type", default)]
    pub types: OneOrMany<String>,

    #[serde(rename = "rdfs:label", default)]
    pub label: Option<String>,

    #[serde(rename = "rdfs:comment", default)]
    pub comment: Option<String>,

    #[serde(rename = "sms:displayName", default)]
    pub display_name: Option<String>,

    #[serde(rename = "schema:rangeIncludes", default)]
    pub range_includes: OneOrMany<Reference>,

    #[serde(rename = "rdfs:subClassOf", default)]
    pub subclass_of: OneOrMany<Reference>,

    #[serde(rename = "sms:validationRules", default)]
    pub validation_rules: OneOrMany<RuleEntry>,

    #[serde(rename = "owl:oneOf", default)]
    pub one_of: OneOrMany<EnumMember>,

    #[serde(rename = "sms:synonyms", default)]
    pub synonyms: OneOrMany<String>,

    #[serde(rename = "skos:altLabel", default)]
    pub alt_labels: OneOrMany<String>,
}

/// A parsed data model: the nodes of its `@graph`, in document order.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub nodes: Vec<SchemaNode>,
}

impl SchemaDocument {
    /// Parse a document from JSON text.
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CuratorError::SchemaParse(format!("not valid JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Parse a document from an already-decoded JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value.as_object().ok_or_else(|| {
            CuratorError::SchemaParse("document root must be a JSON object".to_string())
        })?;

        let graph = root
            .get("@graph")
            .ok_or_else(|| CuratorError::SchemaParse("document has no '@graph' key".to_string()))?
            .as_array()
            .ok_or_else(|| CuratorError::SchemaParse("'@graph' must be an array".to_string()))?;

        let mut nodes = Vec::with_capacity(graph.len());
        for (index, raw) in graph.iter().enumerate() {
            if !raw.is_object() {
                return Err(CuratorError::SchemaParse(format!(
                    "@graph[{}] must be an object",
                    index
                )));
            }
            let node = SchemaNode::deserialize(raw).map_err(|e| {
                let id = raw.get("@id").and_then(Value::as_str).unwrap_or("?");
                CuratorError::SchemaParse(format!("@graph[{}] ('{}'): {}", index, id, e))
            })?;
            nodes.push(node);
        }

        Ok(Self { nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_or_many_shapes() {
        let doc = SchemaDocument::from_value(&json!({
            "@graph": [
                {"@id": "bts:A", "schema:rangeIncludes": {"@id": "bts:X"}},
                {"@id": "bts:B", "schema:rangeIncludes": [{"@id": "bts:X"}, {"@id": "bts:Y"}]},
                {"@id": "bts:C", "schema:rangeIncludes": null},
                {"@id": "bts:D"}
            ]
        }))
        .unwrap();

        let counts: Vec<usize> = doc.nodes.iter().map(|n| n.range_includes.0.len()).collect();
        assert_eq!(counts, vec![1, 2, 0, 0]);
    }

    #[test]
    fn test_mixed_rule_entries() {
        let doc = SchemaDocument::from_value(&json!({
            "@graph": [{
                "@id": "bts:Assay",
                "sms:validationRules": ["list", {"@id": "bts:RNASeq"}]
            }]
        }))
        .unwrap();

        let rules = &doc.nodes[0].validation_rules.0;
        assert_eq!(rules[0], RuleEntry::Text("list".to_string()));
        assert_eq!(
            rules[1],
            RuleEntry::Ref(Reference {
                id: "bts:RNASeq".to_string()
            })
        );
    }

    #[test]
    fn test_missing_graph_is_error() {
        let err = SchemaDocument::from_value(&json!({"@context": {}})).unwrap_err();
        assert!(matches!(err, CuratorError::SchemaParse(_)));
    }

    #[test]
    fn test_graph_not_array_is_error() {
        let err = SchemaDocument::from_value(&json!({"@graph": {"@id": "x"}})).unwrap_err();
        assert!(err.to_string().contains("must be an array"));
    }

    #[test]
    fn test_node_without_id_is_error() {
        let err = SchemaDocument::from_value(&json!({"@graph": [{"rdfs:label": "Sex"}]}))
            .unwrap_err();
        assert!(matches!(err, CuratorError::SchemaParse(_)));
    }

    #[test]
    fn test_wrong_field_type_is_error() {
        let err = SchemaDocument::from_value(&json!({
            "@graph": [{"@id": "bts:Sex", "schema:rangeIncludes": 42}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("bts:Sex"));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let doc = SchemaDocument::from_value(&json!({
            "@graph": [{"@id": "bts:Sex", "sms:required": "sms:false", "schema:isPartOf": {"@id": "x"}}]
        }))
        .unwrap();
        assert_eq!(doc.nodes.len(), 1);
    }
}
