//! Extraction of controlled vocabularies from a JSON-LD data model.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::{CuratorError, Result};

use super::document::{EnumMember, RuleEntry, SchemaDocument, SchemaNode};
use super::normalize::local_name;
use super::property::{DEFAULT_LIST_DELIMITER, PropertyCatalog, PropertyDefinition};

/// Parses a schema document into per-property vocabularies.
///
/// A value is valid for a property when it is a `schema:rangeIncludes`
/// target (or a member of a target's `owl:oneOf` set), a node declared
/// `rdfs:subClassOf` the property, or referenced by one of the property's
/// validation rules. Value nodes contribute their labels and declared
/// synonyms as synonyms of their canonical display name.
#[derive(Debug, Clone)]
pub struct SchemaExtractor {
    default_delimiter: String,
}

impl SchemaExtractor {
    /// Create an extractor with the default list delimiter.
    pub fn new() -> Self {
        Self {
            default_delimiter: DEFAULT_LIST_DELIMITER.to_string(),
        }
    }

    /// Use a different default delimiter for `list` properties.
    pub fn with_default_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.default_delimiter = delimiter.into();
        self
    }

    /// Load a schema from a URL or a local path.
    pub fn load(&self, source: &str) -> Result<PropertyCatalog> {
        if source.starts_with("http://") || source.starts_with("https://") {
            self.extract_url(source)
        } else {
            self.extract_file(source)
        }
    }

    /// Load a schema from a local file.
    pub fn extract_file(&self, path: impl AsRef<Path>) -> Result<PropertyCatalog> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CuratorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.extract_str(&text)
    }

    /// Fetch a schema over HTTP.
    ///
    /// Uses a blocking client, so it must not be called from inside an
    /// async runtime worker.
    pub fn extract_url(&self, url: &str) -> Result<PropertyCatalog> {
        let fetch_error = |message: String| CuratorError::SchemaFetch {
            source_url: url.to_string(),
            message,
        };

        let response = reqwest::blocking::get(url)
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(e.to_string()))?;
        let text = response.text().map_err(|e| fetch_error(e.to_string()))?;

        self.extract_str(&text)
    }

    /// Extract from JSON text.
    pub fn extract_str(&self, json: &str) -> Result<PropertyCatalog> {
        let document = SchemaDocument::parse(json)?;
        Ok(self.extract(&document))
    }

    /// Extract from a parsed document.
    pub fn extract(&self, document: &SchemaDocument) -> PropertyCatalog {
        let nodes: IndexMap<&str, &SchemaNode> =
            document.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut children: HashMap<&str, Vec<&SchemaNode>> = HashMap::new();
        for node in &document.nodes {
            for parent in node.subclass_of.iter() {
                children.entry(parent.id.as_str()).or_default().push(node);
            }
        }

        let mut catalog = PropertyCatalog::new();

        for node in nodes.values() {
            let subclasses = children.get(node.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let is_property = !node.range_includes.is_empty()
                || !node.validation_rules.is_empty()
                || !subclasses.is_empty();
            if !is_property {
                continue;
            }

            let definition = self.build_property(node, subclasses, &nodes);
            debug!(
                property = %definition.name,
                values = definition.value_count(),
                array = definition.is_array_valued,
                "Extracted property"
            );
            for synonym in definition.ambiguous_synonyms() {
                warn!(
                    property = %definition.name,
                    synonym,
                    "Synonym folds into more than one canonical value"
                );
            }
            catalog.insert(definition);
        }

        info!(
            nodes = document.nodes.len(),
            properties = catalog.len(),
            constrained = catalog.properties().filter(|p| p.is_constrained()).count(),
            "Loaded schema"
        );

        catalog
    }

    fn build_property(
        &self,
        node: &SchemaNode,
        subclasses: &[&SchemaNode],
        nodes: &IndexMap<&str, &SchemaNode>,
    ) -> PropertyDefinition {
        let mut definition = PropertyDefinition::new(canonical_name(node));
        if let Some(label) = &node.label {
            if *label != definition.name {
                definition.label = Some(label.clone());
            }
        }
        definition.description = node.comment.clone();
        definition.delimiter = self.default_delimiter.clone();

        for target in node.range_includes.iter() {
            match nodes.get(target.id.as_str()) {
                Some(target_node) if !target_node.one_of.is_empty() => {
                    for member in target_node.one_of.iter() {
                        add_member(&mut definition, member, nodes);
                    }
                }
                Some(target_node) => add_value_node(&mut definition, target_node),
                None => add_unresolved(&mut definition, &target.id),
            }
        }

        for child in subclasses {
            add_value_node(&mut definition, child);
        }

        for rule in node.validation_rules.iter() {
            match rule {
                RuleEntry::Text(text) => self.apply_rule_text(&mut definition, text),
                RuleEntry::Ref(reference) => match nodes.get(reference.id.as_str()) {
                    Some(value_node) => add_value_node(&mut definition, value_node),
                    None => add_unresolved(&mut definition, &reference.id),
                },
            }
        }

        definition
    }

    fn apply_rule_text(&self, definition: &mut PropertyDefinition, rule: &str) {
        let mut parts = rule.split_whitespace();
        let Some(name) = parts.next() else {
            return;
        };

        if name.to_lowercase().starts_with("list") {
            definition.is_array_valued = true;
            for option in parts {
                if let Some(delimiter) = option.strip_prefix("delimiter=") {
                    if !delimiter.is_empty() {
                        definition.delimiter = delimiter.to_string();
                    }
                }
            }
        } else if name.eq_ignore_ascii_case("oneOf") {
            let rest = rule[name.len()..].trim();
            for value in rest.split('|') {
                definition.add_value(value.trim());
            }
        } else {
            debug!(property = %definition.name, rule, "Ignoring validation rule");
        }
    }
}

impl Default for SchemaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical string for a node: display name, then label, then local id.
fn canonical_name(node: &SchemaNode) -> String {
    node.display_name
        .as_deref()
        .or(node.label.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| local_name(&node.id).to_string())
}

fn add_value_node(definition: &mut PropertyDefinition, node: &SchemaNode) {
    let canonical = canonical_name(node);
    definition.add_value(canonical.clone());

    if let Some(label) = &node.label {
        definition.add_synonym(label, canonical.clone());
    }
    for synonym in node.synonyms.iter().chain(node.alt_labels.iter()) {
        definition.add_synonym(synonym, canonical.clone());
    }
}

fn add_member(
    definition: &mut PropertyDefinition,
    member: &EnumMember,
    nodes: &IndexMap<&str, &SchemaNode>,
) {
    match member {
        EnumMember::Literal(value) => definition.add_value(value.clone()),
        EnumMember::Ref(reference) => match nodes.get(reference.id.as_str()) {
            Some(node) => add_value_node(definition, node),
            None => add_unresolved(definition, &reference.id),
        },
    }
}

fn add_unresolved(definition: &mut PropertyDefinition, id: &str) {
    debug!(property = %definition.name, id, "Reference to unknown node, using local name");
    definition.add_value(local_name(id));
}
