//! Property definitions and the catalog that maps columns to them.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::normalize::normalize;

/// Default delimiter for array-valued cells.
pub const DEFAULT_LIST_DELIMITER: &str = ",";

/// Result of testing an observed value against a property's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    /// The value is a canonical valid value, verbatim.
    Valid,
    /// The value is a declared synonym of exactly one canonical value.
    Synonym(String),
    /// The value differs from a canonical value only by case or spacing.
    CaseOrSpacing(String),
    /// The value is a declared synonym of several canonical values.
    AmbiguousSynonym(Vec<String>),
    /// The value is not in the vocabulary.
    Invalid,
}

impl Membership {
    /// Whether the value should be left alone.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Membership::Valid | Membership::Synonym(_))
    }
}

/// The controlled vocabulary of one property.
///
/// Immutable once the catalog has been loaded for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Property name (display name from the schema).
    pub name: String,

    /// Alternate name the property may be addressed by (schema label).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Canonical valid values, in schema order.
    valid_values: IndexSet<String>,

    /// Normalized synonym -> canonical values it folds into.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    synonyms: IndexMap<String, IndexSet<String>>,

    /// Whether cells hold delimited lists of values.
    #[serde(default)]
    pub is_array_valued: bool,

    /// Delimiter for array-valued cells.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Normalized canonical value -> canonical values, built on first use.
    #[serde(skip)]
    normalized_index: OnceCell<HashMap<String, Vec<String>>>,
}

fn default_delimiter() -> String {
    DEFAULT_LIST_DELIMITER.to_string()
}

impl PropertyDefinition {
    /// Create a property with an empty vocabulary.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            valid_values: IndexSet::new(),
            synonyms: IndexMap::new(),
            is_array_valued: false,
            delimiter: default_delimiter(),
            normalized_index: OnceCell::new(),
        }
    }

    /// Add a canonical valid value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.add_value(value);
        self
    }

    /// Add several canonical valid values.
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.add_value(value);
        }
        self
    }

    /// Declare `synonym` as an alternate spelling of `canonical`.
    pub fn with_synonym(mut self, synonym: impl AsRef<str>, canonical: impl Into<String>) -> Self {
        self.add_synonym(synonym, canonical);
        self
    }

    /// Mark the property as array-valued with the given delimiter.
    pub fn with_list_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.is_array_valued = true;
        self.delimiter = delimiter.into();
        self
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn add_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        self.valid_values.insert(value);
        self.normalized_index = OnceCell::new();
    }

    pub(crate) fn add_synonym(&mut self, synonym: impl AsRef<str>, canonical: impl Into<String>) {
        let canonical = canonical.into();
        let key = normalize(synonym.as_ref());
        if key.is_empty() || synonym.as_ref() == canonical {
            return;
        }
        self.synonyms.entry(key).or_default().insert(canonical);
    }

    /// Canonical valid values in schema order.
    pub fn valid_values(&self) -> impl Iterator<Item = &str> {
        self.valid_values.iter().map(String::as_str)
    }

    /// Number of canonical valid values.
    pub fn value_count(&self) -> usize {
        self.valid_values.len()
    }

    /// Whether the property constrains its values at all.
    pub fn is_constrained(&self) -> bool {
        !self.valid_values.is_empty()
    }

    /// Whether `value` is a canonical valid value, verbatim.
    pub fn contains(&self, value: &str) -> bool {
        self.valid_values.contains(value)
    }

    /// Declared synonyms as (normalized synonym, canonical values) pairs.
    pub fn synonyms(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.synonyms
            .iter()
            .map(|(syn, canon)| (syn.as_str(), canon.iter().map(String::as_str).collect()))
    }

    /// Synonyms that fold into more than one canonical value.
    pub fn ambiguous_synonyms(&self) -> Vec<&str> {
        self.synonyms
            .iter()
            .filter(|(_, canon)| canon.len() > 1)
            .map(|(syn, _)| syn.as_str())
            .collect()
    }

    /// Test a raw value against the vocabulary.
    ///
    /// Exact canonical values win, then declared synonyms (compared
    /// normalized), then normalized canonical values.
    pub fn classify(&self, value: &str) -> Membership {
        if self.valid_values.contains(value) {
            return Membership::Valid;
        }

        let key = normalize(value);

        if let Some(canonical) = self.synonyms.get(&key) {
            let mut targets: Vec<String> = canonical.iter().cloned().collect();
            return if targets.len() == 1 {
                Membership::Synonym(targets.remove(0))
            } else {
                Membership::AmbiguousSynonym(targets)
            };
        }

        if let Some(matches) = self.normalized_index().get(&key) {
            if let Some(first) = matches.first() {
                return Membership::CaseOrSpacing(first.clone());
            }
        }

        Membership::Invalid
    }

    fn normalized_index(&self) -> &HashMap<String, Vec<String>> {
        self.normalized_index.get_or_init(|| {
            let mut index: HashMap<String, Vec<String>> = HashMap::new();
            for value in &self.valid_values {
                index.entry(normalize(value)).or_default().push(value.clone());
            }
            index
        })
    }
}

/// All property definitions extracted from one schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyCatalog {
    properties: IndexMap<String, PropertyDefinition>,
}

impl PropertyCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or merge into) a property definition.
    pub fn insert(&mut self, definition: PropertyDefinition) {
        match self.properties.get_mut(&definition.name) {
            Some(existing) => {
                for value in definition.valid_values {
                    existing.add_value(value);
                }
                for (syn, canon) in definition.synonyms {
                    existing.synonyms.entry(syn).or_default().extend(canon);
                }
                existing.is_array_valued |= definition.is_array_valued;
                if definition.is_array_valued {
                    existing.delimiter = definition.delimiter;
                }
                if existing.label.is_none() {
                    existing.label = definition.label;
                }
            }
            None => {
                self.properties.insert(definition.name.clone(), definition);
            }
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_property(mut self, definition: PropertyDefinition) -> Self {
        self.insert(definition);
        self
    }

    /// Look up a property by its exact name.
    pub fn get(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.get(name)
    }

    /// Resolve the property a column refers to.
    ///
    /// Tries the exact name, then the exact label, then the normalized name
    /// or label.
    pub fn resolve(&self, column: &str) -> Option<&PropertyDefinition> {
        if let Some(def) = self.properties.get(column) {
            return Some(def);
        }
        if let Some(def) = self
            .properties
            .values()
            .find(|d| d.label.as_deref() == Some(column))
        {
            return Some(def);
        }
        let key = normalize(column);
        self.properties.values().find(|d| {
            normalize(&d.name) == key || d.label.as_deref().map(normalize).as_deref() == Some(key.as_str())
        })
    }

    /// All properties in schema order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties.values()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
