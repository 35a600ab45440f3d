//! Controlled vocabularies extracted from a JSON-LD data model.
//!
//! The [`SchemaExtractor`] turns a schema document into a
//! [`PropertyCatalog`]: one [`PropertyDefinition`] per property, each
//! holding the canonical valid values and declared synonyms for that
//! property.

mod document;
mod extractor;
mod normalize;
mod property;

pub use document::{EnumMember, OneOrMany, Reference, RuleEntry, SchemaDocument, SchemaNode};
pub use extractor::SchemaExtractor;
pub use normalize::{local_name, normalize};
pub use property::{DEFAULT_LIST_DELIMITER, Membership, PropertyCatalog, PropertyDefinition};
