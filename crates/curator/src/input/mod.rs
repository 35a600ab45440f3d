//! Tabular snapshot parsing and writing.

mod list;
mod parser;
mod source;

pub use list::JsonList;
pub use parser::{Parser, ParserConfig};
pub use source::{DataTable, SourceMetadata};
