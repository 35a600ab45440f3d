//! JSON-array cells such as `["Blood", "Skin"]`.
//!
//! Exports from some metadata stores encode list-valued cells as JSON
//! arrays regardless of the column's declared delimiter. Such a cell is
//! read element-wise and written back as a JSON array in the separator
//! style it was read with.

use serde_json::Value;

/// A cell holding a JSON array.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonList {
    items: Vec<Value>,
    separator: &'static str,
}

impl JsonList {
    /// Parse a cell whose trimmed text is a JSON array.
    ///
    /// Returns `None` for anything else, including bracketed text that is
    /// not valid JSON.
    pub fn parse(cell: &str) -> Option<Self> {
        let trimmed = cell.trim();
        if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
            return None;
        }
        let items: Vec<Value> = serde_json::from_str(trimmed).ok()?;

        // Keep the compact form only when it reproduces the cell exactly
        let compact = Self {
            items,
            separator: ",",
        };
        let separator = if compact.render() == trimmed { "," } else { ", " };
        Some(Self { separator, ..compact })
    }

    /// Element texts, trimmed. Non-string elements use their JSON text.
    pub fn elements(&self) -> Vec<String> {
        self.items.iter().map(element_text).collect()
    }

    /// Replace every element whose text equals `from`; an empty `to`
    /// drops the element.
    pub fn replace(&mut self, from: &str, to: &str) {
        let mut kept = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if element_text(&item) != from {
                kept.push(item);
            } else if !to.is_empty() {
                kept.push(Value::String(to.to_string()));
            }
        }
        self.items = kept;
    }

    /// The cell text.
    pub fn render(&self) -> String {
        let items: Vec<String> = self.items.iter().map(Value::to_string).collect();
        format!("[{}]", items.join(self.separator))
    }
}

fn element_text(item: &Value) -> String {
    match item {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
