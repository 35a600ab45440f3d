//! Aggregation of a column into its distinct observed values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::{DataTable, JsonList};
use crate::schema::{DEFAULT_LIST_DELIMITER, PropertyDefinition};

/// A distinct value observed in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedValue {
    /// Raw value as stored (one list element for array-valued columns).
    pub value: String,
    /// Owning column.
    pub column: String,
    /// Number of rows carrying the value.
    pub count: usize,
    /// Whether the value was read as an element of a list cell.
    pub is_array_valued: bool,
    /// Keys of the entities carrying the value, in row order.
    pub entities: Vec<String>,
}

/// Reduces a column to distinct values with occurrence counts.
///
/// Blank cells and blank list elements are not values and are skipped.
/// Scalar values are kept verbatim; list elements are trimmed, since the
/// whitespace around them belongs to the list formatting. A cell holding
/// a JSON array is read element-wise whatever the column's format.
#[derive(Debug, Clone)]
pub struct ValueCollector {
    delimiter: Option<String>,
}

impl ValueCollector {
    /// Collector for scalar columns.
    pub fn scalar() -> Self {
        Self { delimiter: None }
    }

    /// Collector for columns holding delimited lists.
    pub fn array(delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        Self {
            delimiter: Some(if delimiter.is_empty() {
                DEFAULT_LIST_DELIMITER.to_string()
            } else {
                delimiter
            }),
        }
    }

    /// Collector matching a property's cell format.
    pub fn for_property(property: &PropertyDefinition) -> Self {
        if property.is_array_valued {
            Self::array(property.delimiter.clone())
        } else {
            Self::scalar()
        }
    }

    /// Collect the values of one table column.
    pub fn collect(&self, table: &DataTable, column: usize) -> Vec<ObservedValue> {
        let name = table.headers.get(column).map(String::as_str).unwrap_or("");
        let cells = (0..table.row_count()).filter_map(|row| {
            let key = table.entity_key(row)?;
            let cell = table.get(row, column)?;
            Some((key, cell))
        });
        self.collect_cells(name, cells)
    }

    /// Collect from `(entity key, cell)` pairs.
    pub fn collect_cells<'a>(
        &self,
        column: &str,
        cells: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Vec<ObservedValue> {
        let mut seen: IndexMap<String, ObservedValue> = IndexMap::new();

        for (entity, cell) in cells {
            let json = JsonList::parse(cell);
            let is_list = json.is_some() || self.delimiter.is_some();
            let elements: Vec<String> = match (json, &self.delimiter) {
                (Some(list), _) => list.elements().into_iter().filter(|e| !e.is_empty()).collect(),
                (None, Some(delimiter)) => cell
                    .split(delimiter.as_str())
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect(),
                (None, None) if cell.trim().is_empty() => Vec::new(),
                (None, None) => vec![cell.to_string()],
            };

            // A value repeated inside one cell counts once for that row
            let mut row_values: Vec<String> = Vec::with_capacity(elements.len());
            for element in elements {
                if !row_values.contains(&element) {
                    row_values.push(element);
                }
            }

            for element in row_values {
                let observed = seen.entry(element.clone()).or_insert_with(|| ObservedValue {
                    value: element,
                    column: column.to_string(),
                    count: 0,
                    is_array_valued: false,
                    entities: Vec::new(),
                });
                observed.count += 1;
                observed.is_array_valued |= is_list;
                if observed.entities.last().map(String::as_str) != Some(entity) {
                    observed.entities.push(entity.to_string());
                }
            }
        }

        let mut values: Vec<ObservedValue> = seen.into_values().collect();
        // Stable: equal counts keep first-seen order
        values.sort_by(|a, b| b.count.cmp(&a.count));
        values
    }
}

impl Default for ValueCollector {
    fn default() -> Self {
        Self::scalar()
    }
}
