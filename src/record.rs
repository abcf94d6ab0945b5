use std::collections::HashMap;
use std::sync::Arc;

use crate::types::SqlValue;

/// A result row of a shape not known at compile time.
///
/// Column names are shared across every record of one result set.
#[derive(Debug, Clone)]
pub struct Record {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row, in column order
    pub values: Vec<SqlValue>,
    column_index: Arc<HashMap<String, usize>>,
}

impl Record {
    /// Create a record, building a fresh name index.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        let index = Arc::new(build_index(&column_names));
        Self::with_index(column_names, index, values)
    }

    pub(crate) fn with_index(
        column_names: Arc<Vec<String>>,
        column_index: Arc<HashMap<String, usize>>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    /// Get the index of a column by name.
    ///
    /// Duplicate names resolve to the first occurrence.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by 0-based column position.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn build_index(column_names: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        index.entry(name.clone()).or_insert(i);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_position() {
        let names = Arc::new(vec!["id".to_string(), "name".to_string(), "id".to_string()]);
        let record = Record::new(
            names,
            vec![
                SqlValue::Int(1),
                SqlValue::Text("a".into()),
                SqlValue::Int(2),
            ],
        );
        assert_eq!(record.get("id"), Some(&SqlValue::Int(1)));
        assert_eq!(record.get("name").and_then(SqlValue::as_text), Some("a"));
        assert_eq!(record.get_by_index(2), Some(&SqlValue::Int(2)));
        assert!(record.get("missing").is_none());
        assert_eq!(record.len(), 3);
    }
}
