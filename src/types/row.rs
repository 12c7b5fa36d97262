use serde::{Deserialize, Serialize};

use crate::types::{page::RowPointer, value::Value};

/// One decoded row. `values` are in column ordinal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub location: Option<RowPointer>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            location: None,
            values,
        }
    }

    pub fn with_location(location: RowPointer, values: Vec<Value>) -> Self {
        Self {
            location: Some(location),
            values,
        }
    }

    pub fn get_value(&self, column_index: usize) -> Option<&Value> {
        self.values.get(column_index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}
