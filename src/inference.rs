use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Integer,
    Float,
    Boolean,
    DateTime,
    Text,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Boolean => "BOOLEAN",
            DataType::DateTime => "DATETIME",
            DataType::Text => "TEXT",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks which types every non-null value seen so far still converts to.
#[derive(Debug, Clone)]
struct TypeCandidate {
    possible_boolean: bool,
    possible_integer: bool,
    possible_float: bool,
    possible_datetime: bool,
    observed: usize,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            possible_boolean: true,
            possible_integer: true,
            possible_float: true,
            possible_datetime: true,
            observed: 0,
        }
    }

    fn update(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        self.observed += 1;
        if self.possible_boolean && value.as_boolean().is_none() {
            self.possible_boolean = false;
        }
        if self.possible_integer && value.as_integer().is_none() {
            self.possible_integer = false;
        }
        if self.possible_float && value.as_float().is_none() {
            self.possible_float = false;
        }
        if self.possible_datetime && value.as_datetime().is_none() {
            self.possible_datetime = false;
        }
    }

    fn exhausted(&self) -> bool {
        !(self.possible_boolean
            || self.possible_integer
            || self.possible_float
            || self.possible_datetime)
    }

    fn decide(&self) -> DataType {
        if self.observed == 0 {
            DataType::Text
        } else if self.possible_boolean {
            DataType::Boolean
        } else if self.possible_integer {
            DataType::Integer
        } else if self.possible_float {
            DataType::Float
        } else if self.possible_datetime {
            DataType::DateTime
        } else {
            DataType::Text
        }
    }
}

/// Classifies a column by the first type (BOOLEAN, INTEGER, FLOAT, DATETIME)
/// that every non-null value converts to, falling back to TEXT.
pub fn infer_data_type(values: &[Value]) -> DataType {
    let mut candidate = TypeCandidate::new();
    for value in values {
        candidate.update(value);
        if candidate.exhausted() {
            break;
        }
    }
    candidate.decide()
}

/// Whether the column has a missing cell, counting rows past its end as missing.
pub fn is_nullable(values: &[Value], total_rows: usize) -> bool {
    values.len() < total_rows || values.iter().any(Value::is_null)
}
