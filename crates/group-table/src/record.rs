use crate::error::{GroupError, GroupResult};
use crate::partition::PartitionKey;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

/// One input row: named values in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    values: Vec<Value>,
}

impl Record {
    /// Builds a record from parallel column/value lists.
    pub fn new<C, V>(columns: Vec<C>, values: Vec<V>) -> GroupResult<Self>
    where
        C: Into<String>,
        V: Into<Value>,
    {
        if columns.len() != values.len() {
            return Err(GroupError::RowLength {
                expected: columns.len(),
                actual: values.len(),
            });
        }

        let mut record = Self {
            columns: Vec::with_capacity(columns.len()),
            column_index: HashMap::with_capacity(columns.len()),
            values: Vec::with_capacity(values.len()),
        };
        record.add_columns(columns.into_iter().zip(values))?;
        Ok(record)
    }

    /// Appends columns after the existing ones. Only used while loading data.
    ///
    /// Fails without modifying the record if any name is already present or repeated.
    pub fn add_columns<C, V>(&mut self, pairs: impl IntoIterator<Item = (C, V)>) -> GroupResult<()>
    where
        C: Into<String>,
        V: Into<Value>,
    {
        let pairs: Vec<(String, Value)> = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .collect();

        let mut seen = std::collections::HashSet::with_capacity(pairs.len());
        for (column, _) in &pairs {
            if self.column_index.contains_key(column) || !seen.insert(column.as_str()) {
                return Err(GroupError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }

        for (column, value) in pairs {
            self.column_index.insert(column.clone(), self.columns.len());
            self.columns.push(column);
            self.values.push(value);
        }
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The value stored under `column`, if the column was declared.
    pub fn get(&self, column: &str) -> Option<&Value> {
        let idx = *self.column_index.get(column)?;
        self.values.get(idx)
    }

    /// True iff the column is declared and holds a non-null value.
    pub fn has(&self, column: &str) -> bool {
        self.get(column).is_some_and(|v| !v.is_null())
    }

    /// The record's key over `columns`, in the given order. Undeclared columns read as null.
    pub fn key_for<S: AsRef<str>>(&self, columns: &[S]) -> PartitionKey {
        columns
            .iter()
            .map(|c| {
                let c = c.as_ref();
                (c.to_string(), self.get(c).cloned().unwrap_or(Value::Null))
            })
            .collect()
    }

    /// Values in `order`, with null for columns this record does not declare.
    pub fn values_in<S: AsRef<str>>(&self, order: &[S]) -> Vec<Value> {
        order
            .iter()
            .map(|c| self.get(c.as_ref()).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Row[")?;
        for (idx, (column, value)) in self.columns.iter().zip(&self.values).enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{column}={value}")?;
        }
        f.write_str("]")
    }
}
