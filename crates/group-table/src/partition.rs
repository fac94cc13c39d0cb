//! Grouping buckets.
//!
//! A [`Partition`] holds the records that share one combination of identity-column values,
//! together with any values frozen onto it by aggregates. Records are shared with the owning
//! table through `Arc`, so regrouping never copies row data.
use crate::error::{GroupError, GroupResult};
use crate::options::EmptyAverage;
use crate::record::Record;
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Pseudo-column accepted by [`Partition::count`] to count members instead of values.
pub const COUNT_ALL: &str = "*";

/// An ordered `column -> value` mapping.
///
/// Used as the canonical identity of a partition and as the lookup key from a record to its
/// partition. Equality and hashing are structural, so values containing `,` or `=` cannot
/// collide with one another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    parts: Vec<(String, Value)>,
}

impl PartitionKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.parts
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.parts.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Sets `column`, keeping its position if already present and appending otherwise.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.parts.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.parts.push((column, value)),
        }
    }

    /// Returns a copy extended with one more `(column, value)` pair.
    pub(crate) fn with(&self, column: &str, value: Value) -> Self {
        let mut parts = Vec::with_capacity(self.parts.len() + 1);
        parts.extend(self.parts.iter().cloned());
        parts.push((column.to_string(), value));
        Self { parts }
    }
}

impl FromIterator<(String, Value)> for PartitionKey {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut key = Self::new();
        for (column, value) in iter {
            key.set(column, value);
        }
        key
    }
}

impl<'a> FromIterator<(&'a str, Value)> for PartitionKey {
    fn from_iter<I: IntoIterator<Item = (&'a str, Value)>>(iter: I) -> Self {
        iter.into_iter().map(|(c, v)| (c.to_string(), v)).collect()
    }
}

/// Canonical text form: `col=value,col=value`.
impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (column, value)) in self.parts.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{column}={value}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Partition {
    key: PartitionKey,
    identity: PartitionKey,
    members: Vec<Arc<Record>>,
    projection: Vec<String>,
}

impl Partition {
    /// A catch-all partition with no identity columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// A partition whose identity is seeded with `key`.
    pub fn with_key(key: PartitionKey) -> Self {
        Self {
            identity: key.clone(),
            key,
            members: Vec::new(),
            projection: Vec::new(),
        }
    }

    /// The lookup key this partition was created with.
    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    /// Identity columns plus every value frozen since creation.
    pub fn identity(&self) -> &PartitionKey {
        &self.identity
    }

    pub fn members(&self) -> &[Arc<Record>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    /// Replaces the member list.
    ///
    /// Every record must carry a value for every identity column; on failure the current
    /// members are kept.
    pub fn member_set(&mut self, records: Vec<Arc<Record>>) -> GroupResult<()> {
        for record in &records {
            if let Some(column) = self.identity.columns().find(|c| !record.has(c)) {
                return Err(GroupError::MissingIdentityColumn {
                    partition: self.key.clone(),
                    column: column.to_string(),
                });
            }
        }
        self.members = records;
        Ok(())
    }

    /// Appends members without re-checking identity columns.
    pub fn add_members(&mut self, records: impl IntoIterator<Item = Arc<Record>>) {
        self.members.extend(records);
    }

    /// Fixes a value for `column` onto the partition.
    ///
    /// With `Some(value)` the value is stored as given. With `None` the first present member
    /// value is taken as representative of the whole partition; if no member has one, nothing
    /// is stored.
    pub fn freeze(&mut self, column: &str, value: Option<Value>) {
        let value = match value {
            Some(value) => value,
            None => match self.first_present(column) {
                Some(value) => value.clone(),
                None => return,
            },
        };
        self.identity.set(column, value);
    }

    /// Sets the output columns and their order.
    pub fn project<S: AsRef<str>>(&mut self, columns: &[S]) {
        self.projection = columns.iter().map(|c| c.as_ref().to_string()).collect();
    }

    /// Resolves every projected column: frozen values first, then the first present member
    /// value, then null.
    pub fn resolve(&self) -> Vec<(String, Value)> {
        self.projection
            .iter()
            .map(|column| {
                let value = self
                    .identity
                    .get(column)
                    .or_else(|| self.first_present(column))
                    .cloned()
                    .unwrap_or(Value::Null);
                (column.clone(), value)
            })
            .collect()
    }

    /// Resolves the projection into a fresh output record.
    pub fn materialize(&self) -> GroupResult<Record> {
        let (columns, values): (Vec<String>, Vec<Value>) = self.resolve().into_iter().unzip();
        Record::new(columns, values)
    }

    fn first_present(&self, column: &str) -> Option<&Value> {
        self.members
            .iter()
            .filter_map(|r| r.get(column))
            .find(|v| !v.is_null())
    }

    fn present_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.members
            .iter()
            .filter_map(move |r| r.get(column))
            .filter(|v| !v.is_null())
    }

    /// Integer sum of the present values. Absent values are skipped.
    pub fn sum(&self, column: &str) -> GroupResult<Value> {
        let mut total = 0i64;
        for value in self.present_values(column) {
            let n = value.to_i64().ok_or_else(|| GroupError::Conversion {
                column: column.to_string(),
                value: value.clone(),
                target: "integer",
            })?;
            total = total.checked_add(n).ok_or_else(|| GroupError::Conversion {
                column: column.to_string(),
                value: value.clone(),
                target: "integer without overflow",
            })?;
        }
        Ok(Value::Int(total))
    }

    /// Largest present value, or null when there is none.
    pub fn max(&self, column: &str) -> Value {
        self.present_values(column)
            .max_by(|a, b| a.cmp_natural(b))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Smallest present value, or null when there is none.
    pub fn min(&self, column: &str) -> Value {
        self.present_values(column)
            .min_by(|a, b| a.cmp_natural(b))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Arithmetic mean of the present values.
    pub fn avg(&self, column: &str, empty: EmptyAverage) -> GroupResult<Value> {
        let mut total = 0.0;
        let mut count = 0usize;
        for value in self.present_values(column) {
            total += value.to_f64().ok_or_else(|| GroupError::Conversion {
                column: column.to_string(),
                value: value.clone(),
                target: "number",
            })?;
            count += 1;
        }

        if count == 0 {
            return Ok(match empty {
                EmptyAverage::Zero => Value::Int(0),
                EmptyAverage::Null => Value::Null,
            });
        }
        Ok(Value::from(total / count as f64))
    }

    /// Member count for [`COUNT_ALL`], otherwise the number of members with a present value.
    pub fn count(&self, column: &str) -> usize {
        if column == COUNT_ALL {
            return self.members.len();
        }
        self.present_values(column).count()
    }

    /// Unique present values, sorted by [`Value::cmp_natural`].
    pub fn distinct(&self, column: &str) -> Vec<Value> {
        let mut values = self.distinct_first_seen(column);
        values.sort_by(|a, b| a.cmp_natural(b));
        values
    }

    /// Unique present values, in first-seen order.
    pub(crate) fn distinct_first_seen(&self, column: &str) -> Vec<Value> {
        let mut seen = HashSet::new();
        self.present_values(column)
            .filter(|v| seen.insert(*v))
            .cloned()
            .collect()
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group[key:{},rows_len:{},rows:[", self.key, self.members.len())?;
        for (idx, record) in self.members.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{record}")?;
        }
        f.write_str("]]")
    }
}
