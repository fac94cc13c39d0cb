use crate::error::{GroupError, GroupResult};
use crate::options::TableOptions;
use crate::partition::{Partition, PartitionKey, COUNT_ALL};
use crate::record::Record;
use crate::value::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a [`Table`]: `Empty -> Loaded -> Grouped`, where `Grouped` may be re-entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableState {
    Empty,
    Loaded,
    Grouped,
}

/// An ordered set of partitions over one pool of records.
///
/// Every query method either applies completely or returns an error and leaves the table as
/// it was. Methods return `&mut Self` so a query reads as a chain:
///
/// ```
/// use group_table::{Table, Value};
///
/// let mut table = Table::new("person");
/// table.load(
///     &["sex", "age"],
///     vec![
///         vec![Value::from("man"), Value::from(10)],
///         vec![Value::from("man"), Value::from(20)],
///         vec![Value::from("woman"), Value::from(15)],
///     ],
/// )?;
/// let rows = table
///     .group_by(&["sex"])?
///     .sum("age", None)?
///     .select(&["sex", "age__sum"])?
///     .fetch()?;
/// assert_eq!(
///     rows,
///     vec![
///         vec![Value::from("man"), Value::from(30)],
///         vec![Value::from("woman"), Value::from(15)],
///     ]
/// );
/// # Ok::<(), group_table::GroupError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    options: TableOptions,
    state: TableState,
    partitions: Vec<Partition>,
    index: HashMap<PartitionKey, usize>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, TableOptions::default())
    }

    pub fn with_options(name: impl Into<String>, options: TableOptions) -> Self {
        Self {
            name: name.into(),
            options,
            state: TableState::Empty,
            partitions: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Number of records across all partitions.
    pub fn record_count(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }

    pub fn partition(&self, key: &PartitionKey) -> Option<&Partition> {
        let idx = *self.index.get(key)?;
        self.partitions.get(idx)
    }

    fn rebuild_index(&mut self) {
        self.index = index_partitions(&self.partitions);
    }

    fn ensure_loaded(&self) -> GroupResult<()> {
        match self.state {
            TableState::Empty => Err(GroupError::NotLoaded),
            TableState::Loaded | TableState::Grouped => Ok(()),
        }
    }

    fn pool(&self) -> Vec<Arc<Record>> {
        self.partitions
            .iter()
            .flat_map(|p| p.members().iter().cloned())
            .collect()
    }

    /// Builds one record per row and collects every record in a single catch-all partition.
    ///
    /// Records from an earlier `load` stay in the pool; any grouping is discarded.
    pub fn load<S, V>(&mut self, columns: &[S], rows: Vec<Vec<V>>) -> GroupResult<&mut Self>
    where
        S: AsRef<str>,
        V: Into<Value>,
    {
        let columns: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(Arc::new(Record::new(columns.clone(), row)?));
        }
        let loaded = records.len();

        let mut all = Partition::new();
        all.add_members(self.pool());
        all.add_members(records);

        log::debug!(
            "table {}: loaded {loaded} records ({} pooled)",
            self.name,
            all.len()
        );

        self.partitions = vec![all];
        self.state = TableState::Loaded;
        self.rebuild_index();
        Ok(self)
    }

    /// Repartitions every record by the distinct values of `columns`.
    ///
    /// One partition is created for each combination in the Cartesian product of the present
    /// values per column (first-seen order, leftmost column varying slowest), whether or not
    /// any record carries that combination. A record whose key matches none of them (an
    /// absent grouping value) fails the whole call.
    pub fn group_by<S: AsRef<str>>(&mut self, columns: &[S]) -> GroupResult<&mut Self> {
        if columns.is_empty() {
            return Ok(self);
        }
        self.ensure_loaded()?;

        let mut seen = HashSet::new();
        let columns: Vec<&str> = columns
            .iter()
            .map(AsRef::as_ref)
            .filter(|c| seen.insert(*c))
            .collect();

        let mut all = Partition::new();
        all.add_members(self.pool());

        let mut keys = vec![PartitionKey::new()];
        for column in &columns {
            let options = all.distinct_first_seen(column);
            keys = keys
                .iter()
                .flat_map(|key| options.iter().map(|v| key.with(column, v.clone())))
                .collect();
        }

        let mut partitions: Vec<Partition> = keys.into_iter().map(Partition::with_key).collect();
        let index = index_partitions(&partitions);

        let mut buckets: Vec<Vec<Arc<Record>>> = vec![Vec::new(); partitions.len()];
        for record in all.members() {
            let key = record.key_for(&columns);
            let idx = *index
                .get(&key)
                .ok_or(GroupError::UnassignedRecord { key })?;
            buckets[idx].push(Arc::clone(record));
        }
        for (partition, members) in partitions.iter_mut().zip(buckets) {
            partition.add_members(members);
        }

        log::debug!(
            "table {}: grouped {} records by [{}] into {} partitions",
            self.name,
            all.len(),
            columns.join(","),
            partitions.len()
        );

        self.partitions = partitions;
        self.index = index;
        self.state = TableState::Grouped;
        Ok(self)
    }

    fn alias(&self, column: &str, op: &str, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => alias.to_string(),
            None => format!("{column}{}{op}", self.options.alias_separator),
        }
    }

    /// Computes `op` on every partition, then freezes all results under `alias`.
    fn apply<F>(&mut self, alias: String, op: F) -> GroupResult<&mut Self>
    where
        F: Fn(&Partition) -> GroupResult<Value>,
    {
        self.ensure_loaded()?;
        let results = self
            .partitions
            .iter()
            .map(op)
            .collect::<GroupResult<Vec<_>>>()?;
        for (partition, value) in self.partitions.iter_mut().zip(results) {
            partition.freeze(&alias, Some(value));
        }
        log::trace!(
            "table {}: froze {alias} on {} partitions",
            self.name,
            self.partitions.len()
        );
        Ok(self)
    }

    pub fn sum(&mut self, column: &str, alias: Option<&str>) -> GroupResult<&mut Self> {
        let alias = self.alias(column, "sum", alias);
        self.apply(alias, |p| p.sum(column))
    }

    pub fn max(&mut self, column: &str, alias: Option<&str>) -> GroupResult<&mut Self> {
        let alias = self.alias(column, "max", alias);
        self.apply(alias, |p| Ok(p.max(column)))
    }

    pub fn min(&mut self, column: &str, alias: Option<&str>) -> GroupResult<&mut Self> {
        let alias = self.alias(column, "min", alias);
        self.apply(alias, |p| Ok(p.min(column)))
    }

    pub fn avg(&mut self, column: &str, alias: Option<&str>) -> GroupResult<&mut Self> {
        let alias = self.alias(column, "avg", alias);
        let empty = self.options.empty_average;
        self.apply(alias, |p| p.avg(column, empty))
    }

    /// Counts members for `"*"`, otherwise present values of `column`.
    pub fn count(&mut self, column: &str, alias: Option<&str>) -> GroupResult<&mut Self> {
        let alias = self.alias(column, "count", alias);
        self.apply(alias, |p| Ok(Value::from(p.count(column))))
    }

    /// Shorthand for `count("*", alias)`.
    pub fn count_all(&mut self, alias: Option<&str>) -> GroupResult<&mut Self> {
        self.count(COUNT_ALL, alias)
    }

    /// Freezes the distinct present values as a sorted list. The default alias is the column itself.
    pub fn distinct(&mut self, column: &str, alias: Option<&str>) -> GroupResult<&mut Self> {
        let alias = alias.unwrap_or(column).to_string();
        self.apply(alias, |p| Ok(Value::from(p.distinct(column))))
    }

    /// Sets the output columns of every partition.
    pub fn select<S: AsRef<str>>(&mut self, columns: &[S]) -> GroupResult<&mut Self> {
        self.ensure_loaded()?;
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().map(AsRef::as_ref).find(|c| !seen.insert(*c)) {
            return Err(GroupError::DuplicateColumn {
                column: dup.to_string(),
            });
        }
        for partition in &mut self.partitions {
            partition.project(columns);
        }
        log::trace!("table {}: projected {} columns", self.name, columns.len());
        Ok(self)
    }

    /// One output row per partition, in partition order.
    pub fn fetch(&self) -> GroupResult<Vec<Vec<Value>>> {
        self.ensure_loaded()?;
        self.partitions
            .iter()
            .map(|partition| -> GroupResult<Vec<Value>> {
                let row = partition.materialize()?;
                Ok(row.values_in(partition.projection()))
            })
            .collect()
    }

    /// Output column names, or empty when there are no partitions.
    pub fn schema(&self) -> Vec<String> {
        self.partitions
            .first()
            .map(|p| p.resolve().into_iter().map(|(column, _)| column).collect())
            .unwrap_or_default()
    }
}

fn index_partitions(partitions: &[Partition]) -> HashMap<PartitionKey, usize> {
    partitions
        .iter()
        .enumerate()
        .map(|(idx, p)| (p.key().clone(), idx))
        .collect()
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Table[")?;
        for (idx, partition) in self.partitions.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{partition}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn people() -> Table {
        let mut table = Table::new("person");
        table
            .load(
                &["sex", "age"],
                vec![
                    vec![Value::from("man"), Value::from(10)],
                    vec![Value::from("man"), Value::from(20)],
                    vec![Value::from("woman"), Value::from(15)],
                ],
            )
            .unwrap();
        table
    }

    #[test]
    fn load_builds_single_catch_all_partition() {
        let table = people();
        assert_eq!(table.state(), TableState::Loaded);
        assert_eq!(table.len(), 1);
        assert_eq!(table.record_count(), 3);
        assert!(table.partitions()[0].key().is_empty());
        assert!(table.partition(&PartitionKey::new()).is_some());
    }

    #[test]
    fn load_twice_pools_records() {
        let mut table = people();
        table.group_by(&["sex"]).unwrap();
        table
            .load(&["sex", "age"], vec![vec![Value::from("man"), Value::from(40)]])
            .unwrap();
        assert_eq!(table.state(), TableState::Loaded);
        assert_eq!(table.len(), 1);
        assert_eq!(table.record_count(), 4);
    }

    #[test]
    fn load_rejects_ragged_rows_without_side_effects() {
        let mut table = Table::new("t");
        let err = table
            .load(&["a", "b"], vec![vec![1, 2], vec![3]])
            .unwrap_err();
        assert!(matches!(err, GroupError::RowLength { expected: 2, actual: 1 }));
        assert_eq!(table.state(), TableState::Empty);
        assert!(table.is_empty());
    }

    #[test]
    fn operations_require_loaded_table() {
        let mut table = Table::new("t");
        assert!(matches!(table.group_by(&["a"]), Err(GroupError::NotLoaded)));
        table.group_by::<&str>(&[]).unwrap();
        assert_eq!(table.state(), TableState::Empty);
        assert!(matches!(table.sum("a", None), Err(GroupError::NotLoaded)));
        assert!(matches!(table.select(&["a"]), Err(GroupError::NotLoaded)));
        assert!(matches!(table.fetch(), Err(GroupError::NotLoaded)));
        assert!(table.schema().is_empty());
    }

    #[test]
    fn group_by_without_columns_is_noop() {
        let mut table = people();
        table.group_by::<&str>(&[]).unwrap();
        assert_eq!(table.state(), TableState::Loaded);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn group_by_indexes_partitions_by_key() {
        let mut table = people();
        table.group_by(&["sex"]).unwrap();
        assert_eq!(table.state(), TableState::Grouped);

        let key: PartitionKey = [("sex", Value::from("woman"))].into_iter().collect();
        let woman = table.partition(&key).unwrap();
        assert_eq!(woman.len(), 1);
        assert_eq!(woman.avg("age", Default::default()).unwrap(), Value::from(15.0));
    }

    #[test]
    fn group_by_ignores_repeated_columns() {
        let mut table = people();
        table.group_by(&["sex", "sex"]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.partitions()[0].key().to_string(), "sex=man");
    }

    #[test]
    fn failed_aggregate_leaves_partitions_untouched() {
        let mut table = Table::new("t");
        table
            .load(
                &["g", "v"],
                vec![
                    vec![Value::from("a"), Value::from(1)],
                    vec![Value::from("b"), Value::from("x")],
                ],
            )
            .unwrap();
        table.group_by(&["g"]).unwrap();
        assert!(table.sum("v", None).is_err());
        for partition in table.partitions() {
            assert!(!partition.identity().contains("v__sum"));
        }
    }

    #[test]
    fn custom_alias_separator() {
        let options = TableOptions {
            alias_separator: "_".to_string(),
            ..TableOptions::default()
        };
        let mut table = Table::with_options("t", options);
        table.load(&["v"], vec![vec![1], vec![2]]).unwrap();
        table.max("v", None).unwrap().select(&["v_max"]).unwrap();
        assert_eq!(table.schema(), vec!["v_max".to_string()]);
        assert_eq!(table.fetch().unwrap(), vec![vec![Value::from(2)]]);
    }

    #[test]
    fn display_lists_partitions() {
        let mut table = people();
        table.group_by(&["sex"]).unwrap();
        assert_eq!(
            table.to_string(),
            "Table[Group[key:sex=man,rows_len:2,rows:[Row[sex=man,age=10], Row[sex=man,age=20]]],\
             Group[key:sex=woman,rows_len:1,rows:[Row[sex=woman,age=15]]]]"
        );
    }
}
