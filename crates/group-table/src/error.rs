use crate::partition::PartitionKey;
use crate::value::Value;

pub type GroupResult<T> = Result<T, GroupError>;

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("row length mismatch: expected {expected} values, got {actual}")]
    RowLength { expected: usize, actual: usize },

    #[error("duplicate column: {column}")]
    DuplicateColumn { column: String },

    #[error("cannot convert {value} in column {column} to {target}")]
    Conversion {
        column: String,
        value: Value,
        target: &'static str,
    },

    #[error("record is missing identity column {column} of partition [{partition}]")]
    MissingIdentityColumn {
        partition: PartitionKey,
        column: String,
    },

    #[error("record with key [{key}] matches no partition")]
    UnassignedRecord { key: PartitionKey },

    #[error("table has no data loaded")]
    NotLoaded,
}
