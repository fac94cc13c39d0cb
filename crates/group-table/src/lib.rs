//! In-memory GROUP BY evaluation.
//!
//! A [`Table`] loads rows as [`Record`]s, repartitions them by column values with
//! [`Table::group_by`], freezes per-partition aggregates (`sum`, `max`, `min`, `avg`, `count`,
//! `distinct`) and materializes one output row per [`Partition`].

#![forbid(unsafe_code)]

mod error;
mod options;
mod partition;
mod record;
mod table;
mod value;

pub use crate::error::{GroupError, GroupResult};
pub use crate::options::{EmptyAverage, TableOptions};
pub use crate::partition::{Partition, PartitionKey, COUNT_ALL};
pub use crate::record::Record;
pub use crate::table::{Table, TableState};
pub use crate::value::Value;
