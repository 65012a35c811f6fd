//! metasplit: select columns of a large table by querying metadata tables.
//!
//! A metadata query such as `samples.csv@id?tissue=liver&batch!=[3,4]`
//! selects identifiers from a metadata table; the identifiers name columns
//! of the target table, which are then projected out by an external
//! tabular tool.

pub mod aggregate;
pub mod atomic;
pub mod columns;
pub mod config;
pub mod error;
pub mod query;
pub mod select;
pub mod split;
pub mod tool;

pub use aggregate::{aggregate, combine, ColumnSelection, CrossSourceMode};
pub use columns::{compress, compress_positions, ColumnRef, ColumnSpec, ColumnToken};
pub use config::{parse_delimiter, Config};
pub use error::{Error, Result};
pub use query::{parse_clauses, Combinator, Comparator, FilterClause, MetadataQuery};
pub use select::{evaluate, resolve, ColumnValues, RowSet};
pub use split::{plan, run, SplitOptions, SplitPlan};
pub use tool::{TableTool, Xsv};
