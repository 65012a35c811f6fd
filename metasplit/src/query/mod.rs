//! Selection query language for metadata tables.
//!
//! # Syntax Overview
//!
//! Full pattern: `<path>@<id-column><clause>+`
//!
//! - **Path**: metadata table to read (`~/` expands, `\@` escapes a literal `@`)
//! - **Id column**: column whose values name the columns to keep
//! - **Clauses**: `<sign><variable><op><values>`
//!   - signs: `?` or `|` (union), `&` (intersect)
//!   - ops: `=` or `!=`
//!   - values: `value` or `[value1,value2,...]`
//!
//! Clauses are applied left to right: `&` only narrows what earlier
//! clauses already selected.

mod parser;
mod source;

pub use parser::{parse_clauses, Combinator, Comparator, FilterClause};
pub use source::{resolve_source, MetadataQuery};
