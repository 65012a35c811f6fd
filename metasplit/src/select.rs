//! Row selection over a metadata table and identifier lookup.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::query::{Combinator, Comparator, FilterClause, MetadataQuery};
use crate::{Error, Result};

/// Row positions (0-based, header excluded) selected in a metadata table.
pub type RowSet = BTreeSet<usize>;

/// Metadata column values keyed by column name.
pub type ColumnValues = HashMap<String, Vec<String>>;

/// Evaluate a query's clauses left to right against its column values.
///
/// The running selection starts empty, so a leading `&` clause always
/// yields an empty selection.
pub fn evaluate(query: &MetadataQuery, columns: &ColumnValues) -> Result<RowSet> {
    let table = query.source().display().to_string();
    evaluate_clauses(query.clauses(), columns, &table)
}

fn evaluate_clauses(
    clauses: &[FilterClause],
    columns: &ColumnValues,
    table: &str,
) -> Result<RowSet> {
    clauses.iter().try_fold(RowSet::new(), |running, clause| -> Result<RowSet> {
        let values = columns
            .get(&clause.filter_variable)
            .ok_or_else(|| Error::MissingVariable {
                variable: clause.filter_variable.clone(),
                table: table.to_string(),
            })?;
        let matched = match_clause(clause, values)?;

        Ok(match clause.combinator {
            Combinator::Union => running.union(&matched).copied().collect(),
            Combinator::Intersect => running.intersection(&matched).copied().collect(),
        })
    })
}

/// Rows of `values` satisfying a single clause.
fn match_clause(clause: &FilterClause, values: &[String]) -> Result<RowSet> {
    let wanted: HashSet<&str> = clause.filter_values.iter().map(String::as_str).collect();
    let keep = |value: &str| match clause.comparator {
        Comparator::Equal => wanted.contains(value),
        Comparator::NotEqual => !wanted.contains(value),
    };

    let matched: RowSet = values
        .iter()
        .enumerate()
        .filter(|(_, v)| keep(v.as_str()))
        .map(|(row, _)| row)
        .collect();

    if matched.is_empty() {
        return Err(Error::EmptySelection(format!(
            "variable '{}' has no rows where it is {} [{}]",
            clause.filter_variable,
            match clause.comparator {
                Comparator::Equal => "one of",
                Comparator::NotEqual => "none of",
            },
            clause.filter_values.join(", ")
        )));
    }

    Ok(matched)
}

/// Look up the identifier of each selected row, in row order.
///
/// Repeated identifiers collapse to their first occurrence.
pub fn resolve(rows: &RowSet, ids: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(rows.len());

    for &row in rows {
        let id = ids.get(row).ok_or(Error::RowOutOfRange {
            row,
            len: ids.len(),
        })?;
        if seen.insert(id.as_str()) {
            resolved.push(id.clone());
        }
    }

    Ok(resolved)
}
