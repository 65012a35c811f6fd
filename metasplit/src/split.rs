//! Top-level split operation: metadata queries in, projected table out.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{aggregate, CrossSourceMode};
use crate::columns::{ColumnRef, ColumnSpec};
use crate::config::Config;
use crate::query::MetadataQuery;
use crate::select::{evaluate, resolve, ColumnValues};
use crate::tool::TableTool;
use crate::{atomic, Error, Result};

/// Options for a split run.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOptions {
    /// Drop selected identifiers the target lacks instead of failing.
    pub ignore_missing: bool,
    /// Delimiter of the target table.
    pub delimiter: char,
    /// Delimiter of metadata tables.
    pub metadata_delimiter: char,
    /// Identifiers always extracted, regardless of the queries.
    pub always_include: Vec<String>,
    pub cross_source_mode: CrossSourceMode,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SplitOptions {
    /// Options seeded from config defaults.
    pub fn from_config(config: &Config) -> Self {
        Self {
            ignore_missing: false,
            delimiter: config.delimiter,
            metadata_delimiter: config.metadata_delimiter,
            always_include: Vec::new(),
            cross_source_mode: config.cross_source_mode,
        }
    }
}

/// Everything decided before extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitPlan {
    /// Selected identifiers, in selection order.
    pub identifiers: Vec<String>,
    /// Target columns matching `identifiers`.
    pub columns: Vec<ColumnRef>,
    /// Compressed column spec passed to the extractor.
    pub spec: ColumnSpec,
    /// Number of columns in the target table.
    pub target_columns: usize,
}

/// Work out which target columns the queries select, without extracting.
pub fn plan<T: TableTool + ?Sized>(
    tool: &T,
    queries: &[MetadataQuery],
    target: &Path,
    options: &SplitOptions,
) -> Result<SplitPlan> {
    if !target.is_file() {
        return Err(Error::SourceNotFound(target.to_path_buf()));
    }

    let sets = queries
        .iter()
        .map(|query| select_identifiers(tool, query, options.metadata_delimiter))
        .collect::<Result<Vec<_>>>()?;

    let target_headers = tool.get_headers(target, options.delimiter)?;
    info!("Target {} has {} columns", target.display(), target_headers.len());

    let selection = aggregate(
        &sets,
        options.cross_source_mode,
        &options.always_include,
        &target_headers,
        options.ignore_missing,
    )?;
    let spec = ColumnSpec::from_columns(&selection.columns);
    debug!(spec = %spec, "compressed column spec");

    Ok(SplitPlan {
        identifiers: selection.identifiers,
        columns: selection.columns,
        spec,
        target_columns: target_headers.len(),
    })
}

/// Extract the columns selected by `queries` from `target` into
/// `destination`.
///
/// `destination` is only created once extraction has fully succeeded.
pub fn run<T: TableTool + ?Sized>(
    tool: &T,
    queries: &[MetadataQuery],
    target: &Path,
    destination: &Path,
    options: &SplitOptions,
) -> Result<SplitPlan> {
    let plan = plan(tool, queries, target, options)?;
    info!("Selecting {} columns", plan.identifiers.len());

    atomic::write_with(destination, |temp| {
        tool.extract_columns(target, &plan.spec, options.delimiter, temp)
    })?;

    info!("Wrote {}", destination.display());
    Ok(plan)
}

/// Evaluate one query against its metadata table and return the
/// identifiers it selects.
fn select_identifiers<T: TableTool + ?Sized>(
    tool: &T,
    query: &MetadataQuery,
    delimiter: char,
) -> Result<Vec<String>> {
    let source = query.source();
    let headers = tool.get_headers(source, delimiter)?;
    info!("Processing {} - found {} headers", source.display(), headers.len());

    let mut columns = ColumnValues::new();
    for variable in query.variables().into_iter().chain([query.id_column()]) {
        if columns.contains_key(variable) {
            continue;
        }
        if !headers.iter().any(|h| h == variable) {
            return Err(Error::MissingVariable {
                variable: variable.to_string(),
                table: source.display().to_string(),
            });
        }
        let values = tool.select_column_values(source, variable, delimiter)?;
        columns.insert(variable.to_string(), values);
    }

    let rows = evaluate(query, &columns)?;
    let ids = columns.get(query.id_column()).map(Vec::as_slice).unwrap_or_default();
    let identifiers = resolve(&rows, ids)?;
    debug!(
        query = query.raw(),
        rows = rows.len(),
        identifiers = identifiers.len(),
        "evaluated metadata query"
    );

    Ok(identifiers)
}
