//! Metadata query construction: `<path>@<id-column><clauses>`.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Serialize;

use super::parser::{is_sign, parse_clauses, FilterClause};
use crate::{Error, Result};

/// A metadata table, the column naming the identifiers, and the clauses
/// that decide which identifiers to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataQuery {
    raw: String,
    source: PathBuf,
    id_column: String,
    clauses: Vec<FilterClause>,
}

impl MetadataQuery {
    /// Parse a query string and resolve its metadata file.
    ///
    /// The file must exist; a missing file fails here rather than at
    /// evaluation time.
    pub fn new(raw: &str) -> Result<Self> {
        let (path, id_column, chain) = split_query(raw)?;
        let clauses = parse_clauses(chain)?;
        let source = resolve_source(&path)?;

        Ok(Self {
            raw: raw.to_string(),
            source,
            id_column: id_column.to_string(),
            clauses,
        })
    }

    /// The string this query was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Absolute path of the metadata table.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// Distinct filter variables in first-use order.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.clauses
            .iter()
            .map(|c| c.filter_variable.as_str())
            .filter(|v| seen.insert(*v))
            .collect()
    }
}

impl fmt::Display for MetadataQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.source.to_string_lossy().replace('@', "\\@");
        write!(f, "{}@{}", path, self.id_column)?;
        for clause in &self.clauses {
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

/// Split a raw query into (path, id column, clause chain).
///
/// The path runs to the first unescaped `@`, the id column to the first
/// clause sign.
pub(crate) fn split_query(raw: &str) -> Result<(String, &str, &str)> {
    let invalid = || Error::InvalidQuery(raw.to_string());

    let mut path = String::new();
    let mut at = None;
    let mut chars = raw.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if chars.peek().is_some_and(|&(_, next)| next == '@') => {
                path.push('@');
                chars.next();
            }
            '@' => {
                at = Some(i);
                break;
            }
            _ => path.push(c),
        }
    }

    let at = at.ok_or_else(invalid)?;
    let after_at = &raw[at + 1..];
    let sign = after_at.find(is_sign).ok_or_else(invalid)?;
    let id_column = &after_at[..sign];
    let chain = &after_at[sign..];

    if path.is_empty() || id_column.is_empty() {
        return Err(invalid());
    }

    Ok((path, id_column, chain))
}

/// Expand `~/` and canonicalize `path`, failing if it is not an existing file.
pub fn resolve_source(path: &str) -> Result<PathBuf> {
    let expanded = match path.strip_prefix("~/") {
        Some(rest) => match BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    };

    match std::fs::canonicalize(&expanded) {
        Ok(resolved) if resolved.is_file() => Ok(resolved),
        _ => Err(Error::SourceNotFound(expanded)),
    }
}
