//! Combining identifier sets from several metadata queries and mapping
//! them onto the target table's columns.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::columns::ColumnRef;
use crate::{Error, Result};

/// How identifier sets from different metadata queries are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossSourceMode {
    /// Keep identifiers selected by any query
    #[default]
    Union,
    /// Keep identifiers selected by every query
    Intersect,
}

impl FromStr for CrossSourceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "union" => Ok(CrossSourceMode::Union),
            "intersect" | "intersection" => Ok(CrossSourceMode::Intersect),
            _ => Err(Error::Config(format!(
                "Invalid cross-source mode '{}': expected union or intersect",
                s
            ))),
        }
    }
}

impl fmt::Display for CrossSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossSourceMode::Union => write!(f, "union"),
            CrossSourceMode::Intersect => write!(f, "intersect"),
        }
    }
}

/// Identifiers chosen for extraction and the target columns they map to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSelection {
    pub identifiers: Vec<String>,
    pub columns: Vec<ColumnRef>,
}

/// Combine per-query identifier sets.
///
/// Union keeps first-seen order across queries; intersect keeps the first
/// query's order.
pub fn combine(sets: &[Vec<String>], mode: CrossSourceMode) -> Vec<String> {
    match mode {
        CrossSourceMode::Union => {
            let mut seen = HashSet::new();
            sets.iter()
                .flatten()
                .filter(|id| seen.insert(id.as_str()))
                .cloned()
                .collect()
        }
        CrossSourceMode::Intersect => {
            let Some((first, rest)) = sets.split_first() else {
                return Vec::new();
            };
            let others: Vec<HashSet<&str>> = rest
                .iter()
                .map(|set| set.iter().map(String::as_str).collect())
                .collect();
            let mut seen = HashSet::new();
            first
                .iter()
                .filter(|id| others.iter().all(|other| other.contains(id.as_str())))
                .filter(|id| seen.insert(id.as_str()))
                .cloned()
                .collect()
        }
    }
}

/// Combine identifier sets, reconcile them with the target headers and map
/// them to column references.
///
/// Identifiers missing from `target_headers` are dropped when
/// `ignore_missing` is set and rejected otherwise. `always_include` entries
/// are appended afterwards without that check; any not found among the
/// headers are kept as named columns.
pub fn aggregate(
    sets: &[Vec<String>],
    mode: CrossSourceMode,
    always_include: &[String],
    target_headers: &[String],
    ignore_missing: bool,
) -> Result<ColumnSelection> {
    let combined = combine(sets, mode);
    if combined.is_empty() {
        return Err(Error::EmptySelection(format!(
            "nothing was selected by the metadata queries ({} mode)",
            mode
        )));
    }

    let mut header_positions: HashMap<&str, usize> = HashMap::with_capacity(target_headers.len());
    for (i, header) in target_headers.iter().enumerate() {
        header_positions.entry(header.as_str()).or_insert(i + 1);
    }

    let (present, missing): (Vec<String>, Vec<String>) = combined
        .into_iter()
        .partition(|id| header_positions.contains_key(id.as_str()));

    if !missing.is_empty() {
        if !ignore_missing {
            return Err(Error::MissingHeader(missing));
        }
        if present.is_empty() {
            return Err(Error::EmptySelection(
                "nothing survived after removing identifiers missing from the target".to_string(),
            ));
        }
    }

    let mut seen = HashSet::new();
    let identifiers: Vec<String> = present
        .into_iter()
        .chain(always_include.iter().cloned())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let columns = identifiers
        .iter()
        .map(|id| match header_positions.get(id.as_str()) {
            Some(&position) => ColumnRef::Position(position),
            None => ColumnRef::Name(id.clone()),
        })
        .collect();

    Ok(ColumnSelection {
        identifiers,
        columns,
    })
}
