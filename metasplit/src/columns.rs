//! Column references and the compact column spec handed to the extractor.
//!
//! Positions are folded into `start-end` runs so that selecting thousands of
//! adjacent columns stays a short argument.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

/// A target column, by 1-based position or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRef {
    Position(usize),
    Name(String),
}

/// One comma-separated element of a column spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnToken {
    /// `n`
    Single(usize),
    /// `start-end`, inclusive
    Range(usize, usize),
    /// `"name"`
    Name(String),
}

impl ColumnToken {
    /// Positions covered by this token, `None` for names.
    pub fn positions(&self) -> Option<RangeInclusive<usize>> {
        match *self {
            ColumnToken::Single(p) => Some(p..=p),
            ColumnToken::Range(start, end) => Some(start..=end),
            ColumnToken::Name(_) => None,
        }
    }
}

impl fmt::Display for ColumnToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnToken::Single(p) => write!(f, "{}", p),
            ColumnToken::Range(start, end) => write!(f, "{}-{}", start, end),
            ColumnToken::Name(name) => write!(f, "\"{}\"", name.replace('"', "\"\"")),
        }
    }
}

/// Ordered column tokens, rendered comma-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnSpec(Vec<ColumnToken>);

impl ColumnSpec {
    pub fn from_columns(columns: &[ColumnRef]) -> Self {
        Self(compress(columns))
    }

    pub fn tokens(&self) -> &[ColumnToken] {
        &self.0
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// Compress columns into sorted position runs followed by named columns.
pub fn compress(columns: &[ColumnRef]) -> Vec<ColumnToken> {
    let mut positions = Vec::with_capacity(columns.len());
    let mut names = Vec::new();
    for column in columns {
        match column {
            ColumnRef::Position(p) => positions.push(*p),
            ColumnRef::Name(name) => names.push(ColumnToken::Name(name.clone())),
        }
    }

    let mut tokens = compress_positions(&positions);
    tokens.extend(names);
    tokens
}

/// Fold positions into single and `start-end` tokens in one pass.
pub fn compress_positions(positions: &[usize]) -> Vec<ColumnToken> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut tokens = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return tokens;
    };

    let (mut start, mut last) = (first, first);
    for p in iter {
        if p == last + 1 {
            last = p;
            continue;
        }
        tokens.push(run_token(start, last));
        start = p;
        last = p;
    }
    tokens.push(run_token(start, last));

    tokens
}

fn run_token(start: usize, end: usize) -> ColumnToken {
    if start == end {
        ColumnToken::Single(start)
    } else {
        ColumnToken::Range(start, end)
    }
}
