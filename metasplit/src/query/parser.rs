//! Clause parser for the selection micro-language.

use std::fmt;

use serde::Serialize;

use crate::{Error, Result};

/// How a clause's matches merge with the rows selected so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// `?` or `|`: add matching rows
    Union,
    /// `&`: keep only selected rows that also match
    Intersect,
}

/// Comparison applied to a metadata column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// `=` value is one of the filter values
    Equal,
    /// `!=` value is none of the filter values
    NotEqual,
}

/// One parsed `<sign><variable><op><values>` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterClause {
    /// Metadata column to test
    pub filter_variable: String,
    /// Equal or not-equal
    pub comparator: Comparator,
    /// Union or intersect with the running selection
    pub combinator: Combinator,
    /// Values to compare against (never empty, no duplicates)
    pub filter_values: Vec<String>,
}

impl Combinator {
    /// Map a clause sign to its combinator.
    pub fn from_sign(sign: char) -> Option<Self> {
        match sign {
            '?' | '|' => Some(Combinator::Union),
            '&' => Some(Combinator::Intersect),
            _ => None,
        }
    }
}

/// Whether `c` starts a new clause.
pub(crate) fn is_sign(c: char) -> bool {
    Combinator::from_sign(c).is_some()
}

/// Parse a clause chain such as `?col3=beta&col1!=[d,e,f]`.
pub fn parse_clauses(input: &str) -> Result<Vec<FilterClause>> {
    if input.is_empty() {
        return Err(Error::InvalidClause("no clauses given".to_string()));
    }

    let mut clauses = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() {
        let (clause, rest) = consume_clause(remaining)?;
        clauses.push(clause);
        remaining = rest;
    }

    Ok(clauses)
}

/// Consume one clause from the front of `input`, returning it and the rest.
fn consume_clause(input: &str) -> Result<(FilterClause, &str)> {
    let end = find_clause_end(input);
    let token = &input[..end];
    let rest = &input[end..];

    let mut chars = token.chars();
    let combinator = chars
        .next()
        .and_then(Combinator::from_sign)
        .ok_or_else(|| {
            Error::InvalidClause(format!(
                "'{}' does not start with one of '?', '|' or '&'",
                token
            ))
        })?;
    let body = chars.as_str();

    // "!=" contains "=", so it has to be checked first
    let (variable, comparator, value_expr) = if let Some((var, val)) = body.split_once("!=") {
        (var, Comparator::NotEqual, val)
    } else if let Some((var, val)) = body.split_once('=') {
        (var, Comparator::Equal, val)
    } else {
        return Err(Error::InvalidClause(format!(
            "'{}' has no '=' or '!=' comparator",
            token
        )));
    };

    if variable.is_empty() {
        return Err(Error::InvalidClause(format!("'{}' has no variable", token)));
    }

    let clause = FilterClause {
        filter_variable: variable.to_string(),
        comparator,
        combinator,
        filter_values: parse_values(value_expr),
    };

    Ok((clause, rest))
}

/// Find where the clause starting at `input` ends (next sign or end).
fn find_clause_end(input: &str) -> usize {
    let skip = input.chars().next().map_or(0, char::len_utf8);
    input[skip..]
        .find(is_sign)
        .map_or(input.len(), |i| skip + i)
}

/// Split `[a,b,c]` into its members, or keep a bare value whole.
fn parse_values(expr: &str) -> Vec<String> {
    let members: Vec<&str> = match expr.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => inner.split(',').collect(),
        None => vec![expr],
    };

    let mut values: Vec<String> = Vec::with_capacity(members.len());
    for member in members {
        if !values.iter().any(|v| v == member) {
            values.push(member.to_string());
        }
    }
    values
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Union => write!(f, "?"),
            Combinator::Intersect => write!(f, "&"),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Equal => write!(f, "="),
            Comparator::NotEqual => write!(f, "!="),
        }
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.combinator, self.filter_variable, self.comparator)?;
        match self.filter_values.as_slice() {
            // A lone value that looks like a list must be bracketed to survive re-parsing
            [value] if !(value.starts_with('[') && value.ends_with(']')) => write!(f, "{}", value),
            values => write!(f, "[{}]", values.join(",")),
        }
    }
}
