//! Query text: `a;b;c`, at most three criteria, quotes force an exact match.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{JobdexError, Result};
use crate::index::record::strip_quotes;

pub const CRITERION_SEPARATOR: char = ';';

/// Criteria beyond this count are ignored.
pub const MAX_CRITERIA: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Criterion {
    pub term: String,
    /// Quoted criteria only match a stored skill exactly.
    pub quoted: bool,
}

impl Criterion {
    /// Parse one trimmed criterion; `None` when nothing usable remains.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (term, quoted) = match strip_quotes(raw) {
            Some(inner) => (inner.trim(), true),
            None => (raw, false),
        };
        (!term.is_empty()).then(|| Self {
            term: term.to_string(),
            quoted,
        })
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.term)
        } else {
            f.write_str(&self.term)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    criteria: Vec<Criterion>,
}

impl Query {
    /// Split on `;`, drop empty criteria and keep the first three.
    pub fn parse(raw: &str) -> Result<Self> {
        let criteria: Vec<Criterion> = raw
            .split(CRITERION_SEPARATOR)
            .filter_map(Criterion::parse)
            .take(MAX_CRITERIA)
            .collect();
        if criteria.is_empty() {
            return Err(JobdexError::EmptyQuery);
        }
        Ok(Self { criteria })
    }

    #[must_use]
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl FromStr for Query {
    type Err = JobdexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, criterion) in self.criteria.iter().enumerate() {
            if idx > 0 {
                f.write_str(";")?;
            }
            write!(f, "{criterion}")?;
        }
        Ok(())
    }
}
