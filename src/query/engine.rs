//! Query resolution against a loaded [`SkillIndex`].
//!
//! Each criterion runs through a cascade and stops at the first mode that
//! finds anything:
//!
//! 1. quoted criterion: exact match only
//! 2. exact match
//! 3. case-insensitive match
//! 4. whole value or comma-separated sub-term, case-insensitive
//!
//! Modes 3 and 4 can hit several stored skills; their posting lists are
//! unioned. Resolved criteria are then intersected rarest first.

use serde::Serialize;
use tracing::{debug, warn};

use super::intersect::{intersect_all, union};
use super::parse::{Criterion, Query};
use super::projector::{RecordProjector, Response};
use crate::error::{JobdexError, Result};
use crate::index::{SkillEntry, SkillIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    CaseInsensitive,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCriterion {
    #[serde(flatten)]
    pub criterion: Criterion,
    pub kind: MatchKind,
    /// Stored skills that matched.
    pub skills: Vec<String>,
    #[serde(skip)]
    pub postings: Vec<u64>,
}

impl ResolvedCriterion {
    #[must_use]
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Criteria in evaluation order plus the surviving offsets.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub criteria: Vec<ResolvedCriterion>,
    pub offsets: Vec<u64>,
}

#[derive(Debug)]
pub struct QueryEngine {
    index: SkillIndex,
    projector: RecordProjector,
}

impl QueryEngine {
    #[must_use]
    pub const fn new(index: SkillIndex, projector: RecordProjector) -> Self {
        Self { index, projector }
    }

    #[must_use]
    pub const fn index(&self) -> &SkillIndex {
        &self.index
    }

    #[must_use]
    pub const fn projector(&self) -> &RecordProjector {
        &self.projector
    }

    /// Resolve one criterion through the match cascade.
    pub fn resolve_criterion(&self, criterion: &Criterion) -> Result<ResolvedCriterion> {
        let term = criterion.term.as_str();
        let resolved = |kind, skills, postings| ResolvedCriterion {
            criterion: criterion.clone(),
            kind,
            skills,
            postings,
        };

        if let Some(postings) = self.index.get(term) {
            return Ok(resolved(
                MatchKind::Exact,
                vec![term.to_string()],
                postings.to_vec(),
            ));
        }
        if criterion.quoted {
            return Err(JobdexError::UnresolvedCriterion(criterion.to_string()));
        }

        type Finder = for<'a> fn(&'a SkillIndex, &str) -> Vec<&'a SkillEntry>;
        let fallbacks: [(MatchKind, Finder); 2] = [
            (MatchKind::CaseInsensitive, SkillIndex::find_case_insensitive),
            (MatchKind::Contains, SkillIndex::find_term),
        ];
        for (kind, find) in fallbacks {
            let entries = find(&self.index, term);
            if entries.is_empty() {
                continue;
            }
            let postings = union(entries.iter().map(|entry| entry.offsets.as_slice()));
            let skills = entries.iter().map(|entry| entry.skill.clone()).collect();
            return Ok(resolved(kind, skills, postings));
        }

        Err(JobdexError::UnresolvedCriterion(criterion.to_string()))
    }

    /// Resolve every criterion, order them rarest first and intersect.
    pub fn resolve(&self, query: &Query) -> Result<Resolution> {
        let mut criteria = query
            .criteria()
            .iter()
            .map(|criterion| self.resolve_criterion(criterion))
            .collect::<Result<Vec<_>>>()?;
        criteria.sort_by_key(ResolvedCriterion::len);

        let lists: Vec<&[u64]> = criteria.iter().map(|c| c.postings.as_slice()).collect();
        let offsets = intersect_all(&lists);
        debug!(
            query = %query,
            order = ?criteria.iter().map(|c| (c.criterion.term.as_str(), c.len())).collect::<Vec<_>>(),
            matches = offsets.len(),
            "query resolved"
        );
        Ok(Resolution { criteria, offsets })
    }

    /// Parse and resolve raw query text.
    pub fn evaluate(&self, raw: &str) -> Result<Resolution> {
        let query = Query::parse(raw)?;
        self.resolve(&query)
    }

    /// Answer one raw query. Query-local failures become `NA`.
    pub fn respond(&self, raw: &str) -> Response {
        let outcome = self
            .evaluate(raw)
            .and_then(|resolution| self.projector.project(&resolution.offsets));
        match outcome {
            Ok(response) => response,
            Err(err @ JobdexError::StoreRead(_)) => {
                warn!(error = %err, "record projection failed");
                Response::NotAvailable
            }
            Err(err) => {
                debug!(query = raw, reason = %err, "query not answerable");
                Response::NotAvailable
            }
        }
    }
}
