//! Query side: parsing, criterion resolution, intersection and projection.

pub mod engine;
pub mod intersect;
pub mod parse;
pub mod projector;

pub use engine::{MatchKind, QueryEngine, Resolution, ResolvedCriterion};
pub use parse::{Criterion, Query};
pub use projector::{RecordProjector, Response};
