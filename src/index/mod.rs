//! Skill-keyed inverted index: build-time dictionary, artifact format and
//! the read-only query-time view.

pub mod artifact;
pub mod builder;
pub mod dictionary;
pub mod hash;
pub mod record;
pub mod skill_index;

pub use artifact::ArtifactStats;
pub use builder::{BuildPhase, BuildReport, Indexer};
pub use dictionary::{SkillDictionary, SkillEntry};
pub use record::RecordFormat;
pub use skill_index::SkillIndex;
