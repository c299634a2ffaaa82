//! Error types for jobdex.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, JobdexError>;

#[derive(Debug, Error)]
pub enum JobdexError {
    #[error("index artifact not found: {0}")]
    MissingIndex(PathBuf),

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("no skill matches criterion '{0}'")]
    UnresolvedCriterion(String),

    #[error("query has no usable criteria")]
    EmptyQuery,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("record store read failed: {0}")]
    StoreRead(String),

    #[error("record store not found: {0}")]
    MissingStore(PathBuf),

    #[error("index build failed: {0}")]
    Build(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobdexError {
    /// Stable machine-readable code used in robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingIndex(_) => "missing_index",
            Self::CorruptIndex(_) => "corrupt_index",
            Self::UnresolvedCriterion(_) => "unresolved_criterion",
            Self::EmptyQuery => "empty_query",
            Self::Transport(_) => "transport_error",
            Self::StoreRead(_) => "store_read_error",
            Self::MissingStore(_) => "missing_store",
            Self::Build(_) => "build_failed",
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
            Self::Io(_) => "io_error",
        }
    }

    /// Errors that end a single query with `NA` but leave the engine serving.
    #[must_use]
    pub const fn is_query_local(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedCriterion(_) | Self::EmptyQuery | Self::StoreRead(_)
        )
    }
}
