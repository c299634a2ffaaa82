//! Record projection: offsets back to raw store lines under a byte budget.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::{JobdexError, Result};
use crate::index::record::trim_line_end;

/// Wire sentinel for "no records".
pub const NOT_AVAILABLE: &str = "NA";

pub const DEFAULT_BUDGET: usize = 8 * 1024;
pub const DEFAULT_TRUNCATION_MARKER: &str = "... (results truncated) ...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    NotAvailable,
    Records {
        body: String,
        lines: usize,
        truncated: bool,
    },
}

impl Response {
    /// Text sent to clients.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::NotAvailable => NOT_AVAILABLE,
            Self::Records { body, .. } => body,
        }
    }

    #[must_use]
    pub fn into_wire(self) -> String {
        match self {
            Self::NotAvailable => NOT_AVAILABLE.to_string(),
            Self::Records { body, .. } => body,
        }
    }

    #[must_use]
    pub const fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable)
    }

    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Records { truncated: true, .. })
    }
}

#[derive(Debug, Clone)]
pub struct RecordProjector {
    store: PathBuf,
    budget: usize,
    marker: String,
}

impl RecordProjector {
    #[must_use]
    pub fn new(store: impl Into<PathBuf>) -> Self {
        Self {
            store: store.into(),
            budget: DEFAULT_BUDGET,
            marker: DEFAULT_TRUNCATION_MARKER.to_string(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config, root: &Path) -> Self {
        Self::new(config.store_path(root))
            .with_budget(config.engine.response_budget)
            .with_marker(config.engine.truncation_marker.clone())
    }

    #[must_use]
    pub const fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.store
    }

    /// Read the line starting at each offset, joined by `\n`.
    ///
    /// The body never exceeds the budget. When the next line would not fit
    /// alongside the truncation marker, the marker is appended on its own
    /// line and projection stops. Empty `offsets` yield `NotAvailable`.
    pub fn project(&self, offsets: &[u64]) -> Result<Response> {
        if offsets.is_empty() {
            return Ok(Response::NotAvailable);
        }

        let store_err = |err: std::io::Error| {
            JobdexError::StoreRead(format!("{}: {err}", self.store.display()))
        };
        let file = File::open(&self.store).map_err(store_err)?;
        let store_len = file.metadata().map_err(store_err)?.len();
        let mut reader = BufReader::new(file);

        let reserve = self.marker.len() + 1;
        let mut body = String::new();
        let mut lines = 0;
        let mut raw = Vec::new();

        for (idx, &offset) in offsets.iter().enumerate() {
            if offset >= store_len {
                return Err(JobdexError::StoreRead(format!(
                    "offset {offset} is past the end of {} ({store_len} bytes)",
                    self.store.display()
                )));
            }
            reader.seek(SeekFrom::Start(offset)).map_err(store_err)?;
            raw.clear();
            reader.read_until(b'\n', &mut raw).map_err(store_err)?;
            let line = String::from_utf8_lossy(trim_line_end(&raw));

            let separator = usize::from(!body.is_empty());
            let needed = body.len() + separator + line.len();
            let is_last = idx + 1 == offsets.len();
            let limit = if is_last {
                self.budget
            } else {
                self.budget.saturating_sub(reserve)
            };

            if needed > limit {
                if !body.is_empty() {
                    body.push('\n');
                }
                body.push_str(&self.marker);
                return Ok(Response::Records {
                    body,
                    lines,
                    truncated: true,
                });
            }

            if separator == 1 {
                body.push('\n');
            }
            body.push_str(&line);
            lines += 1;
        }

        Ok(Response::Records {
            body,
            lines,
            truncated: false,
        })
    }
}
