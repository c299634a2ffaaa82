//! Record parsing: pulling skill tokens out of one store line.
//!
//! A record is `<id><field delimiter><skill><skill delimiter><skill>...`.
//! Tokens are trimmed and lose one pair of surrounding quotes; empty tokens
//! are dropped.

use std::borrow::Cow;

use crate::config::StoreConfig;
use crate::error::{JobdexError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFormat {
    pub field_delimiter: u8,
    pub skill_delimiter: u8,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self {
            field_delimiter: b',',
            skill_delimiter: b',',
        }
    }
}

impl RecordFormat {
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            field_delimiter: ascii_delimiter(config.field_delimiter)?,
            skill_delimiter: ascii_delimiter(config.skill_delimiter)?,
        })
    }

    /// Bytes after the first field delimiter, without the line terminator.
    #[must_use]
    pub fn skill_field<'a>(&self, line: &'a [u8]) -> Option<&'a [u8]> {
        let line = trim_line_end(line);
        memchr::memchr(self.field_delimiter, line).map(|pos| &line[pos + 1..])
    }

    /// Call `f` for each normalized, non-empty skill token in `line`.
    pub fn for_each_skill(&self, line: &[u8], mut f: impl FnMut(&str)) {
        let Some(field) = self.skill_field(line) else {
            return;
        };

        let mut start = 0;
        for end in memchr::memchr_iter(self.skill_delimiter, field).chain([field.len()]) {
            let raw: Cow<'_, str> = String::from_utf8_lossy(&field[start..end]);
            if let Some(token) = normalize_token(&raw) {
                f(token);
            }
            start = end + 1;
        }
    }

    /// Collect the skills of `line`; convenience for callers that need a list.
    #[must_use]
    pub fn skills(&self, line: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        self.for_each_skill(line, |skill| out.push(skill.to_string()));
        out
    }
}

fn ascii_delimiter(value: char) -> Result<u8> {
    if value.is_ascii() && value != '\n' && value != '\r' {
        Ok(value as u8)
    } else {
        Err(JobdexError::Config(format!(
            "delimiter {value:?} must be a single ASCII character other than a line break"
        )))
    }
}

/// Strip a trailing `\n` / `\r\n`.
#[must_use]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Trim whitespace and one pair of surrounding quotes. `None` when nothing is left.
#[must_use]
pub fn normalize_token(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let unquoted = strip_quotes(trimmed).map_or(trimmed, str::trim);
    (!unquoted.is_empty()).then_some(unquoted)
}

/// Inner text of a `"..."` or `'...'` string, if it is one.
#[must_use]
pub fn strip_quotes(value: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}
