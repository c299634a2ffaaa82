use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{JobdexError, Result};

/// Project-level config file name, looked up in the jobdex root.
pub const PROJECT_CONFIG_FILE: &str = "jobdex.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("JOBDEX_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&root.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("jobdex/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| JobdexError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| JobdexError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.store {
            self.store.merge(patch);
        }
        if let Some(patch) = patch.index {
            self.index.merge(patch);
        }
        if let Some(patch) = patch.engine {
            self.engine.merge(patch);
        }
        if let Some(patch) = patch.client {
            self.client.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("JOBDEX_STORE_PATH") {
            self.store.path = PathBuf::from(value);
        }
        if let Some(value) = env_bool("JOBDEX_STORE_SKIP_HEADER") {
            self.store.skip_header = value;
        }

        if let Some(value) = env_string("JOBDEX_INDEX_PATH") {
            self.index.path = PathBuf::from(value);
        }
        if let Some(value) = env_usize("JOBDEX_INDEX_WORKERS")? {
            self.index.workers = value;
        }
        if let Some(value) = env_i32("JOBDEX_INDEX_COMPRESSION_LEVEL")? {
            self.index.compression_level = value;
        }

        if let Some(value) = env_string("JOBDEX_ENGINE_LISTEN") {
            self.engine.listen = value;
        }
        if let Some(value) = env_usize("JOBDEX_ENGINE_RESPONSE_BUDGET")? {
            self.engine.response_budget = value;
        }
        if let Some(value) = env_usize("JOBDEX_ENGINE_MAX_QUERY_BYTES")? {
            self.engine.max_query_bytes = value;
        }

        if let Some(value) = env_string("JOBDEX_CLIENT_CONNECT_TIMEOUT") {
            self.client.connect_timeout = humantime_serde::re::humantime::parse_duration(&value)
                .map_err(|err| {
                    JobdexError::Config(format!(
                        "invalid JOBDEX_CLIENT_CONNECT_TIMEOUT value {value}: {err}"
                    ))
                })?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.index.workers == 0 {
            return Err(JobdexError::Config("index.workers must be at least 1".to_string()));
        }
        if self.engine.max_query_bytes == 0 {
            return Err(JobdexError::Config(
                "engine.max_query_bytes must be at least 1".to_string(),
            ));
        }
        if self.engine.response_budget <= self.engine.truncation_marker.len() + 1 {
            return Err(JobdexError::Config(format!(
                "engine.response_budget ({}) must exceed the truncation marker length",
                self.engine.response_budget
            )));
        }
        if self.store.field_delimiter == '\n' || self.store.skill_delimiter == '\n' {
            return Err(JobdexError::Config(
                "store delimiters cannot be a newline".to_string(),
            ));
        }
        Ok(())
    }

    /// Store path, resolved against `root` when relative.
    #[must_use]
    pub fn store_path(&self, root: &Path) -> PathBuf {
        resolve(root, &self.store.path)
    }

    /// Index artifact path, resolved against `root` when relative.
    #[must_use]
    pub fn index_path(&self, root: &Path) -> PathBuf {
        resolve(root, &self.index.path)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub skip_header: bool,
    #[serde(default = "default_delimiter")]
    pub field_delimiter: char,
    #[serde(default = "default_delimiter")]
    pub skill_delimiter: char,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data.csv")
}

const fn default_delimiter() -> char {
    ','
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            skip_header: false,
            field_delimiter: default_delimiter(),
            skill_delimiter: default_delimiter(),
        }
    }
}

impl StoreConfig {
    fn merge(&mut self, patch: StorePatch) {
        if let Some(value) = patch.path {
            self.path = value;
        }
        if let Some(value) = patch.skip_header {
            self.skip_header = value;
        }
        if let Some(value) = patch.field_delimiter {
            self.field_delimiter = value;
        }
        if let Some(value) = patch.skill_delimiter {
            self.skill_delimiter = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

fn default_index_path() -> PathBuf {
    PathBuf::from("dist/jobs.idx.zst")
}

const fn default_workers() -> usize {
    4
}

const fn default_compression_level() -> i32 {
    3
}

const fn default_initial_capacity() -> usize {
    1024
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            workers: default_workers(),
            compression_level: default_compression_level(),
            initial_capacity: default_initial_capacity(),
        }
    }
}

impl IndexConfig {
    fn merge(&mut self, patch: IndexPatch) {
        if let Some(value) = patch.path {
            self.path = value;
        }
        if let Some(value) = patch.workers {
            self.workers = value;
        }
        if let Some(value) = patch.compression_level {
            self.compression_level = value;
        }
        if let Some(value) = patch.initial_capacity {
            self.initial_capacity = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_max_query_bytes")]
    pub max_query_bytes: usize,
    #[serde(default = "default_response_budget")]
    pub response_budget: usize,
    #[serde(default = "default_truncation_marker")]
    pub truncation_marker: String,
}

fn default_listen() -> String {
    "127.0.0.1:5050".to_string()
}

/// Largest query frame an engine accepts unless configured otherwise.
pub const DEFAULT_MAX_QUERY_BYTES: usize = 1024;

const fn default_max_query_bytes() -> usize {
    DEFAULT_MAX_QUERY_BYTES
}

const fn default_response_budget() -> usize {
    8 * 1024
}

fn default_truncation_marker() -> String {
    "... (results truncated) ...".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_query_bytes: default_max_query_bytes(),
            response_budget: default_response_budget(),
            truncation_marker: default_truncation_marker(),
        }
    }
}

impl EngineConfig {
    fn merge(&mut self, patch: EnginePatch) {
        if let Some(value) = patch.listen {
            self.listen = value;
        }
        if let Some(value) = patch.max_query_bytes {
            self.max_query_bytes = value;
        }
        if let Some(value) = patch.response_budget {
            self.response_budget = value;
        }
        if let Some(value) = patch.truncation_marker {
            self.truncation_marker = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

const fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

const fn default_max_response_bytes() -> usize {
    1024 * 1024
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl ClientConfig {
    fn merge(&mut self, patch: ClientPatch) {
        if let Some(value) = patch.connect_timeout {
            self.connect_timeout = value;
        }
        if let Some(value) = patch.max_response_bytes {
            self.max_response_bytes = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub store: Option<StorePatch>,
    pub index: Option<IndexPatch>,
    pub engine: Option<EnginePatch>,
    pub client: Option<ClientPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StorePatch {
    pub path: Option<PathBuf>,
    pub skip_header: Option<bool>,
    pub field_delimiter: Option<char>,
    pub skill_delimiter: Option<char>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IndexPatch {
    pub path: Option<PathBuf>,
    pub workers: Option<usize>,
    pub compression_level: Option<i32>,
    pub initial_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EnginePatch {
    pub listen: Option<String>,
    pub max_query_bytes: Option<usize>,
    pub response_budget: Option<usize>,
    pub truncation_marker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ClientPatch {
    #[serde(default, with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,
    pub max_response_bytes: Option<usize>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|err| JobdexError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_i32(key: &str) -> Result<Option<i32>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<i32>()
            .map(Some)
            .map_err(|err| JobdexError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}
