use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

/// Everything a command needs: where it runs, with which settings, and how
/// to report.
pub struct AppContext {
    /// Directory relative store and index paths resolve against.
    pub root: PathBuf,
    /// Explicit config file, if one was given.
    pub config_path: Option<PathBuf>,
    pub config: Config,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = Self::find_root()?;
        let config = Config::load(cli.config.as_deref(), &root)?;

        Ok(Self {
            root,
            config_path: cli.config.clone(),
            config,
            robot_mode: cli.robot,
            verbosity: cli.verbose,
        })
    }

    fn find_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("JOBDEX_ROOT") {
            if !root.is_empty() {
                return Ok(PathBuf::from(root));
            }
        }
        Ok(std::env::current_dir()?)
    }
}
