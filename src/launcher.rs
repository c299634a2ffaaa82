//! `jobdex run`: make sure the index exists, start an engine process and
//! attach an interactive client to it.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::client::{Client, ReplSummary, run_repl};
use crate::config::Config;
use crate::error::{JobdexError, Result};
use crate::index::{BuildReport, Indexer};

#[derive(Debug, Clone)]
pub struct Launcher {
    config: Config,
    root: PathBuf,
    config_path: Option<PathBuf>,
    engine_exe: Option<PathBuf>,
    verbosity: u8,
}

impl Launcher {
    #[must_use]
    pub const fn new(config: Config, root: PathBuf) -> Self {
        Self {
            config,
            root,
            config_path: None,
            engine_exe: None,
            verbosity: 0,
        }
    }

    /// Config file forwarded to the engine process.
    #[must_use]
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Binary started as the engine. Defaults to the running executable.
    #[must_use]
    pub fn with_engine_exe(mut self, exe: PathBuf) -> Self {
        self.engine_exe = Some(exe);
        self
    }

    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Fail when the store is missing; build the index when the artifact is.
    pub async fn ensure_index(&self) -> Result<Option<BuildReport>> {
        let store = self.config.store_path(&self.root);
        if !store.is_file() {
            return Err(JobdexError::MissingStore(store));
        }
        let artifact = self.config.index_path(&self.root);
        if artifact.is_file() {
            info!(artifact = %artifact.display(), "using existing index");
            return Ok(None);
        }

        info!(artifact = %artifact.display(), "index missing, building");
        let indexer = Indexer::from_config(&self.config, &self.root)?;
        let report = tokio::task::spawn_blocking(move || indexer.build())
            .await
            .map_err(|err| JobdexError::Build(format!("index worker panicked: {err}")))??;
        Ok(Some(report))
    }

    /// Start `jobdex serve` as a child process.
    pub fn spawn_engine(&self) -> Result<EngineProcess> {
        let exe = match &self.engine_exe {
            Some(exe) => exe.clone(),
            None => std::env::current_exe()?,
        };
        let addr = self.config.engine.listen.clone();

        let mut command = Command::new(&exe);
        if self.verbosity == 0 {
            command.arg("--quiet");
        } else {
            command.arg(format!("-{}", "v".repeat(usize::from(self.verbosity))));
        }
        if let Some(path) = &self.config_path {
            command.arg("--config").arg(path);
        }
        command
            .arg("serve")
            .arg("--listen")
            .arg(&addr)
            .env("JOBDEX_ROOT", &self.root)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|err| {
            JobdexError::Transport(format!("start engine {}: {err}", exe.display()))
        })?;
        info!(pid = child.id(), %addr, "engine process started");
        Ok(EngineProcess { child, addr })
    }

    /// Build if needed, start the engine, run the REPL on stdin/stdout,
    /// then stop the engine.
    pub async fn run(&self) -> Result<ReplSummary> {
        self.ensure_index().await?;
        let mut engine = self.spawn_engine()?;

        let outcome = async {
            let mut client = engine
                .wait_ready(
                    self.config.client.connect_timeout,
                    self.config.client.max_response_bytes,
                )
                .await?
                .with_max_query_bytes(self.config.engine.max_query_bytes);
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut output = tokio::io::stdout();
            run_repl(&mut client, input, &mut output).await
        }
        .await;

        engine.stop().await?;
        outcome
    }
}

/// A running engine child process.
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
    addr: String,
}

impl EngineProcess {
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Wait until the engine accepts connections. Fails early if the
    /// process exits first.
    pub async fn wait_ready(
        &mut self,
        timeout: std::time::Duration,
        max_response_bytes: usize,
    ) -> Result<Client> {
        tokio::select! {
            client = Client::connect_with_retry(&self.addr, timeout, max_response_bytes) => client,
            status = self.child.wait() => {
                let status = status?;
                Err(JobdexError::Transport(format!("engine exited before accepting connections ({status})")))
            }
        }
    }

    pub async fn stop(mut self) -> Result<()> {
        if let Some(status) = self.child.try_wait()? {
            warn!(%status, "engine already exited");
            return Ok(());
        }
        self.child.kill().await?;
        info!("engine process stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::UnitTestFixture;

    fn config_for(fixture: &UnitTestFixture) -> Config {
        let mut config = Config::default();
        config.store.path = fixture.path("data.csv");
        config.index.path = fixture.path("dist/jobs.idx.zst");
        config.index.workers = 2;
        config
    }

    #[tokio::test]
    async fn test_missing_store_is_reported() {
        let fixture = UnitTestFixture::new();
        let launcher = Launcher::new(config_for(&fixture), fixture.root().to_path_buf());
        assert!(matches!(
            launcher.ensure_index().await,
            Err(JobdexError::MissingStore(_))
        ));
    }

    #[tokio::test]
    async fn test_builds_index_once() {
        let fixture = UnitTestFixture::new();
        fixture.create_file("data.csv", "1,Go\n2,Rust\n");
        let launcher = Launcher::new(config_for(&fixture), fixture.root().to_path_buf());

        let report = launcher.ensure_index().await.unwrap().unwrap();
        assert_eq!(report.records, 2);
        assert!(fixture.path("dist/jobs.idx.zst").is_file());
        assert!(launcher.ensure_index().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_engine_that_exits_early_is_an_error() {
        let fixture = UnitTestFixture::new();
        let mut config = config_for(&fixture);
        config.engine.listen = "127.0.0.1:9".to_string();
        let launcher = Launcher::new(config, fixture.root().to_path_buf())
            .with_engine_exe(PathBuf::from("true"));
        let mut engine = launcher.spawn_engine().unwrap();
        let result = engine
            .wait_ready(std::time::Duration::from_secs(5), 1024)
            .await;
        assert!(result.is_err());
    }
}
