//! jobdex run - Build the index if needed, start an engine and open a client

use clap::Args;

use crate::app::AppContext;
use crate::error::Result;
use crate::launcher::Launcher;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Address for the engine (overrides config)
    #[arg(long, short, value_name = "ADDR")]
    pub listen: Option<String>,
}

pub fn run(ctx: &AppContext, args: &RunArgs) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(listen) = &args.listen {
        config.engine.listen.clone_from(listen);
    }

    let launcher = Launcher::new(config, ctx.root.clone())
        .with_config_path(ctx.config_path.clone())
        .with_verbosity(ctx.verbosity);
    let summary = super::block_on(launcher.run())??;

    tracing::info!(
        queries = summary.queries,
        no_match = summary.no_match,
        "session ended"
    );
    Ok(())
}
