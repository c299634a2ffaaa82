//! jobdex serve - Load the index and answer queries over TCP

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::Result;
use crate::index::SkillIndex;
use crate::query::{QueryEngine, RecordProjector};
use crate::server::Server;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides config)
    #[arg(long, short, value_name = "ADDR")]
    pub listen: Option<String>,
}

pub fn run(ctx: &AppContext, args: &ServeArgs) -> Result<()> {
    let index = SkillIndex::load(ctx.config.index_path(&ctx.root))?;
    let projector = RecordProjector::from_config(&ctx.config, &ctx.root);
    let engine = QueryEngine::new(index, projector);
    let listen = args
        .listen
        .clone()
        .unwrap_or_else(|| ctx.config.engine.listen.clone());
    let max_query_bytes = ctx.config.engine.max_query_bytes;

    let summary = super::block_on(async move {
        let server = Server::bind(engine, &listen, max_query_bytes).await?;
        if !ctx.robot_mode {
            println!(
                "{} Engine listening on {} (Ctrl-C to stop)",
                "✓".green().bold(),
                server.local_addr()?
            );
        }
        server.serve().await
    })??;

    if ctx.robot_mode {
        emit_json(&robot_ok(summary))
    } else {
        println!(
            "Served {} queries over {} connections",
            summary.queries, summary.connections
        );
        Ok(())
    }
}
