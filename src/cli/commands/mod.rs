//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use std::future::Future;

use clap::Subcommand;

pub mod client;
pub mod index;
pub mod query;
pub mod run;
pub mod serve;
pub mod stats;

use crate::app::AppContext;
use crate::error::{JobdexError, Result};

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Index(args) => index::run(ctx, args),
        Commands::Serve(args) => serve::run(ctx, args),
        Commands::Query(args) => query::run(ctx, args),
        Commands::Client(args) => client::run(ctx, args),
        Commands::Run(args) => run::run(ctx, args),
        Commands::Stats(args) => stats::run(ctx, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the skill index from the record store
    Index(index::IndexArgs),

    /// Load the index and answer queries over TCP
    Serve(serve::ServeArgs),

    /// Answer one query locally or against a running engine
    Query(query::QueryArgs),

    /// Interactive client for a running engine
    Client(client::ClientArgs),

    /// Build the index if needed, start an engine and open a client
    Run(run::RunArgs),

    /// Summarize the index artifact
    Stats(stats::StatsArgs),
}

/// Drive an async command to completion on a fresh runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("jobdex-rt")
        .build()
        .map_err(|err| JobdexError::Transport(format!("start async runtime: {err}")))?;
    Ok(runtime.block_on(future))
}
