//! jobdex client - Interactive client for a running engine

use clap::Args;

use crate::app::AppContext;
use crate::client::{Client, run_repl};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Engine address (defaults to engine.listen from config)
    #[arg(long, short, value_name = "ADDR")]
    pub connect: Option<String>,
}

pub fn run(ctx: &AppContext, args: &ClientArgs) -> Result<()> {
    let addr = args
        .connect
        .clone()
        .unwrap_or_else(|| ctx.config.engine.listen.clone());
    let timeout = ctx.config.client.connect_timeout;
    let max_response_bytes = ctx.config.client.max_response_bytes;
    let max_query_bytes = ctx.config.engine.max_query_bytes;

    let summary = super::block_on(async move {
        let mut client = Client::connect(&addr, timeout, max_response_bytes)
            .await?
            .with_max_query_bytes(max_query_bytes);
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();
        run_repl(&mut client, input, &mut output).await
    })??;

    tracing::info!(
        queries = summary.queries,
        no_match = summary.no_match,
        "client session ended"
    );
    Ok(())
}
