//! jobdex query - Answer one query locally or against a running engine

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::warn;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::client::Client;
use crate::error::{JobdexError, Result};
use crate::index::SkillIndex;
use crate::query::{QueryEngine, RecordProjector, ResolvedCriterion, Response};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Up to three skills separated by ';' (quote a skill for exact match)
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Send the query to a running engine instead of loading the index.
    /// Without a value, engine.listen from config is used.
    #[arg(long, value_name = "ADDR", num_args = 0..=1, default_missing_value = "")]
    pub remote: Option<String>,
}

#[derive(Serialize)]
struct LocalAnswer<'a> {
    query: &'a str,
    criteria: Vec<CriterionReport>,
    offsets: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    response: Response,
}

#[derive(Serialize)]
struct CriterionReport {
    #[serde(flatten)]
    resolved: ResolvedCriterion,
    postings: usize,
}

#[derive(Serialize)]
struct RemoteAnswer<'a> {
    query: &'a str,
    engine: &'a str,
    response: &'a str,
}

pub fn run(ctx: &AppContext, args: &QueryArgs) -> Result<()> {
    match &args.remote {
        Some(addr) => run_remote(ctx, &args.query, addr),
        None => run_local(ctx, &args.query),
    }
}

fn run_local(ctx: &AppContext, raw: &str) -> Result<()> {
    let index = SkillIndex::load(ctx.config.index_path(&ctx.root))?;
    let engine = QueryEngine::new(index, RecordProjector::from_config(&ctx.config, &ctx.root));

    let (criteria, offsets, outcome) = match engine.evaluate(raw) {
        Ok(resolution) => {
            let outcome = engine.projector().project(&resolution.offsets);
            (resolution.criteria, resolution.offsets, outcome)
        }
        Err(err) if err.is_query_local() => (Vec::new(), Vec::new(), Err(err)),
        Err(err) => return Err(err),
    };

    let (response, reason) = match outcome {
        Ok(response) => (response, None),
        Err(err @ JobdexError::StoreRead(_)) => {
            warn!(error = %err, "record projection failed");
            (Response::NotAvailable, Some(err.to_string()))
        }
        Err(err) => (Response::NotAvailable, Some(err.to_string())),
    };

    if ctx.robot_mode {
        let truncated = response.is_truncated();
        let criteria = criteria
            .into_iter()
            .map(|resolved| CriterionReport {
                postings: resolved.len(),
                resolved,
            })
            .collect();
        let mut output = robot_ok(LocalAnswer {
            query: raw,
            criteria,
            offsets,
            reason,
            response,
        });
        if truncated {
            output = output.with_warning(truncation_warning(ctx));
        }
        return emit_json(&output);
    }

    println!("{}", response.as_wire());
    if response.is_truncated() {
        eprintln!("{} {}", "!".yellow(), truncation_warning(ctx));
    }
    Ok(())
}

fn truncation_warning(ctx: &AppContext) -> String {
    format!(
        "output truncated at {} bytes",
        ctx.config.engine.response_budget
    )
}

fn run_remote(ctx: &AppContext, raw: &str, addr: &str) -> Result<()> {
    let addr = if addr.is_empty() {
        ctx.config.engine.listen.as_str()
    } else {
        addr
    };
    let timeout = ctx.config.client.connect_timeout;
    let max_response_bytes = ctx.config.client.max_response_bytes;
    let max_query_bytes = ctx.config.engine.max_query_bytes;

    let response = super::block_on(async {
        let mut client = Client::connect(addr, timeout, max_response_bytes)
            .await?
            .with_max_query_bytes(max_query_bytes);
        client.query(raw).await
    })??;

    if ctx.robot_mode {
        return emit_json(&robot_ok(RemoteAnswer {
            query: raw,
            engine: addr,
            response: &response,
        }));
    }
    println!("{response}");
    Ok(())
}
