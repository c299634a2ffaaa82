//! jobdex index - Build the skill index from the record store

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::codec::block::CompressionLevel;
use crate::error::Result;
use crate::index::{BuildPhase, BuildReport, Indexer};
use crate::utils::{format_count, format_elapsed, format_size};

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Record store to index (overrides config)
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Artifact path to write (overrides config)
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Number of parallel scan workers
    #[arg(long, short, value_name = "N")]
    pub workers: Option<usize>,

    /// zstd compression level for the artifact (overrides config)
    #[arg(long, value_name = "LEVEL", value_parser = clap::value_parser!(i32).range(1..=22))]
    pub level: Option<i32>,

    /// Treat the first line of the store as a header
    #[arg(long)]
    pub skip_header: bool,

    /// Rebuild even if the artifact already exists
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Serialize)]
struct SkippedBuild {
    skipped: bool,
    artifact: PathBuf,
    reason: &'static str,
}

pub fn run(ctx: &AppContext, args: &IndexArgs) -> Result<()> {
    let mut indexer = Indexer::from_config(&ctx.config, &ctx.root)?;
    if let Some(store) = &args.store {
        indexer = indexer.with_store(store);
    }
    if let Some(output) = &args.output {
        indexer = indexer.with_artifact(output);
    }
    if let Some(workers) = args.workers {
        indexer = indexer.with_workers(workers);
    }
    if let Some(level) = args.level {
        indexer = indexer.with_compression_level(CompressionLevel(level));
    }
    if args.skip_header {
        indexer = indexer.with_skip_header(true);
    }

    if !args.force && indexer.artifact_path().is_file() {
        let artifact = indexer.artifact_path().to_path_buf();
        if ctx.robot_mode {
            return emit_json(&robot_ok(SkippedBuild {
                skipped: true,
                artifact,
                reason: "artifact exists; pass --force to rebuild",
            }));
        }
        println!(
            "{} Index already exists at {} (use --force to rebuild)",
            "=".dimmed(),
            artifact.display()
        );
        return Ok(());
    }

    if ctx.robot_mode {
        let report = indexer.build()?;
        return emit_json(&robot_ok(report));
    }

    let report = build_with_spinner(&indexer)?;
    emit_human(&summary_layout(&report));
    Ok(())
}

fn build_with_spinner(indexer: &Indexer) -> Result<BuildReport> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = indexer.build_with_progress(|phase| {
        spinner.set_message(match phase {
            BuildPhase::Scanning { workers } => {
                format!("Scanning {} with {workers} workers", indexer.store_path().display())
            }
            BuildPhase::Merging { partitions } => format!("Merging {partitions} partitions"),
            BuildPhase::Writing { skills } => {
                format!("Writing {} skills", format_count(skills as u64))
            }
        });
    });
    spinner.finish_and_clear();

    let report = result?;
    println!(
        "{} Indexed {} records in {}",
        "✓".green().bold(),
        format_count(report.records),
        format_elapsed(report.total_time)
    );
    println!();
    Ok(report)
}

fn summary_layout(report: &BuildReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .section("Index")
        .kv("store", &report.store.display().to_string())
        .kv("artifact", &report.artifact.display().to_string())
        .kv("workers", &report.workers.to_string())
        .kv("records", &format_count(report.records))
        .kv("skills", &format_count(report.skills as u64))
        .kv("postings", &format_count(report.postings as u64))
        .kv("payload", &format_size(report.payload_bytes as u64))
        .kv("artifact size", &format_size(report.artifact_bytes as u64))
        .blank()
        .section("Timings")
        .kv("scan", &format_elapsed(report.scan_time))
        .kv("merge", &format_elapsed(report.merge_time))
        .kv("write", &format_elapsed(report.write_time))
        .kv("total", &format_elapsed(report.total_time));
    layout
}
