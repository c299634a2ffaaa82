//! jobdex stats - Summarize the index artifact

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::index::{ArtifactStats, SkillIndex};
use crate::utils::{format_count, format_size, truncate_string};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Number of most frequent skills to list
    #[arg(long, short, default_value_t = 10, value_name = "N")]
    pub top: usize,
}

#[derive(Serialize)]
struct StatsReport {
    artifact: PathBuf,
    #[serde(flatten)]
    stats: ArtifactStats,
    compression_ratio: f64,
    top_skills: Vec<SkillCount>,
}

#[derive(Serialize)]
struct SkillCount {
    skill: String,
    postings: usize,
}

pub fn run(ctx: &AppContext, args: &StatsArgs) -> Result<()> {
    let artifact = ctx.config.index_path(&ctx.root);
    let index = SkillIndex::load(&artifact)?;
    let stats = *index.stats();
    let top_skills: Vec<SkillCount> = index
        .most_frequent(args.top)
        .into_iter()
        .map(|entry| SkillCount {
            skill: entry.skill.clone(),
            postings: entry.offsets.len(),
        })
        .collect();

    let report = StatsReport {
        artifact,
        stats,
        compression_ratio: stats.compression_ratio(),
        top_skills,
    };

    if ctx.robot_mode {
        return emit_json(&robot_ok(report));
    }

    let mut layout = HumanLayout::new();
    layout
        .section("Skill index")
        .kv("artifact", &report.artifact.display().to_string())
        .kv("skills", &format_count(stats.entries as u64))
        .kv("postings", &format_count(stats.postings as u64))
        .kv("payload", &format_size(stats.payload_bytes as u64))
        .kv("artifact size", &format_size(stats.artifact_bytes as u64))
        .kv("compression", &format!("{:.2}x", report.compression_ratio));

    if !report.top_skills.is_empty() {
        layout.blank().section("Most frequent skills");
        let width = report
            .top_skills
            .iter()
            .map(|entry| entry.postings.to_string().len())
            .max()
            .unwrap_or(1);
        for entry in &report.top_skills {
            layout.push_line(format!(
                "{:>width$}  {}",
                entry.postings,
                truncate_string(&entry.skill, 60)
            ));
        }
    }
    emit_human(&layout);
    Ok(())
}
