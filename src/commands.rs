//! The `run`, `plan` and `check` subcommands.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use patchline::config::{ConfigOverrides, ReplayConfig};
use patchline::format::OutputFormat;
use patchline::patch::{PatchSet, clamp_percentage, collect};
use patchline::replay::{self, ReplayOptions};
use patchline::schedule::{Schedule, ScheduleEntry};
use patchline::{Contributor, ReplayError};
use patchline_git::GitCli;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the replay configuration
    #[arg(short, long, env = "PATCHLINE_CONFIG", default_value = "patchline.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Seed for the contributor shuffle (overrides schedule.seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Share of the available patches to apply, 0-100 (overrides schedule.percentage)
    #[arg(long, allow_negative_numbers = true)]
    pub percentage: Option<f64>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Working tree to apply the patches to (overrides repo.path)
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Branch to push (overrides repo.branch)
    #[arg(long)]
    pub branch: Option<String>,

    /// Remote to push to (overrides repo.remote)
    #[arg(long)]
    pub remote: Option<String>,

    /// Create the commits but do not push
    #[arg(long)]
    pub no_push: bool,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

/// Everything a run or a plan needs, computed once.
struct Prepared {
    config: ReplayConfig,
    patches: PatchSet,
    schedule: Schedule,
    seed: u64,
}

fn load_config(path: &Path, overrides: &ConfigOverrides) -> Result<ReplayConfig, ReplayError> {
    let mut config = ReplayConfig::load(path)?;
    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}

fn prepare(config: ReplayConfig) -> Result<Prepared, ReplayError> {
    let patches = PatchSet::gather(&config.sources, config.schedule.percentage)?;
    let window = config.schedule.window_for(patches.selected.len())?;
    let seed = config.schedule.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "shuffling contributor slots");

    let mut rng = StdRng::seed_from_u64(seed);
    let schedule = Schedule::build(
        patches.selected.clone(),
        &config.contributors,
        &window,
        &mut rng,
    );
    Ok(Prepared {
        config,
        patches,
        schedule,
        seed,
    })
}

fn schedule_overrides(args: &ScheduleArgs) -> ConfigOverrides {
    ConfigOverrides {
        percentage: args.percentage,
        seed: args.seed,
        ..ConfigOverrides::default()
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn run(args: &RunArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        repo_path: args.repo.clone(),
        branch: args.branch.clone(),
        remote: args.remote.clone(),
        ..schedule_overrides(&args.schedule)
    };
    let config = load_config(&args.config.config, &overrides)?;
    let prepared = prepare(config)?;
    let config = &prepared.config;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(
        out,
        "Replaying {} of {} patches into {} (seed {})\n",
        prepared.schedule.len(),
        prepared.patches.available(),
        config.repo.path.display(),
        prepared.seed
    )
    .context("failed to write to stdout")?;

    let repo = GitCli::new(&config.repo.path);
    let options = ReplayOptions {
        remote: config.repo.remote.clone(),
        branch: config.repo.branch.clone(),
        push: !args.no_push,
    };
    let report = replay::run(&repo, &prepared.schedule, &options, &mut out)?;
    writeln!(
        out,
        "{} commit(s) created on '{}'{}.",
        report.committed.len(),
        options.branch,
        if report.pushed { ", pushed" } else { ", not pushed" }
    )
    .context("failed to write to stdout")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PlanReport<'a> {
    frontend: usize,
    backend: usize,
    available: usize,
    percentage: f64,
    seed: u64,
    interval_seconds: i64,
    entries: &'a [ScheduleEntry],
    tally: Vec<TallyRow<'a>>,
    idle: &'a [Contributor],
}

#[derive(Serialize)]
struct TallyRow<'a> {
    name: &'a str,
    email: &'a str,
    target_percentage: f64,
    commits: usize,
}

pub fn plan(args: &PlanArgs) -> Result<()> {
    let config = load_config(&args.config.config, &schedule_overrides(&args.schedule))?;
    let prepared = prepare(config)?;
    let config = &prepared.config;

    let report = PlanReport {
        frontend: prepared.patches.frontend,
        backend: prepared.patches.backend,
        available: prepared.patches.available(),
        percentage: clamp_percentage(config.schedule.percentage),
        seed: prepared.seed,
        interval_seconds: prepared.schedule.interval_seconds,
        entries: &prepared.schedule.entries,
        tally: prepared
            .schedule
            .tally(&config.contributors)
            .into_iter()
            .map(|(c, commits)| TallyRow {
                name: &c.name,
                email: &c.email,
                target_percentage: c.percentage,
                commits,
            })
            .collect(),
        idle: prepared.schedule.idle_contributors(),
    };

    println!("{}", args.format.render(&report, render_plan_text)?);
    Ok(())
}

fn render_plan_text(report: &PlanReport<'_>) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "Patches: {} available ({} frontend, {} backend), {} selected ({}%)",
        report.available,
        report.frontend,
        report.backend,
        report.entries.len(),
        report.percentage
    );
    let _ = writeln!(
        s,
        "Interval: {} ({}s)",
        human_duration(report.interval_seconds),
        report.interval_seconds
    );
    let _ = writeln!(s, "Seed: {}", report.seed);
    let _ = writeln!(s);

    let author_width = report
        .entries
        .iter()
        .map(|e| e.contributor.identity().to_string().len())
        .max()
        .unwrap_or(0)
        .max("AUTHOR".len());
    let _ = writeln!(s, "{:>4}  {:<19}  {:<author_width$}  PATCH", "#", "DATE", "AUTHOR");
    for e in report.entries {
        let _ = writeln!(
            s,
            "{:>4}  {:<19}  {:<author_width$}  {}",
            e.index,
            e.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            e.contributor.identity().to_string(),
            e.patch.name
        );
    }

    let _ = writeln!(s);
    let _ = writeln!(s, "Contributors:");
    for row in &report.tally {
        let _ = writeln!(
            s,
            "  {} <{}>: {} commit(s) (target {}%)",
            row.name, row.email, row.commits, row.target_percentage
        );
    }
    for c in report.idle {
        let _ = writeln!(
            s,
            "warning: {} receives no commits ({} patch(es) for {} contributor(s))",
            c.name,
            report.entries.len(),
            report.tally.len()
        );
    }
    s.trim_end().to_owned()
}

/// `2d 9h 30m`-style rendering; seconds only for sub-minute spans.
fn human_duration(total_seconds: i64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if parts.is_empty() || (seconds > 0 && days == 0) {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

pub fn check(args: &CheckArgs) -> Result<()> {
    let config = load_config(&args.config.config, &ConfigOverrides::default())?;
    let ext = &config.sources.extension;
    let frontend = collect(&config.sources.frontend, ext)?.len();
    let backend = collect(&config.sources.backend, ext)?.len();

    if frontend + backend == 0 {
        return Err(ReplayError::NoPatches {
            dirs: vec![config.sources.frontend.clone(), config.sources.backend.clone()],
            extension: ext.trim_start_matches('.').to_owned(),
        }
        .into());
    }
    println!("Config OK: {}", args.config.config.display());
    println!(
        "  frontend: {frontend} patch(es) in {}",
        config.sources.frontend.display()
    );
    println!(
        "  backend:  {backend} patch(es) in {}",
        config.sources.backend.display()
    );
    println!("  contributors: {}", config.contributors.len());
    println!(
        "  window: {} .. {}",
        config.schedule.start, config.schedule.end
    );
    println!(
        "  target: {} -> {}/{}",
        config.repo.path.display(),
        config.repo.remote,
        config.repo.branch
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_duration_forms() {
        assert_eq!(human_duration(0), "0s");
        assert_eq!(human_duration(45), "45s");
        assert_eq!(human_duration(90), "1m 30s");
        assert_eq!(human_duration(205_200), "2d 9h");
        assert_eq!(human_duration(86_400 + 61), "1d 1m");
    }
}
