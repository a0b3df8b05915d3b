//! Command line entry point
//!
//! Parses arguments, loads configuration, captures the clock and the
//! environment once, then lists, plans or runs the requested target.

pub mod completions;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use targetline::build::{
    BuildContext, BuildLayout, DEFAULT_TARGET, VersionDescriptor, define_pipeline,
};
use targetline::{Config, Environment, ProcessRunner, RunReport, TargetGraph, init_logging};

/// CLI arguments for targetline
#[derive(Parser, Debug)]
#[command(name = "targetline")]
#[command(author, version, about = "Runs the release pipeline up to a target", long_about = None)]
struct Args {
    /// Target to run, with everything it depends on
    #[arg(default_value = DEFAULT_TARGET)]
    target: String,

    /// Build counter stamped into the version
    #[arg(long, default_value_t = 0)]
    build_counter: u16,

    /// Build configuration (overrides the config file)
    #[arg(long)]
    configuration: Option<String>,

    /// Repository root (defaults to the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Config file (defaults to targetline.yaml in the root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (overrides the config file, RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the resolved targets without running them
    #[arg(long, conflicts_with = "list")]
    plan: bool,

    /// Print all targets with their descriptions
    #[arg(long)]
    list: bool,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_enum)]
    completions: Option<Shell>,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        print!("{}", completions::generate_completions(shell)?);
        return Ok(());
    }

    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let config = load_config(&args, &root)?;
    init_logging(&config.log_level);

    let graph = define_pipeline(&config).context("Failed to define pipeline")?;
    if args.list {
        print_targets(&graph);
        return Ok(());
    }

    // Captured once; every target sees the same instant and variables.
    let captured_at = Utc::now();
    let env = Environment::capture();
    let version = VersionDescriptor::compute(args.build_counter, captured_at);
    let layout = BuildLayout::new(&root, &config);
    let ctx = BuildContext::new(config, layout, version, env, Box::new(ProcessRunner::new()));

    if args.plan {
        let plan = graph.plan(&args.target, &ctx)?;
        for (i, entry) in plan.iter().enumerate() {
            let state = if entry.will_run { "run" } else { "skip" };
            println!("{:>2}. {:<12} {state}", i + 1, entry.target);
        }
        return Ok(());
    }

    let report = graph
        .run(&args.target, &ctx)
        .with_context(|| format!("Pipeline '{}' failed", args.target))?;

    for failure in ctx.soft_failures() {
        tracing::warn!(
            site = %failure.site,
            exit_code = failure.exit_code,
            "Tolerated failure: {}",
            failure.command
        );
    }
    print_summary(&report);

    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }
    Ok(())
}

fn load_config(args: &Args, root: &Path) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(root)?,
    };
    if let Some(configuration) = &args.configuration {
        config.configuration.clone_from(configuration);
    }
    if let Some(level) = &args.log_level {
        config.log_level.clone_from(level);
    }
    config.validate()?;
    Ok(config)
}

fn print_targets(graph: &TargetGraph<BuildContext>) {
    for target in graph.targets() {
        let guard = target
            .guard_label()
            .map(|g| format!(" (only when {g})"))
            .unwrap_or_default();
        println!(
            "{:<12} {}{guard}",
            target.id(),
            target.description().unwrap_or_default()
        );
    }
}

fn print_summary(report: &RunReport) {
    for outcome in &report.outcomes {
        println!(
            "{:<9}{:<12} {} ms",
            outcome.status.to_string(),
            outcome.target,
            outcome.duration.as_millis()
        );
    }
    println!(
        "Run {} finished in {} ms",
        report.run_id,
        report.total_duration().as_millis()
    );
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report to: {}", path.display()))
}
