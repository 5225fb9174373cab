//! Microgrid EMS entry point: CLI wiring and config-driven simulator construction.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use microgrid_ems::cli::{
    Args, BenchmarkArgs, Command, CompareArgs, EpisodeArgs, EvaluateArgs, PolicyChoice,
    require_model_path,
};
use microgrid_ems::comparison::compare;
use microgrid_ems::config::MicrogridConfig;
use microgrid_ems::evaluation::{EvaluationSummary, evaluate};
use microgrid_ems::io::{export_telemetry_csv, write_json, write_text};
use microgrid_ems::policy::external::UnavailableLoader;
use microgrid_ems::policy::{ExternalPolicy, Policy, RandomPolicy, RuleBasedPolicy};
use microgrid_ems::runner::EpisodeRunner;
use microgrid_ems::sim::MicrogridSimulator;

#[derive(Serialize)]
struct ComparisonPayload<'a> {
    baseline_summary: &'a EvaluationSummary,
    candidate_summary: &'a EvaluationSummary,
    comparison: &'a microgrid_ems::comparison::ComparisonReport,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("microgrid_ems=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Evaluate(args) => run_evaluate(&args),
        Command::Compare(args) => run_compare(&args),
        Command::Episode(args) => run_episode(&args),
        Command::Benchmark(args) => run_benchmark(&args),
    }
}

fn build_simulator(config: &MicrogridConfig) -> Result<MicrogridSimulator> {
    MicrogridSimulator::from_config(config.clone()).context("failed to build simulator")
}

fn build_policy(
    choice: PolicyChoice,
    model_path: Option<&Path>,
    sim: &MicrogridSimulator,
) -> Result<Box<dyn Policy>> {
    let policy: Box<dyn Policy> = match choice {
        PolicyChoice::Baseline => Box::new(RuleBasedPolicy::new(sim.config())),
        PolicyChoice::Random => Box::new(RandomPolicy::new(
            sim.action_bounds(),
            sim.config().environment.seed,
        )),
        PolicyChoice::Sac | PolicyChoice::Ddpg => {
            let path = require_model_path(choice, model_path)?;
            Box::new(
                ExternalPolicy::load(choice.as_str(), path, &UnavailableLoader)
                    .with_context(|| format!("failed to load {} policy", choice.as_str()))?,
            )
        }
    };
    Ok(policy)
}

fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    let config = args.scenario.resolve()?;
    let mut sim = build_simulator(&config)?;
    let mut policy = build_policy(args.policy, args.model_path.as_deref(), &sim)?;
    let use_safety = !args.no_safety;

    let summary = evaluate(
        &mut sim,
        policy.as_mut(),
        args.episodes,
        args.seed_start,
        use_safety,
    )?;
    println!("{summary}");

    if let Some(path) = &args.json_out {
        write_json(&summary, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "JSON report written");
    }

    if let Some(path) = &args.telemetry_out {
        let record = EpisodeRunner::new(use_safety)
            .with_telemetry(true)
            .run(&mut sim, policy.as_mut(), 0, args.seed_start)?;
        export_telemetry_csv(&record.telemetry, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), steps = record.telemetry.len(), "telemetry written");
    }

    Ok(())
}

fn run_compare(args: &CompareArgs) -> Result<()> {
    let config = args.scenario.resolve()?;
    let use_safety = !args.no_safety;

    let mut baseline_sim = build_simulator(&config)?;
    let mut baseline_policy = build_policy(PolicyChoice::Baseline, None, &baseline_sim)?;
    let mut candidate_sim = build_simulator(&config)?;
    let mut candidate_policy =
        build_policy(args.candidate, args.model_path.as_deref(), &candidate_sim)?;

    let baseline = evaluate(
        &mut baseline_sim,
        baseline_policy.as_mut(),
        args.episodes,
        args.seed_start,
        use_safety,
    )?;
    let candidate = evaluate(
        &mut candidate_sim,
        candidate_policy.as_mut(),
        args.episodes,
        args.seed_start,
        use_safety,
    )?;

    let report = compare(&baseline, &candidate);
    println!("{report}");

    let payload = ComparisonPayload {
        baseline_summary: &baseline,
        candidate_summary: &candidate,
        comparison: &report,
    };
    write_json(&payload, &args.json_out)
        .with_context(|| format!("failed to write {}", args.json_out.display()))?;
    info!(path = %args.json_out.display(), "JSON report written");

    write_text(&report.to_markdown(), &args.markdown_out)
        .with_context(|| format!("failed to write {}", args.markdown_out.display()))?;
    info!(path = %args.markdown_out.display(), "Markdown report written");

    Ok(())
}

fn run_episode(args: &EpisodeArgs) -> Result<()> {
    let config = args.scenario.resolve()?;
    let seed = config.environment.seed;
    let mut sim = build_simulator(&config)?;
    let mut policy = RandomPolicy::new(sim.action_bounds(), seed);

    let record = EpisodeRunner::new(true)
        .with_telemetry(args.verbose)
        .run(&mut sim, &mut policy, 0, seed)?;
    for step in &record.telemetry {
        println!("{step}");
    }

    let metrics = record.metrics;
    println!("Episode reward: {:.2}", metrics.total_reward);
    println!("Safety overrides: {}", metrics.safety_overrides);
    Ok(())
}

fn run_benchmark(args: &BenchmarkArgs) -> Result<()> {
    let config = args.scenario.resolve()?;
    let use_safety = !args.no_safety;
    let learned = args.learned_entry()?;

    let mut entries = vec![
        ("random".to_string(), PolicyChoice::Random, None),
        ("baseline".to_string(), PolicyChoice::Baseline, None),
    ];
    if let Some((algo, path)) = learned {
        let choice = algo.policy_choice();
        entries.push((choice.as_str().to_string(), choice, Some(path)));
    }

    let mut rows = Vec::with_capacity(entries.len());
    for (label, choice, model_path) in entries {
        let mut sim = build_simulator(&config)?;
        let mut policy = build_policy(choice, model_path, &sim)?;
        let summary = evaluate(
            &mut sim,
            policy.as_mut(),
            args.episodes,
            args.seed_start,
            use_safety,
        )?;
        rows.push(summary.benchmark_row(&label));
    }

    println!("Benchmark results:");
    for row in rows {
        println!("{row}");
    }
    Ok(())
}
