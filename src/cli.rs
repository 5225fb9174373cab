//! Command-line interface definition.

use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use crate::config::MicrogridConfig;
use crate::error::{EmsError, Result};

#[derive(Debug, Parser)]
#[command(author, version, about = "Microgrid energy management simulator and policy evaluator")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate one policy over several seeded episodes.
    Evaluate(EvaluateArgs),

    /// Compare the rule-based baseline against a candidate policy.
    Compare(CompareArgs),

    /// Run one random-policy episode with the safety supervisor.
    Episode(EpisodeArgs),

    /// Evaluate random, baseline, and an optional learned policy on the same seeds.
    Benchmark(BenchmarkArgs),
}

/// Policies selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyChoice {
    Baseline,
    Random,
    Sac,
    Ddpg,
}

impl PolicyChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Random => "random",
            Self::Sac => "sac",
            Self::Ddpg => "ddpg",
        }
    }
}

/// Learned-policy algorithms accepted by `benchmark`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RlAlgo {
    Sac,
    Ddpg,
}

impl RlAlgo {
    pub fn policy_choice(self) -> PolicyChoice {
        match self {
            Self::Sac => PolicyChoice::Sac,
            Self::Ddpg => PolicyChoice::Ddpg,
        }
    }
}

/// Options shared by every subcommand that builds a simulator.
#[derive(Debug, Clone, ClapArgs)]
pub struct ScenarioArgs {
    /// Load configuration from a TOML file.
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Use a built-in preset (default, high_renewable, tight_grid).
    #[arg(long)]
    pub preset: Option<String>,

    /// Override `environment.seed`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Read profiles from this CSV instead of generating them.
    #[arg(long)]
    pub profile_csv: Option<PathBuf>,
}

impl ScenarioArgs {
    /// Loads the selected configuration, applies overrides, and validates.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Config`] for an unknown preset or invalid values
    /// and [`EmsError::Resource`] if the config file cannot be read.
    pub fn resolve(&self) -> Result<MicrogridConfig> {
        let mut config = match (&self.config, &self.preset) {
            (Some(path), _) => MicrogridConfig::from_toml_file(path)?,
            (None, Some(name)) => MicrogridConfig::from_preset(name)?,
            (None, None) => MicrogridConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.environment.seed = seed;
        }
        if let Some(path) = &self.profile_csv {
            config.environment.profile_csv = Some(path.clone());
        }
        config.ensure_valid()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, ClapArgs)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Policy to evaluate.
    #[arg(long, value_enum, default_value_t = PolicyChoice::Baseline)]
    pub policy: PolicyChoice,

    /// Trained model artifact (required for sac/ddpg).
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub episodes: usize,

    /// Seed of the first episode; later episodes count up from here.
    #[arg(long, default_value_t = 1000)]
    pub seed_start: u64,

    /// Disable the safety supervisor.
    #[arg(long)]
    pub no_safety: bool,

    /// Write the evaluation summary as JSON.
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Write per-step telemetry of the first episode as CSV.
    #[arg(long)]
    pub telemetry_out: Option<PathBuf>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct CompareArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Candidate policy compared against the baseline.
    #[arg(long, value_enum, default_value_t = PolicyChoice::Random)]
    pub candidate: PolicyChoice,

    /// Trained model artifact (required for sac/ddpg candidates).
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    #[arg(long, default_value_t = 20)]
    pub episodes: usize,

    #[arg(long, default_value_t = 2000)]
    pub seed_start: u64,

    /// Disable the safety supervisor for both policies.
    #[arg(long)]
    pub no_safety: bool,

    #[arg(long, default_value = "reports/baseline_vs_candidate.json")]
    pub json_out: PathBuf,

    #[arg(long, default_value = "reports/baseline_vs_candidate.md")]
    pub markdown_out: PathBuf,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct EpisodeArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Print one telemetry line per step.
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct BenchmarkArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    #[arg(long, default_value_t = 20)]
    pub episodes: usize,

    #[arg(long, default_value_t = 1500)]
    pub seed_start: u64,

    /// Disable the safety supervisor for every policy.
    #[arg(long)]
    pub no_safety: bool,

    /// Add a learned policy as a third entry.
    #[arg(long, value_enum)]
    pub rl_algo: Option<RlAlgo>,

    /// Trained model artifact for `--rl-algo`.
    #[arg(long, alias = "rl-model-path")]
    pub model_path: Option<PathBuf>,
}

impl BenchmarkArgs {
    /// The learned entry, if one was requested.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Config`] unless `--rl-algo` and `--model-path`
    /// are given together.
    pub fn learned_entry(&self) -> Result<Option<(RlAlgo, &Path)>> {
        match (self.rl_algo, self.model_path.as_deref()) {
            (None, None) => Ok(None),
            (Some(algo), Some(path)) => Ok(Some((algo, path))),
            _ => Err(EmsError::config(
                "rl_algo",
                "--rl-algo and --model-path must be provided together",
            )),
        }
    }
}

/// Model path for a learned policy.
///
/// # Errors
///
/// Returns [`EmsError::Config`] when `model_path` is absent.
pub fn require_model_path(choice: PolicyChoice, model_path: Option<&Path>) -> Result<&Path> {
    model_path.ok_or_else(|| {
        EmsError::config(
            "model_path",
            format!("--model-path is required for {} policies", choice.as_str()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("microgrid-ems").chain(args.iter().copied()))
    }

    #[test]
    fn evaluate_defaults() {
        let args = parse(&["evaluate"]).unwrap();
        let Command::Evaluate(e) = args.command else {
            panic!("expected evaluate");
        };
        assert_eq!(e.policy, PolicyChoice::Baseline);
        assert_eq!(e.episodes, 10);
        assert_eq!(e.seed_start, 1000);
        assert!(!e.no_safety);
        assert!(e.json_out.is_none());
    }

    #[test]
    fn evaluate_with_options() {
        let args = parse(&[
            "evaluate",
            "--policy",
            "sac",
            "--model-path",
            "models/sac.zip",
            "--episodes",
            "3",
            "--no-safety",
            "--preset",
            "tight_grid",
            "--seed",
            "9",
        ])
        .unwrap();
        let Command::Evaluate(e) = args.command else {
            panic!("expected evaluate");
        };
        assert_eq!(e.policy, PolicyChoice::Sac);
        assert_eq!(e.model_path, Some(PathBuf::from("models/sac.zip")));
        assert_eq!(e.episodes, 3);
        assert!(e.no_safety);
        assert_eq!(e.scenario.preset.as_deref(), Some("tight_grid"));
        assert_eq!(e.scenario.seed, Some(9));
    }

    #[test]
    fn compare_defaults() {
        let args = parse(&["compare"]).unwrap();
        let Command::Compare(c) = args.command else {
            panic!("expected compare");
        };
        assert_eq!(c.candidate, PolicyChoice::Random);
        assert_eq!(c.episodes, 20);
        assert_eq!(c.seed_start, 2000);
        assert_eq!(c.markdown_out, PathBuf::from("reports/baseline_vs_candidate.md"));
    }

    #[test]
    fn benchmark_defaults() {
        let args = parse(&["benchmark"]).unwrap();
        let Command::Benchmark(b) = args.command else {
            panic!("expected benchmark");
        };
        assert_eq!(b.episodes, 20);
        assert_eq!(b.seed_start, 1500);
        assert!(b.learned_entry().unwrap().is_none());
    }

    #[test]
    fn benchmark_learned_entry_needs_both_flags() {
        let args = parse(&["benchmark", "--rl-algo", "ddpg", "--rl-model-path", "m.zip"]).unwrap();
        let Command::Benchmark(b) = args.command else {
            panic!("expected benchmark");
        };
        let (algo, path) = b.learned_entry().unwrap().unwrap();
        assert_eq!(algo.policy_choice(), PolicyChoice::Ddpg);
        assert_eq!(path, Path::new("m.zip"));

        let args = parse(&["benchmark", "--rl-algo", "sac"]).unwrap();
        let Command::Benchmark(b) = args.command else {
            panic!("expected benchmark");
        };
        assert!(matches!(b.learned_entry(), Err(EmsError::Config(_))));
    }

    #[test]
    fn episode_verbose_flag() {
        let args = parse(&["episode", "-v"]).unwrap();
        let Command::Episode(e) = args.command else {
            panic!("expected episode");
        };
        assert!(e.verbose);
    }

    #[test]
    fn unknown_policy_rejected() {
        assert!(parse(&["evaluate", "--policy", "ppo"]).is_err());
    }

    #[test]
    fn config_and_preset_conflict() {
        assert!(parse(&["episode", "--config", "a.toml", "--preset", "default"]).is_err());
    }

    #[test]
    fn scenario_overrides_apply() {
        let scenario = ScenarioArgs {
            config: None,
            preset: Some("high_renewable".into()),
            seed: Some(77),
            profile_csv: None,
        };
        let cfg = scenario.resolve().unwrap();
        assert_eq!(cfg.environment.seed, 77);
        assert_eq!(cfg, {
            let mut expected = MicrogridConfig::high_renewable();
            expected.environment.seed = 77;
            expected
        });
    }

    #[test]
    fn unknown_preset_is_config_error() {
        let scenario = ScenarioArgs {
            config: None,
            preset: Some("nope".into()),
            seed: None,
            profile_csv: None,
        };
        assert!(matches!(scenario.resolve(), Err(EmsError::Config(_))));
    }

    #[test]
    fn learned_policy_needs_model_path() {
        assert!(matches!(
            require_model_path(PolicyChoice::Ddpg, None),
            Err(EmsError::Config(_))
        ));
        let path = PathBuf::from("m.zip");
        assert_eq!(
            require_model_path(PolicyChoice::Sac, Some(path.as_path())).unwrap(),
            Path::new("m.zip")
        );
    }
}
