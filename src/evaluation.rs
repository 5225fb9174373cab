//! Multi-episode evaluation with a deterministic seed sequence.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::error::{EmsError, Result};
use crate::policy::Policy;
use crate::runner::{EpisodeMetrics, EpisodeRunner};
use crate::sim::MicrogridSimulator;

/// Averaged metrics over an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub policy: String,
    pub episodes: usize,
    pub avg_reward: f64,
    pub avg_grid_cost: f64,
    pub avg_degradation_cost: f64,
    pub avg_penalty_cost: f64,
    pub avg_unmet_load_kwh: f64,
    pub avg_curtailed_kwh: f64,
    pub avg_import_kwh: f64,
    pub avg_export_kwh: f64,
    pub avg_battery_throughput_kwh: f64,
    pub avg_safety_overrides: f64,
    /// Per-episode metrics in seed order.
    pub details: Vec<EpisodeMetrics>,
}

/// A scalar field of [`EvaluationSummary`] that comparisons can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMetric {
    AvgReward,
    AvgGridCost,
    AvgDegradationCost,
    AvgPenaltyCost,
    AvgUnmetLoadKwh,
    AvgCurtailedKwh,
    AvgImportKwh,
    AvgExportKwh,
    AvgBatteryThroughputKwh,
    AvgSafetyOverrides,
}

impl SummaryMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AvgReward => "avg_reward",
            Self::AvgGridCost => "avg_grid_cost",
            Self::AvgDegradationCost => "avg_degradation_cost",
            Self::AvgPenaltyCost => "avg_penalty_cost",
            Self::AvgUnmetLoadKwh => "avg_unmet_load_kwh",
            Self::AvgCurtailedKwh => "avg_curtailed_kwh",
            Self::AvgImportKwh => "avg_import_kwh",
            Self::AvgExportKwh => "avg_export_kwh",
            Self::AvgBatteryThroughputKwh => "avg_battery_throughput_kwh",
            Self::AvgSafetyOverrides => "avg_safety_overrides",
        }
    }
}

impl fmt::Display for SummaryMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EvaluationSummary {
    /// Averages `details` into a summary.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Config`] if `details` is empty.
    pub fn from_details(policy: &str, details: Vec<EpisodeMetrics>) -> Result<Self> {
        if details.is_empty() {
            return Err(EmsError::config("episodes", "must be greater than 0"));
        }
        let avg = |f: fn(&EpisodeMetrics) -> f64| -> f64 {
            details.iter().map(f).sum::<f64>() / details.len() as f64
        };

        Ok(Self {
            policy: policy.to_string(),
            episodes: details.len(),
            avg_reward: avg(|m| m.total_reward),
            avg_grid_cost: avg(|m| m.grid_cost),
            avg_degradation_cost: avg(|m| m.degradation_cost),
            avg_penalty_cost: avg(|m| m.penalty_cost),
            avg_unmet_load_kwh: avg(|m| m.unmet_load_kwh),
            avg_curtailed_kwh: avg(|m| m.curtailed_kwh),
            avg_import_kwh: avg(|m| m.import_kwh),
            avg_export_kwh: avg(|m| m.export_kwh),
            avg_battery_throughput_kwh: avg(|m| m.battery_throughput_kwh),
            avg_safety_overrides: avg(|m| m.safety_overrides as f64),
            details,
        })
    }

    /// Value of one averaged metric.
    pub fn metric(&self, metric: SummaryMetric) -> f64 {
        match metric {
            SummaryMetric::AvgReward => self.avg_reward,
            SummaryMetric::AvgGridCost => self.avg_grid_cost,
            SummaryMetric::AvgDegradationCost => self.avg_degradation_cost,
            SummaryMetric::AvgPenaltyCost => self.avg_penalty_cost,
            SummaryMetric::AvgUnmetLoadKwh => self.avg_unmet_load_kwh,
            SummaryMetric::AvgCurtailedKwh => self.avg_curtailed_kwh,
            SummaryMetric::AvgImportKwh => self.avg_import_kwh,
            SummaryMetric::AvgExportKwh => self.avg_export_kwh,
            SummaryMetric::AvgBatteryThroughputKwh => self.avg_battery_throughput_kwh,
            SummaryMetric::AvgSafetyOverrides => self.avg_safety_overrides,
        }
    }
}

impl EvaluationSummary {
    /// One fixed-width line for side-by-side benchmark output.
    pub fn benchmark_row(&self, label: &str) -> String {
        format!(
            "{label:>10} | reward={:10.3} | grid={:9.3} | penalty={:9.3} | unmet={:8.3} | overrides={:6.2}",
            self.avg_reward,
            self.avg_grid_cost,
            self.avg_penalty_cost,
            self.avg_unmet_load_kwh,
            self.avg_safety_overrides
        )
    }
}

impl fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Evaluation: {} ({} episodes) ---", self.policy, self.episodes)?;
        writeln!(f, "Avg reward:            {:.3}", self.avg_reward)?;
        writeln!(f, "Avg grid cost:         {:.3}", self.avg_grid_cost)?;
        writeln!(f, "Avg degradation cost:  {:.3}", self.avg_degradation_cost)?;
        writeln!(f, "Avg penalty cost:      {:.3}", self.avg_penalty_cost)?;
        writeln!(f, "Avg unmet load:        {:.2} kWh", self.avg_unmet_load_kwh)?;
        writeln!(f, "Avg curtailed:         {:.2} kWh", self.avg_curtailed_kwh)?;
        writeln!(
            f,
            "Avg import / export:   {:.2} / {:.2} kWh",
            self.avg_import_kwh, self.avg_export_kwh
        )?;
        writeln!(
            f,
            "Avg battery throughput: {:.2} kWh",
            self.avg_battery_throughput_kwh
        )?;
        write!(f, "Avg safety overrides:  {:.2}", self.avg_safety_overrides)
    }
}

/// Runs `episodes` episodes with seeds `seed_start..seed_start + episodes`
/// and averages the results.
///
/// # Arguments
///
/// * `sim` - Simulator, fully reset before each episode
/// * `policy` - Policy under evaluation, reseeded per episode
/// * `episodes` - Number of episodes (must be > 0)
/// * `seed_start` - Seed of the first episode
/// * `use_safety` - Route actions through the safety supervisor
///
/// # Errors
///
/// Returns [`EmsError::Config`] if `episodes == 0` or the last seed would
/// overflow `u64`, before running anything, and propagates the first episode
/// error otherwise.
pub fn evaluate(
    sim: &mut MicrogridSimulator,
    policy: &mut dyn Policy,
    episodes: usize,
    seed_start: u64,
    use_safety: bool,
) -> Result<EvaluationSummary> {
    if episodes == 0 {
        return Err(EmsError::config("episodes", "must be greater than 0"));
    }
    let span = u64::try_from(episodes - 1).ok();
    if span.and_then(|n| seed_start.checked_add(n)).is_none() {
        return Err(EmsError::config(
            "seed_start",
            format!("{seed_start} + {episodes} episodes overflows the seed range"),
        ));
    }

    let runner = EpisodeRunner::new(use_safety);
    let mut details = Vec::with_capacity(episodes);
    for episode in 0..episodes {
        let seed = seed_start + episode as u64;
        details.push(runner.run(sim, policy, episode, seed)?.metrics);
    }

    let summary = EvaluationSummary::from_details(policy.name(), details)?;
    info!(
        policy = %summary.policy,
        episodes,
        seed_start,
        use_safety,
        avg_reward = summary.avg_reward,
        avg_safety_overrides = summary.avg_safety_overrides,
        "evaluation complete"
    );
    Ok(summary)
}
