//! Single-episode control loop: policy, optional safety supervisor, simulator.

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::policy::Policy;
use crate::safety::SafetySupervisor;
use crate::sim::{MicrogridSimulator, StepInfo};

/// Totals accumulated over one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeMetrics {
    /// Zero-based episode index within an evaluation.
    pub episode: usize,
    /// Seed the episode was reset with.
    pub seed: u64,
    pub total_reward: f64,
    pub grid_cost: f64,
    pub degradation_cost: f64,
    pub penalty_cost: f64,
    pub unmet_load_kwh: f64,
    pub curtailed_kwh: f64,
    /// Energy drawn from the grid (kWh).
    pub import_kwh: f64,
    /// Energy sent to the grid (kWh).
    pub export_kwh: f64,
    /// Sum of `|battery_kw| * dt` (kWh).
    pub battery_throughput_kwh: f64,
    /// Steps on which the supervisor changed the proposed action.
    pub safety_overrides: usize,
    pub steps: usize,
}

impl EpisodeMetrics {
    fn new(episode: usize, seed: u64) -> Self {
        Self {
            episode,
            seed,
            ..Self::default()
        }
    }

    /// Adds one step's telemetry.
    fn accumulate(&mut self, info: &StepInfo, dt_hours: f64) {
        self.steps += 1;
        self.total_reward += info.reward;
        self.grid_cost += info.cost_grid;
        self.degradation_cost += info.cost_degradation;
        self.penalty_cost += info.cost_penalty;
        self.unmet_load_kwh += info.unmet_load_kwh;
        self.curtailed_kwh += info.curtailed_kwh;
        self.import_kwh += info.grid_kw.max(0.0) * dt_hours;
        self.export_kwh += (-info.grid_kw).max(0.0) * dt_hours;
        self.battery_throughput_kwh += info.battery_kw.abs() * dt_hours;
    }
}

/// Output of [`EpisodeRunner::run`].
#[derive(Debug, Clone)]
pub struct EpisodeRecord {
    pub metrics: EpisodeMetrics,
    /// Per-step telemetry; empty unless enabled with
    /// [`EpisodeRunner::with_telemetry`].
    pub telemetry: Vec<StepInfo>,
}

/// Drives one full episode from reset to termination.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeRunner {
    use_safety: bool,
    record_telemetry: bool,
}

impl Default for EpisodeRunner {
    fn default() -> Self {
        Self::new(true)
    }
}

impl EpisodeRunner {
    /// # Arguments
    ///
    /// * `use_safety` - Route every action through a [`SafetySupervisor`]
    pub fn new(use_safety: bool) -> Self {
        Self {
            use_safety,
            record_telemetry: false,
        }
    }

    pub fn with_telemetry(mut self, record: bool) -> Self {
        self.record_telemetry = record;
        self
    }

    /// Resets `sim` with `seed`, then loops policy → supervisor → step until
    /// the episode terminates.
    ///
    /// # Errors
    ///
    /// Propagates the first error from the policy, supervisor, or simulator.
    pub fn run(
        &self,
        sim: &mut MicrogridSimulator,
        policy: &mut dyn Policy,
        episode: usize,
        seed: u64,
    ) -> Result<EpisodeRecord> {
        let supervisor = self
            .use_safety
            .then(|| SafetySupervisor::new(sim.config()));
        let dt_hours = sim.dt_hours();

        policy.reset(seed);
        let (mut observation, _) = sim.reset(Some(seed), None)?;
        debug!(episode, seed, policy = policy.name(), "episode started");

        let mut metrics = EpisodeMetrics::new(episode, seed);
        let mut telemetry = Vec::new();
        if self.record_telemetry {
            telemetry.reserve(sim.horizon());
        }

        loop {
            let mut action = policy.act(&observation)?;
            if let Some(supervisor) = &supervisor {
                let decision = supervisor.apply(&action, observation.as_slice())?;
                if decision.overridden {
                    metrics.safety_overrides += 1;
                }
                action = decision.action;
            }

            let outcome = sim.step(&action)?;
            metrics.accumulate(&outcome.info, dt_hours);
            if self.record_telemetry {
                telemetry.push(outcome.info);
            }
            observation = outcome.observation;

            if outcome.terminated || outcome.truncated {
                break;
            }
        }

        debug!(
            episode,
            seed,
            total_reward = metrics.total_reward,
            safety_overrides = metrics.safety_overrides,
            steps = metrics.steps,
            "episode finished"
        );
        Ok(EpisodeRecord { metrics, telemetry })
    }
}
