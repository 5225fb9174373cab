//! Simulation engine that advances microgrid state one dispatch step at a time.

use tracing::debug;

use crate::config::MicrogridConfig;
use crate::error::{EmsError, Result};
use crate::profiles::{ProfileProvider, Profiles};

use super::battery::Battery;
use super::power_balance::{balancing_grid_kw, site_balance};
use super::reward::{CostInputs, step_costs};
use super::types::{
    Action, ActionBounds, Observation, ResetInfo, StepInfo, StepOutcome,
};

/// Episode state owned by the simulator while running.
#[derive(Debug)]
struct Episode {
    profiles: Profiles,
    t: usize,
}

/// Battery, renewable, load, and grid connection stepped as a control loop.
///
/// The simulator has two states. It starts terminal; [`reset`] moves it to
/// running, and reaching the horizon in [`step`] moves it back.
///
/// [`reset`]: MicrogridSimulator::reset
/// [`step`]: MicrogridSimulator::step
pub struct MicrogridSimulator {
    config: MicrogridConfig,
    provider: Box<dyn ProfileProvider>,
    battery: Battery,
    episode: Option<Episode>,
}

impl MicrogridSimulator {
    /// Creates a simulator after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Config`] listing every invalid field.
    pub fn new(config: MicrogridConfig, provider: Box<dyn ProfileProvider>) -> Result<Self> {
        config.ensure_valid()?;
        let battery = Battery::new(&config.battery);
        Ok(Self {
            config,
            provider,
            battery,
            episode: None,
        })
    }

    /// Creates a simulator with the profile source named by the config.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Resource`] if the configured CSV file is missing,
    /// and [`EmsError::Config`] for invalid settings.
    pub fn from_config(config: MicrogridConfig) -> Result<Self> {
        config.ensure_valid()?;
        let provider = crate::profiles::provider_for(&config)?;
        Self::new(config, provider)
    }

    /// Starts a new episode.
    ///
    /// # Arguments
    ///
    /// * `seed` - Profile seed; `None` uses `environment.seed`
    /// * `soc_override` - Starting SoC in place of `soc_init`, clamped to the window
    ///
    /// # Errors
    ///
    /// Returns an error if the profile provider fails or returns series of
    /// the wrong length.
    pub fn reset(
        &mut self,
        seed: Option<u64>,
        soc_override: Option<f64>,
    ) -> Result<(Observation, ResetInfo)> {
        let seed = seed.unwrap_or(self.config.environment.seed);
        let horizon = self.config.environment.horizon;
        let profiles = self
            .provider
            .profiles(horizon, self.dt_hours(), seed)?;
        let lengths = [
            profiles.renewable_kw.len(),
            profiles.load_kw.len(),
            profiles.price_import_per_kwh.len(),
            profiles.price_export_per_kwh.len(),
        ];
        if lengths.iter().any(|&len| len != horizon) {
            return Err(EmsError::MalformedInput(format!(
                "profile provider returned series of {lengths:?} steps for horizon {horizon}"
            )));
        }

        self.battery.reset(soc_override);
        self.episode = Some(Episode { profiles, t: 0 });
        debug!(seed, soc = self.battery.soc(), "simulator reset");

        let info = ResetInfo {
            seed,
            soc: self.battery.soc(),
            temperature_c: self.battery.temperature_c(),
        };
        Ok((self.observe()?, info))
    }

    /// Applies `action` for one step and returns the next observation,
    /// reward, termination flags, and telemetry.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::EpisodeNotRunning`] if the simulator was never
    /// reset or the previous step terminated the episode.
    pub fn step(&mut self, action: &Action) -> Result<StepOutcome> {
        let dt = self.dt_hours();
        let grid_cfg = &self.config.grid;
        let episode = self.episode.as_mut().ok_or(EmsError::EpisodeNotRunning)?;

        let idx = episode.t;
        let point = episode.profiles.at(idx);

        let dispatch = self.battery.dispatch(action.battery_kw(), dt);
        let battery_kw = dispatch.actual_kw;

        let grid_kw = match action.grid_kw() {
            Some(cmd) => cmd.clamp(-grid_cfg.max_export_kw, grid_cfg.max_import_kw),
            None => balancing_grid_kw(
                point.load_kw,
                point.renewable_kw,
                battery_kw,
                grid_cfg.max_import_kw,
                grid_cfg.max_export_kw,
            ),
        };

        let balance = site_balance(point.renewable_kw, battery_kw, grid_kw, point.load_kw, dt);
        let costs = step_costs(
            &CostInputs {
                grid_kw,
                battery_kw,
                price_import_per_kwh: point.price_import_per_kwh,
                price_export_per_kwh: point.price_export_per_kwh,
                unmet_load_kwh: balance.unmet_load_kwh,
                curtailed_kwh: balance.curtailed_kwh,
                clipped_energy_kwh: dispatch.clipped_energy_kwh,
                dt_hours: dt,
            },
            &self.config.battery,
            &self.config.reward,
        );
        let reward = costs.reward();

        self.battery.update_temperature(battery_kw);

        episode.t += 1;
        let terminated = episode.t >= self.config.environment.horizon;

        let info = StepInfo {
            timestep: idx,
            renewable_kw: point.renewable_kw,
            load_kw: point.load_kw,
            battery_kw,
            grid_kw,
            soc: self.battery.soc(),
            temperature_c: self.battery.temperature_c(),
            net_balance_kw: balance.net_kw,
            unmet_load_kwh: balance.unmet_load_kwh,
            curtailed_kwh: balance.curtailed_kwh,
            clipped_energy_kwh: dispatch.clipped_energy_kwh,
            cost_grid: costs.grid,
            cost_degradation: costs.degradation,
            cost_penalty: costs.penalty,
            reward,
        };

        let observation = self.observe()?;
        if terminated {
            self.episode = None;
        }

        Ok(StepOutcome {
            observation,
            reward,
            terminated,
            truncated: false,
            info,
        })
    }

    /// Applies a raw action vector (`[battery_kw]` or `[battery_kw, grid_kw]`).
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::MalformedAction`] for other lengths, plus the
    /// errors of [`MicrogridSimulator::step`].
    pub fn step_raw(&mut self, action: &[f64]) -> Result<StepOutcome> {
        let action = Action::from_slice(action)?;
        self.step(&action)
    }

    fn observe(&self) -> Result<Observation> {
        let episode = self.episode.as_ref().ok_or(EmsError::EpisodeNotRunning)?;
        let now = episode.profiles.at(episode.t);
        let next = episode.profiles.at(episode.t + 1);
        Ok(Observation::new([
            now.renewable_kw,
            next.renewable_kw,
            now.load_kw,
            next.load_kw,
            self.battery.soc(),
            self.battery.temperature_c(),
            now.price_import_per_kwh,
            next.price_import_per_kwh,
        ]))
    }

    /// Whether an episode is in progress.
    pub fn is_running(&self) -> bool {
        self.episode.is_some()
    }

    /// Declared battery and grid command ranges.
    pub fn action_bounds(&self) -> ActionBounds {
        ActionBounds {
            battery_min_kw: -self.config.battery.max_charge_kw,
            battery_max_kw: self.config.battery.max_discharge_kw,
            grid_min_kw: -self.config.grid.max_export_kw,
            grid_max_kw: self.config.grid.max_import_kw,
        }
    }

    pub fn dt_hours(&self) -> f64 {
        self.config.environment.time_step_hours
    }

    pub fn horizon(&self) -> usize {
        self.config.environment.horizon
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &MicrogridConfig {
        &self.config
    }
}
