//! Core simulation types: observations, actions, and per-step telemetry.

use std::fmt;

use serde::Serialize;

use crate::error::{EmsError, Result};

/// Number of features in an [`Observation`].
pub const OBS_DIM: usize = 8;

/// Index of the state-of-charge feature.
pub const OBS_SOC: usize = 4;
/// Index of the battery temperature feature.
pub const OBS_TEMPERATURE: usize = 5;

/// Policy input for one step.
///
/// Layout: `[renewable_now, renewable_next, load_now, load_next, soc,
/// temperature_c, price_now, price_next]`. The `*_next` fields are exact
/// one-step lookahead values, repeated from the last step at episode end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation([f64; OBS_DIM]);

impl Observation {
    pub fn new(values: [f64; OBS_DIM]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn renewable_now(&self) -> f64 {
        self.0[0]
    }

    pub fn renewable_next(&self) -> f64 {
        self.0[1]
    }

    pub fn load_now(&self) -> f64 {
        self.0[2]
    }

    pub fn load_next(&self) -> f64 {
        self.0[3]
    }

    pub fn soc(&self) -> f64 {
        self.0[OBS_SOC]
    }

    pub fn temperature_c(&self) -> f64 {
        self.0[OBS_TEMPERATURE]
    }

    pub fn price_now(&self) -> f64 {
        self.0[6]
    }

    pub fn price_next(&self) -> f64 {
        self.0[7]
    }
}

/// Dispatch command for one step.
///
/// Battery power is positive for discharge and negative for charge. Grid
/// power, when given, is positive for import and negative for export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// `[battery_kw]`; the grid absorbs the residual up to its limits.
    BatteryOnly { battery_kw: f64 },
    /// Legacy `[battery_kw, grid_kw]` with an explicit grid command.
    BatteryGrid { battery_kw: f64, grid_kw: f64 },
}

impl Action {
    pub fn battery_only(battery_kw: f64) -> Self {
        Self::BatteryOnly { battery_kw }
    }

    pub fn battery_grid(battery_kw: f64, grid_kw: f64) -> Self {
        Self::BatteryGrid {
            battery_kw,
            grid_kw,
        }
    }

    /// Resolves a raw action vector into its tagged form.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::MalformedAction`] unless the slice has 1 or 2 values.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match *values {
            [battery_kw] => Ok(Self::battery_only(battery_kw)),
            [battery_kw, grid_kw] => Ok(Self::battery_grid(battery_kw, grid_kw)),
            _ => Err(EmsError::MalformedAction(values.len())),
        }
    }

    pub fn battery_kw(&self) -> f64 {
        match *self {
            Self::BatteryOnly { battery_kw } | Self::BatteryGrid { battery_kw, .. } => battery_kw,
        }
    }

    /// Explicit grid command, `None` for battery-only actions.
    pub fn grid_kw(&self) -> Option<f64> {
        match *self {
            Self::BatteryOnly { .. } => None,
            Self::BatteryGrid { grid_kw, .. } => Some(grid_kw),
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        match *self {
            Self::BatteryOnly { battery_kw } => vec![battery_kw],
            Self::BatteryGrid {
                battery_kw,
                grid_kw,
            } => vec![battery_kw, grid_kw],
        }
    }
}

/// Declared action space of a simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionBounds {
    /// Most negative battery command (`-max_charge_kw`).
    pub battery_min_kw: f64,
    /// Most positive battery command (`max_discharge_kw`).
    pub battery_max_kw: f64,
    /// Most negative grid command (`-max_export_kw`).
    pub grid_min_kw: f64,
    /// Most positive grid command (`max_import_kw`).
    pub grid_max_kw: f64,
}

/// Information returned by `reset`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetInfo {
    /// Seed used to build this episode's profiles.
    pub seed: u64,
    /// Starting state of charge after clamping.
    pub soc: f64,
    /// Starting battery temperature.
    pub temperature_c: f64,
}

/// Complete record of one simulation step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    /// Step index the action applied to.
    pub timestep: usize,
    /// Renewable generation at this step (kW).
    pub renewable_kw: f64,
    /// Site load at this step (kW).
    pub load_kw: f64,
    /// Realized battery power (kW; positive=discharge, negative=charge).
    pub battery_kw: f64,
    /// Grid exchange (kW; positive=import, negative=export).
    pub grid_kw: f64,
    /// State of charge after the step.
    pub soc: f64,
    /// Battery temperature after the step.
    pub temperature_c: f64,
    /// `renewable + battery + grid - load` (kW).
    pub net_balance_kw: f64,
    /// Load left unserved (kWh).
    pub unmet_load_kwh: f64,
    /// Surplus that could not be absorbed (kWh).
    pub curtailed_kwh: f64,
    /// Energy of the battery command rejected by physical limits (kWh).
    pub clipped_energy_kwh: f64,
    /// Import cost minus export revenue.
    pub cost_grid: f64,
    /// Battery wear cost.
    pub cost_degradation: f64,
    /// Unmet, curtailment, and clipping penalties.
    pub cost_penalty: f64,
    /// Negated sum of all costs.
    pub reward: f64,
}

impl fmt::Display for StepInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} | soc={:.3} batt={:>7.1} kW grid={:>7.1} kW | load={:>6.1} kW \
             ren={:>6.1} kW | unmet={:.2} kWh curt={:.2} kWh | reward={:>8.3}",
            self.timestep,
            self.soc,
            self.battery_kw,
            self.grid_kw,
            self.load_kw,
            self.renewable_kw,
            self.unmet_load_kwh,
            self.curtailed_kwh,
            self.reward,
        )
    }
}

/// Result of [`crate::sim::MicrogridSimulator::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Observation for the next step.
    pub observation: Observation,
    pub reward: f64,
    /// Horizon reached; call `reset` before stepping again.
    pub terminated: bool,
    /// Reserved for external time-limit wrappers; always `false`.
    pub truncated: bool,
    pub info: StepInfo,
}
