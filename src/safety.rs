//! Deterministic safety layer between policies and the simulator.
//!
//! The supervisor clips commands to equipment ratings and blocks battery
//! operation near the SoC window edges or at high temperature.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::config::{BatteryConfig, GridConfig, MicrogridConfig};
use crate::error::{EmsError, Result};
use crate::sim::Action;
use crate::sim::types::{OBS_SOC, OBS_TEMPERATURE};

/// Margin from the SoC limits inside which the battery is blocked.
pub const SOC_GUARD_MARGIN: f64 = 0.01;
/// Battery temperature (°C) at or above which all battery power is blocked.
pub const HIGH_TEMPERATURE_C: f64 = 48.0;
/// Component difference above which an action counts as overridden.
const OVERRIDE_TOLERANCE: f64 = 1e-6;
/// Observations must reach at least the temperature feature.
const MIN_OBSERVATION_LEN: usize = OBS_TEMPERATURE + 1;

/// Why the supervisor zeroed the battery command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideReason {
    BlockedDischargeLowSoc,
    BlockedChargeHighSoc,
    BlockedBatteryHighTemp,
}

impl OverrideReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockedDischargeLowSoc => "blocked_discharge_low_soc",
            Self::BlockedChargeHighSoc => "blocked_charge_high_soc",
            Self::BlockedBatteryHighTemp => "blocked_battery_high_temp",
        }
    }
}

impl fmt::Display for OverrideReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sanitized action plus what the supervisor changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyDecision {
    pub action: Action,
    /// Whether any component moved by more than 1e-6 from the proposal.
    pub overridden: bool,
    pub reasons: Vec<OverrideReason>,
}

impl SafetyDecision {
    /// Comma-joined reason codes, or `"none"`.
    pub fn reason(&self) -> String {
        if self.reasons.is_empty() {
            return "none".to_string();
        }
        self.reasons
            .iter()
            .map(OverrideReason::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Hard safety layer applied to every proposed action.
#[derive(Debug, Clone)]
pub struct SafetySupervisor {
    battery: BatteryConfig,
    grid: GridConfig,
}

impl SafetySupervisor {
    pub fn new(config: &MicrogridConfig) -> Self {
        Self {
            battery: config.battery.clone(),
            grid: config.grid.clone(),
        }
    }

    /// Sanitizes `action` given the current observation.
    ///
    /// Steps, in order: clip the battery to its power ratings and the grid
    /// (when present) to its limits; block discharge at low SoC; block charge
    /// at high SoC; block any battery power at high temperature.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::MalformedObservation`] if `observation` has fewer
    /// than 6 elements.
    pub fn apply(&self, action: &Action, observation: &[f64]) -> Result<SafetyDecision> {
        if observation.len() < MIN_OBSERVATION_LEN {
            return Err(EmsError::MalformedObservation {
                expected: MIN_OBSERVATION_LEN,
                actual: observation.len(),
            });
        }
        let soc = observation[OBS_SOC];
        let temperature_c = observation[OBS_TEMPERATURE];
        let b = &self.battery;
        let g = &self.grid;

        let mut battery_kw = action
            .battery_kw()
            .clamp(-b.max_charge_kw, b.max_discharge_kw);
        let grid_kw = action
            .grid_kw()
            .map(|kw| kw.clamp(-g.max_export_kw, g.max_import_kw));

        let mut reasons = Vec::new();
        if soc <= b.soc_min + SOC_GUARD_MARGIN && battery_kw > 0.0 {
            battery_kw = 0.0;
            reasons.push(OverrideReason::BlockedDischargeLowSoc);
        }
        if soc >= b.soc_max - SOC_GUARD_MARGIN && battery_kw < 0.0 {
            battery_kw = 0.0;
            reasons.push(OverrideReason::BlockedChargeHighSoc);
        }
        if temperature_c >= HIGH_TEMPERATURE_C && battery_kw != 0.0 {
            battery_kw = 0.0;
            reasons.push(OverrideReason::BlockedBatteryHighTemp);
        }

        let safe = match grid_kw {
            Some(grid_kw) => Action::battery_grid(battery_kw, grid_kw),
            None => Action::battery_only(battery_kw),
        };
        let overridden = action
            .to_vec()
            .iter()
            .zip(safe.to_vec())
            .any(|(a, s)| (a - s).abs() > OVERRIDE_TOLERANCE);

        let decision = SafetyDecision {
            action: safe,
            overridden,
            reasons,
        };
        if overridden {
            trace!(
                proposed = ?action,
                applied = ?decision.action,
                reason = %decision.reason(),
                "safety override"
            );
        }
        Ok(decision)
    }

    /// Like [`SafetySupervisor::apply`] for a raw action vector.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::MalformedAction`] unless `action` has 1 or 2
    /// values, plus the errors of `apply`.
    pub fn apply_raw(&self, action: &[f64], observation: &[f64]) -> Result<SafetyDecision> {
        let action = Action::from_slice(action)?;
        self.apply(&action, observation)
    }
}
