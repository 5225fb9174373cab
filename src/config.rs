//! TOML-based microgrid configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EmsError, Result};

/// Top-level microgrid configuration parsed from TOML.
///
/// Every section has defaults matching the reference 150 kWh site. Load from
/// TOML with [`MicrogridConfig::from_toml_file`] or start from
/// [`MicrogridConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MicrogridConfig {
    /// Episode timing and profile source.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Grid connection limits and tariff.
    #[serde(default)]
    pub grid: GridConfig,
    /// Reward penalty weights.
    #[serde(default)]
    pub reward: RewardConfig,
    /// Rule-based dispatcher thresholds.
    #[serde(default)]
    pub policy: RuleBasedConfig,
}

/// Episode timing and profile source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Number of steps per episode (must be > 0).
    pub horizon: usize,
    /// Duration of one step in hours (must be > 0).
    pub time_step_hours: f64,
    /// Seed used when `reset` is called without one.
    pub seed: u64,
    /// CSV profile file; synthetic profiles are generated when absent.
    pub profile_csv: Option<PathBuf>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            horizon: 96,
            time_step_hours: 0.25,
            seed: 42,
            profile_csv: None,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Total energy capacity (kWh).
    pub capacity_kwh: f64,
    /// State of charge at reset (0.0–1.0), clamped into `[soc_min, soc_max]`.
    pub soc_init: f64,
    /// Lowest usable state of charge.
    pub soc_min: f64,
    /// Highest usable state of charge.
    pub soc_max: f64,
    /// Maximum charging power (kW).
    pub max_charge_kw: f64,
    /// Maximum discharging power (kW).
    pub max_discharge_kw: f64,
    /// Charge efficiency in (0.0, 1.0].
    pub charge_efficiency: f64,
    /// Discharge efficiency in (0.0, 1.0].
    pub discharge_efficiency: f64,
    /// Cell temperature at reset (°C).
    pub temperature_c: f64,
    /// Wear cost per kWh of throughput.
    pub degradation_cost_per_kwh: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 150.0,
            soc_init: 0.5,
            soc_min: 0.1,
            soc_max: 0.9,
            max_charge_kw: 75.0,
            max_discharge_kw: 75.0,
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
            temperature_c: 30.0,
            degradation_cost_per_kwh: 0.02,
        }
    }
}

/// Grid connection limits and tariff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Maximum import power (kW).
    pub max_import_kw: f64,
    /// Maximum export power (kW, positive magnitude).
    pub max_export_kw: f64,
    /// Export price as a fraction of import price when no export series is given.
    pub sell_price_factor: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_import_kw: 250.0,
            max_export_kw: 150.0,
            sell_price_factor: 0.8,
        }
    }
}

/// Reward penalty weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardConfig {
    /// Penalty per kWh of load left unserved.
    pub unmet_load_penalty_per_kwh: f64,
    /// Penalty per kWh of surplus that could not be absorbed.
    pub export_curtail_penalty_per_kwh: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            unmet_load_penalty_per_kwh: 15.0,
            export_curtail_penalty_per_kwh: 0.1,
        }
    }
}

/// Rule-based dispatcher thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleBasedConfig {
    /// Import price at or below which opportunistic charging starts.
    pub low_price_threshold: f64,
    /// Import price at or above which the battery covers deficits.
    pub high_price_threshold: f64,
    /// SoC kept in reserve during high-price discharge.
    pub reserve_soc: f64,
    /// SoC at which opportunistic charging stops.
    pub target_soc: f64,
    /// SoC above which half of any deficit is discharged regardless of price.
    pub high_soc_discharge_bias: f64,
    /// Fraction of `max_charge_kw` used for opportunistic charging.
    pub low_price_charge_fraction: f64,
}

impl Default for RuleBasedConfig {
    fn default() -> Self {
        Self {
            low_price_threshold: 0.11,
            high_price_threshold: 0.16,
            reserve_soc: 0.20,
            target_soc: 0.70,
            high_soc_discharge_bias: 0.75,
            low_price_charge_fraction: 0.5,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.soc_min"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl MicrogridConfig {
    /// Returns a site sized to soak up renewable surplus.
    ///
    /// Larger battery, a wider export allowance, and a stiffer curtailment
    /// penalty make surplus handling the dominant cost driver.
    pub fn high_renewable() -> Self {
        Self {
            battery: BatteryConfig {
                capacity_kwh: 200.0,
                soc_init: 0.3,
                max_charge_kw: 100.0,
                max_discharge_kw: 100.0,
                ..BatteryConfig::default()
            },
            grid: GridConfig {
                max_export_kw: 200.0,
                sell_price_factor: 0.6,
                ..GridConfig::default()
            },
            reward: RewardConfig {
                export_curtail_penalty_per_kwh: 0.25,
                ..RewardConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns a weak-grid site where import limits bind during the evening peak.
    pub fn tight_grid() -> Self {
        Self {
            battery: BatteryConfig {
                capacity_kwh: 100.0,
                max_charge_kw: 50.0,
                max_discharge_kw: 50.0,
                charge_efficiency: 0.92,
                discharge_efficiency: 0.92,
                ..BatteryConfig::default()
            },
            grid: GridConfig {
                max_import_kw: 90.0,
                max_export_kw: 40.0,
                ..GridConfig::default()
            },
            reward: RewardConfig {
                unmet_load_penalty_per_kwh: 25.0,
                ..RewardConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &'static [&'static str] = &["default", "high_renewable", "tight_grid"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Config`] if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self> {
        match name {
            "default" => Ok(Self::default()),
            "high_renewable" => Ok(Self::high_renewable()),
            "tight_grid" => Ok(Self::tight_grid()),
            _ => Err(EmsError::config(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Resource`] if the file cannot be read and
    /// [`EmsError::Config`] if the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| EmsError::resource(path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Config`] if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| EmsError::config("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError {
                    field: field.into(),
                    message: message.into(),
                });
            }
        };

        let env = &self.environment;
        check(env.horizon > 0, "environment.horizon", "must be > 0");
        check(
            env.time_step_hours.is_finite() && env.time_step_hours > 0.0,
            "environment.time_step_hours",
            "must be > 0",
        );

        let b = &self.battery;
        check(b.capacity_kwh > 0.0, "battery.capacity_kwh", "must be > 0");
        check(
            (0.0..=1.0).contains(&b.soc_init),
            "battery.soc_init",
            "must be in [0.0, 1.0]",
        );
        check(
            (0.0..=1.0).contains(&b.soc_min),
            "battery.soc_min",
            "must be in [0.0, 1.0]",
        );
        check(
            (0.0..=1.0).contains(&b.soc_max),
            "battery.soc_max",
            "must be in [0.0, 1.0]",
        );
        check(b.soc_min < b.soc_max, "battery.soc_min", "must be < battery.soc_max");
        check(b.max_charge_kw >= 0.0, "battery.max_charge_kw", "must be >= 0");
        check(b.max_discharge_kw >= 0.0, "battery.max_discharge_kw", "must be >= 0");
        check(
            b.charge_efficiency > 0.0 && b.charge_efficiency <= 1.0,
            "battery.charge_efficiency",
            "must be in (0.0, 1.0]",
        );
        check(
            b.discharge_efficiency > 0.0 && b.discharge_efficiency <= 1.0,
            "battery.discharge_efficiency",
            "must be in (0.0, 1.0]",
        );
        check(
            b.temperature_c.is_finite(),
            "battery.temperature_c",
            "must be finite",
        );
        check(
            b.degradation_cost_per_kwh >= 0.0,
            "battery.degradation_cost_per_kwh",
            "must be >= 0",
        );

        let g = &self.grid;
        check(g.max_import_kw >= 0.0, "grid.max_import_kw", "must be >= 0");
        check(g.max_export_kw >= 0.0, "grid.max_export_kw", "must be >= 0");
        check(g.sell_price_factor >= 0.0, "grid.sell_price_factor", "must be >= 0");

        let r = &self.reward;
        check(
            r.unmet_load_penalty_per_kwh >= 0.0,
            "reward.unmet_load_penalty_per_kwh",
            "must be >= 0",
        );
        check(
            r.export_curtail_penalty_per_kwh >= 0.0,
            "reward.export_curtail_penalty_per_kwh",
            "must be >= 0",
        );

        let p = &self.policy;
        check(
            p.low_price_threshold <= p.high_price_threshold,
            "policy.low_price_threshold",
            "must be <= policy.high_price_threshold",
        );
        check(
            (0.0..=1.0).contains(&p.low_price_charge_fraction),
            "policy.low_price_charge_fraction",
            "must be in [0.0, 1.0]",
        );

        errors
    }

    /// Validates and converts the collected errors into a single [`EmsError`].
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Config`] carrying every violation found.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EmsError::Config(errors))
        }
    }
}
