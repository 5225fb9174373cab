//! Cost-based reward.

use crate::config::{BatteryConfig, RewardConfig};

/// Share of the unmet-load penalty charged per kWh of clipped battery energy.
pub const CLIPPED_PENALTY_SHARE: f64 = 0.25;

/// Cost components of one step. All values are in currency units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    /// Import cost minus export revenue.
    pub grid: f64,
    pub degradation: f64,
    pub penalty: f64,
}

impl CostBreakdown {
    /// Negated total cost.
    pub fn reward(&self) -> f64 {
        -(self.grid + self.degradation + self.penalty)
    }
}

/// Physical quantities a step's cost depends on.
#[derive(Debug, Clone, Copy)]
pub struct CostInputs {
    pub grid_kw: f64,
    pub battery_kw: f64,
    pub price_import_per_kwh: f64,
    pub price_export_per_kwh: f64,
    pub unmet_load_kwh: f64,
    pub curtailed_kwh: f64,
    pub clipped_energy_kwh: f64,
    pub dt_hours: f64,
}

/// Prices one step.
pub fn step_costs(
    inputs: &CostInputs,
    battery: &BatteryConfig,
    reward: &RewardConfig,
) -> CostBreakdown {
    let dt = inputs.dt_hours;
    let import_cost = inputs.grid_kw.max(0.0) * inputs.price_import_per_kwh * dt;
    let export_revenue = (-inputs.grid_kw).max(0.0) * inputs.price_export_per_kwh * dt;

    CostBreakdown {
        grid: import_cost - export_revenue,
        degradation: inputs.battery_kw.abs() * dt * battery.degradation_cost_per_kwh,
        penalty: inputs.unmet_load_kwh * reward.unmet_load_penalty_per_kwh
            + inputs.curtailed_kwh * reward.export_curtail_penalty_per_kwh
            + inputs.clipped_energy_kwh * reward.unmet_load_penalty_per_kwh * CLIPPED_PENALTY_SHARE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> CostInputs {
        CostInputs {
            grid_kw: 0.0,
            battery_kw: 0.0,
            price_import_per_kwh: 0.2,
            price_export_per_kwh: 0.1,
            unmet_load_kwh: 0.0,
            curtailed_kwh: 0.0,
            clipped_energy_kwh: 0.0,
            dt_hours: 0.5,
        }
    }

    #[test]
    fn import_is_charged() {
        let c = step_costs(
            &CostInputs {
                grid_kw: 100.0,
                ..inputs()
            },
            &BatteryConfig::default(),
            &RewardConfig::default(),
        );
        assert!((c.grid - 10.0).abs() < 1e-12);
        assert!((c.reward() + 10.0).abs() < 1e-12);
    }

    #[test]
    fn export_earns_revenue() {
        let c = step_costs(
            &CostInputs {
                grid_kw: -40.0,
                ..inputs()
            },
            &BatteryConfig::default(),
            &RewardConfig::default(),
        );
        assert!((c.grid + 2.0).abs() < 1e-12);
        assert!(c.reward() > 0.0);
    }

    #[test]
    fn penalties_accumulate() {
        let c = step_costs(
            &CostInputs {
                battery_kw: -10.0,
                unmet_load_kwh: 1.0,
                curtailed_kwh: 2.0,
                clipped_energy_kwh: 4.0,
                ..inputs()
            },
            &BatteryConfig::default(),
            &RewardConfig::default(),
        );
        // 15 + 0.2 + 4 * 15 * 0.25
        assert!((c.penalty - 30.2).abs() < 1e-9);
        assert!((c.degradation - 0.1).abs() < 1e-12);
    }
}
