use super::Policy;
use crate::config::{BatteryConfig, MicrogridConfig, RuleBasedConfig};
use crate::error::Result;
use crate::sim::{Action, Observation};

/// Heuristic baseline for cost-aware dispatch.
///
/// Absorbs renewable surplus first, discharges into deficits during high
/// tariffs (or when the battery is nearly full), and tops up during cheap
/// periods. Emits battery-only actions; the simulator balances the grid.
#[derive(Debug, Clone)]
pub struct RuleBasedPolicy {
    battery: BatteryConfig,
    max_import_kw: f64,
    rules: RuleBasedConfig,
}

impl RuleBasedPolicy {
    pub fn new(config: &MicrogridConfig) -> Self {
        Self {
            battery: config.battery.clone(),
            max_import_kw: config.grid.max_import_kw,
            rules: config.policy.clone(),
        }
    }

    /// Battery command (kW, positive=discharge) for the current step.
    ///
    /// Only `renewable_now`, `load_now`, `soc`, and `price_now` are used.
    pub fn battery_setpoint_kw(&self, observation: &Observation) -> f64 {
        let b = &self.battery;
        let p = &self.rules;
        let soc = observation.soc();
        let price = observation.price_now();

        let surplus = (observation.renewable_now() - observation.load_now()).max(0.0);
        let deficit = (observation.load_now() - observation.renewable_now()).max(0.0);

        if surplus > 0.0 && soc < b.soc_max - 0.01 {
            -b.max_charge_kw.min(surplus)
        } else if deficit > 0.0 {
            let reserve_floor = (b.soc_min + 0.01).max(p.reserve_soc);
            if soc > reserve_floor && price >= p.high_price_threshold {
                b.max_discharge_kw.min(deficit)
            } else if soc > p.high_soc_discharge_bias {
                b.max_discharge_kw.min(0.5 * deficit)
            } else {
                0.0
            }
        } else if price <= p.low_price_threshold && soc < p.target_soc.min(b.soc_max - 0.01) {
            // cheap-period charging is bounded by what the grid can import
            -(b.max_charge_kw * p.low_price_charge_fraction).min(self.max_import_kw)
        } else {
            0.0
        }
    }
}

impl Policy for RuleBasedPolicy {
    fn name(&self) -> &str {
        "baseline"
    }

    fn act(&mut self, observation: &Observation) -> Result<Action> {
        Ok(Action::battery_only(self.battery_setpoint_kw(observation)))
    }
}
