use crate::config::BatteryConfig;

/// Lower bound of the temperature proxy (°C).
pub const MIN_TEMPERATURE_C: f64 = 15.0;
/// Upper bound of the temperature proxy (°C).
pub const MAX_TEMPERATURE_C: f64 = 60.0;
/// Temperature rise per kW of battery power per step.
const HEATING_PER_KW: f64 = 0.01;
/// Passive cooling per step (°C).
const COOLING_PER_STEP: f64 = 0.02;

/// A battery energy storage system with SoC window and efficiency losses.
///
/// # Power Flow Convention
/// - Positive power: Discharging (supplying the site)
/// - Negative power: Charging (absorbing energy)
#[derive(Debug, Clone)]
pub struct Battery {
    params: BatteryConfig,
    /// State of charge as a fraction, kept within `[soc_min, soc_max]`.
    soc: f64,
    /// Thermal proxy in °C, kept within `[15, 60]`.
    temperature_c: f64,
}

/// Outcome of one battery command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryDispatch {
    /// Realized power (kW, positive=discharge).
    pub actual_kw: f64,
    /// `|cmd - actual| * dt` (kWh).
    pub clipped_energy_kwh: f64,
}

impl Battery {
    /// Creates a battery at the configured initial SoC and temperature.
    pub fn new(params: &BatteryConfig) -> Self {
        let mut battery = Self {
            params: params.clone(),
            soc: params.soc_init,
            temperature_c: params.temperature_c,
        };
        battery.reset(None);
        battery
    }

    /// Restores initial conditions, clamping `soc_override` (or `soc_init`)
    /// into the SoC window.
    pub fn reset(&mut self, soc_override: Option<f64>) {
        let start = soc_override.unwrap_or(self.params.soc_init);
        self.soc = start.clamp(self.params.soc_min, self.params.soc_max);
        self.temperature_c = self.params.temperature_c;
    }

    pub fn soc(&self) -> f64 {
        self.soc
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Applies a power command for one step of `dt_hours`.
    ///
    /// Discharge is limited by `max_discharge_kw` and by the energy above
    /// `soc_min`; charge by `max_charge_kw` and the room below `soc_max`.
    /// Whatever the limits reject is reported as clipped energy.
    ///
    /// # Arguments
    ///
    /// * `cmd_kw` - Requested power (positive=discharge, negative=charge)
    /// * `dt_hours` - Step duration
    pub fn dispatch(&mut self, cmd_kw: f64, dt_hours: f64) -> BatteryDispatch {
        let b = &self.params;
        let capacity = b.capacity_kwh.max(1e-6);

        let (actual_kw, delta_soc) = if cmd_kw >= 0.0 {
            let energy_available = (self.soc - b.soc_min).max(0.0) * capacity;
            let limit_kw = energy_available * b.discharge_efficiency / dt_hours;
            let actual = cmd_kw.min(b.max_discharge_kw).min(limit_kw);
            (actual, -(actual * dt_hours) / (capacity * b.discharge_efficiency))
        } else {
            let room = (b.soc_max - self.soc).max(0.0) * capacity;
            let limit_kw = room / (dt_hours * b.charge_efficiency);
            let actual = -(cmd_kw.abs().min(b.max_charge_kw).min(limit_kw));
            (actual, (-actual * dt_hours * b.charge_efficiency) / capacity)
        };

        self.soc = (self.soc + delta_soc).clamp(b.soc_min, b.soc_max);

        BatteryDispatch {
            actual_kw,
            clipped_energy_kwh: (cmd_kw - actual_kw).abs() * dt_hours,
        }
    }

    /// Advances the thermal proxy after a step at `battery_kw`.
    pub fn update_temperature(&mut self, battery_kw: f64) {
        self.temperature_c = (self.temperature_c + HEATING_PER_KW * battery_kw.abs()
            - COOLING_PER_STEP)
            .clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BatteryConfig {
        BatteryConfig::default()
    }

    #[test]
    fn test_discharge_power_limit() {
        let mut battery = Battery::new(&params());
        let out = battery.dispatch(100.0, 0.25);
        assert!(out.actual_kw <= 75.0 + 1e-9);
        assert!(battery.soc() < 0.5);
        assert!((out.clipped_energy_kwh - 25.0 * 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_charge_power_limit() {
        let mut battery = Battery::new(&params());
        let out = battery.dispatch(-200.0, 0.25);
        assert!((out.actual_kw + 75.0).abs() < 1e-9);
        assert!(battery.soc() > 0.5);
    }

    #[test]
    fn test_discharge_soc_limit() {
        // 1.5 kWh above soc_min at 100% efficiency and 0.25 h -> 6 kW
        let p = BatteryConfig {
            soc_init: 0.11,
            discharge_efficiency: 1.0,
            ..params()
        };
        let mut battery = Battery::new(&p);
        let out = battery.dispatch(50.0, 0.25);
        assert!((out.actual_kw - 6.0).abs() < 1e-9);
        assert!((battery.soc() - p.soc_min).abs() < 1e-9);
    }

    #[test]
    fn test_charge_soc_limit() {
        let p = BatteryConfig {
            soc_init: 0.9,
            ..params()
        };
        let mut battery = Battery::new(&p);
        let out = battery.dispatch(-30.0, 0.25);
        assert_eq!(out.actual_kw, 0.0);
        assert!((out.clipped_energy_kwh - 7.5).abs() < 1e-9);
        assert!((battery.soc() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_efficiency_loss() {
        let mut battery = Battery::new(&params());
        battery.dispatch(-40.0, 0.25);
        battery.dispatch(40.0, 0.25);
        assert!(battery.soc() < 0.5);
    }

    #[test]
    fn test_reset_clamps_override() {
        let mut battery = Battery::new(&params());
        battery.reset(Some(0.99));
        assert_eq!(battery.soc(), 0.9);
        battery.reset(Some(0.0));
        assert_eq!(battery.soc(), 0.1);
        battery.reset(None);
        assert_eq!(battery.soc(), 0.5);
    }

    #[test]
    fn test_temperature_proxy_bounds() {
        let mut battery = Battery::new(&params());
        battery.update_temperature(75.0);
        assert!((battery.temperature_c() - 30.73).abs() < 1e-9);
        for _ in 0..100 {
            battery.update_temperature(75.0);
        }
        assert_eq!(battery.temperature_c(), MAX_TEMPERATURE_C);

        let cold = BatteryConfig {
            temperature_c: 15.0,
            ..params()
        };
        let mut battery = Battery::new(&cold);
        battery.update_temperature(0.0);
        assert_eq!(battery.temperature_c(), MIN_TEMPERATURE_C);
    }
}
