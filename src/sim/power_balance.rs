//! Site power balance computation.

/// Site balance for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balance {
    /// `renewable + battery + grid - load` (kW).
    pub net_kw: f64,
    /// Deficit energy (kWh).
    pub unmet_load_kwh: f64,
    /// Surplus energy (kWh).
    pub curtailed_kwh: f64,
}

/// Computes net site balance.
///
/// Positive net means oversupply, negative means deficit.
///
/// # Arguments
///
/// * `renewable_kw` - Renewable generation (positive)
/// * `battery_kw` - Battery power (positive=discharge, negative=charge)
/// * `grid_kw` - Grid exchange (positive=import, negative=export)
/// * `load_kw` - Site demand (positive)
/// * `dt_hours` - Step duration
pub fn site_balance(
    renewable_kw: f64,
    battery_kw: f64,
    grid_kw: f64,
    load_kw: f64,
    dt_hours: f64,
) -> Balance {
    let net_kw = renewable_kw + battery_kw + grid_kw - load_kw;
    Balance {
        net_kw,
        unmet_load_kwh: (-net_kw).max(0.0) * dt_hours,
        curtailed_kwh: net_kw.max(0.0) * dt_hours,
    }
}

/// Grid command that covers the residual after renewables and battery,
/// limited to `[-max_export_kw, max_import_kw]`.
pub fn balancing_grid_kw(
    load_kw: f64,
    renewable_kw: f64,
    battery_kw: f64,
    max_import_kw: f64,
    max_export_kw: f64,
) -> f64 {
    (load_kw - renewable_kw - battery_kw).clamp(-max_export_kw, max_import_kw)
}
