//! Renewable, load, and tariff time series consumed by the simulator.

/// CSV-backed profile provider.
pub mod csv_file;
/// Seeded synthetic profile generator.
pub mod synthetic;

pub use csv_file::CsvProfiles;
pub use synthetic::SyntheticProfiles;

use tracing::debug;

use crate::config::MicrogridConfig;
use crate::error::{EmsError, Result};

/// Four aligned series covering exactly one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct Profiles {
    /// Renewable generation (kW, >= 0).
    pub renewable_kw: Vec<f64>,
    /// Site load (kW, >= 0).
    pub load_kw: Vec<f64>,
    /// Import tariff per kWh.
    pub price_import_per_kwh: Vec<f64>,
    /// Export tariff per kWh.
    pub price_export_per_kwh: Vec<f64>,
}

impl Profiles {
    /// Builds profiles, rejecting empty or misaligned series.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::MalformedInput`] if any series is empty or the
    /// lengths differ.
    pub fn new(
        renewable_kw: Vec<f64>,
        load_kw: Vec<f64>,
        price_import_per_kwh: Vec<f64>,
        price_export_per_kwh: Vec<f64>,
    ) -> Result<Self> {
        let len = renewable_kw.len();
        if len == 0 {
            return Err(EmsError::MalformedInput(
                "profile series cannot be empty".into(),
            ));
        }
        if load_kw.len() != len
            || price_import_per_kwh.len() != len
            || price_export_per_kwh.len() != len
        {
            return Err(EmsError::MalformedInput(format!(
                "profile series lengths differ: renewable={len}, load={}, import={}, export={}",
                load_kw.len(),
                price_import_per_kwh.len(),
                price_export_per_kwh.len()
            )));
        }
        Ok(Self {
            renewable_kw,
            load_kw,
            price_import_per_kwh,
            price_export_per_kwh,
        })
    }

    /// Number of steps covered.
    pub fn len(&self) -> usize {
        self.renewable_kw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renewable_kw.is_empty()
    }

    /// Returns the values at `index`, clamped to the last valid step.
    pub fn at(&self, index: usize) -> ProfilePoint {
        let i = index.min(self.len().saturating_sub(1));
        ProfilePoint {
            renewable_kw: self.renewable_kw[i],
            load_kw: self.load_kw[i],
            price_import_per_kwh: self.price_import_per_kwh[i],
            price_export_per_kwh: self.price_export_per_kwh[i],
        }
    }
}

/// One step of [`Profiles`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    pub renewable_kw: f64,
    pub load_kw: f64,
    pub price_import_per_kwh: f64,
    pub price_export_per_kwh: f64,
}

/// Source of episode profiles.
///
/// Implementations must be deterministic for a given `(horizon, dt_hours, seed)`.
pub trait ProfileProvider {
    /// Produces profiles of exactly `horizon` steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot produce valid series.
    fn profiles(&self, horizon: usize, dt_hours: f64, seed: u64) -> Result<Profiles>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Builds the provider selected by `environment.profile_csv`.
///
/// # Errors
///
/// Returns [`EmsError::Resource`] if the configured CSV file is missing.
pub fn provider_for(config: &MicrogridConfig) -> Result<Box<dyn ProfileProvider>> {
    let provider: Box<dyn ProfileProvider> = match &config.environment.profile_csv {
        Some(path) => Box::new(CsvProfiles::from_path(path, config.grid.sell_price_factor)?),
        None => Box::new(SyntheticProfiles),
    };
    debug!(source = %provider.describe(), "profile provider selected");
    Ok(provider)
}

/// Repeats or truncates `series` so that it has exactly `horizon` entries.
///
/// # Errors
///
/// Returns [`EmsError::MalformedInput`] if `series` is empty and `horizon > 0`.
pub fn tile_to_horizon(series: &[f64], horizon: usize) -> Result<Vec<f64>> {
    if horizon == 0 {
        return Ok(Vec::new());
    }
    if series.is_empty() {
        return Err(EmsError::MalformedInput(
            "profile series cannot be empty".into(),
        ));
    }
    Ok(series.iter().copied().cycle().take(horizon).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_repeats_short_series() {
        let tiled = tile_to_horizon(&[1.0, 2.0, 3.0], 7).unwrap();
        assert_eq!(tiled, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn tile_truncates_long_series() {
        let tiled = tile_to_horizon(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(tiled, vec![1.0, 2.0]);
    }

    #[test]
    fn tile_copies_when_equal() {
        let series = vec![0.5, 1.0, 1.5];
        assert_eq!(tile_to_horizon(&series, 3).unwrap(), series);
    }

    #[test]
    fn tile_rejects_empty_series() {
        assert!(matches!(
            tile_to_horizon(&[], 4),
            Err(EmsError::MalformedInput(_))
        ));
    }

    #[test]
    fn misaligned_profiles_rejected() {
        let err = Profiles::new(vec![1.0, 2.0], vec![1.0], vec![0.1, 0.1], vec![0.1, 0.1]);
        assert!(err.is_err());
    }

    #[test]
    fn lookup_clamps_to_last_index() {
        let p = Profiles::new(
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![0.1, 0.2],
            vec![0.05, 0.1],
        )
        .unwrap();
        assert_eq!(p.at(5), p.at(1));
        assert_eq!(p.at(5).load_kw, 4.0);
    }
}
