use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::{ProfileProvider, Profiles, tile_to_horizon};
use crate::error::{EmsError, Result};

const REQUIRED_COLUMNS: [&str; 3] = ["renewable_kw", "load_kw", "price_import_per_kwh"];

#[derive(Debug, Deserialize)]
struct ProfileRow {
    renewable_kw: f64,
    load_kw: f64,
    price_import_per_kwh: f64,
    #[serde(default)]
    price_export_per_kwh: Option<f64>,
}

/// Profiles read once from a CSV file and tiled to each episode horizon.
///
/// Extra columns (timestamps, annotations) are ignored. When the
/// `price_export_per_kwh` column or a cell in it is missing, the export price
/// is derived as `price_import_per_kwh * sell_price_factor`.
#[derive(Debug, Clone)]
pub struct CsvProfiles {
    source: String,
    renewable_kw: Vec<f64>,
    load_kw: Vec<f64>,
    price_import_per_kwh: Vec<f64>,
    price_export_per_kwh: Vec<f64>,
}

impl CsvProfiles {
    /// Reads profiles from the CSV file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Resource`] if the file does not exist or cannot be
    /// opened, and the errors of [`CsvProfiles::from_reader`] otherwise.
    pub fn from_path(path: &Path, sell_price_factor: f64) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| EmsError::resource(path.display().to_string(), e.to_string()))?;
        let mut profiles = Self::from_reader(file, sell_price_factor)?;
        profiles.source = path.display().to_string();
        Ok(profiles)
    }

    /// Reads profiles from any CSV source with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::MalformedInput`] if a required column is missing
    /// or the file has no data rows, and [`EmsError::Csv`] on parse failures.
    pub fn from_reader(reader: impl Read, sell_price_factor: f64) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = rdr.headers()?.clone();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(EmsError::MalformedInput(format!(
                "CSV missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut renewable_kw = Vec::new();
        let mut load_kw = Vec::new();
        let mut price_import_per_kwh = Vec::new();
        let mut price_export_per_kwh = Vec::new();
        for row in rdr.deserialize::<ProfileRow>() {
            let row = row?;
            renewable_kw.push(row.renewable_kw);
            load_kw.push(row.load_kw);
            price_import_per_kwh.push(row.price_import_per_kwh);
            price_export_per_kwh.push(
                row.price_export_per_kwh
                    .unwrap_or(row.price_import_per_kwh * sell_price_factor),
            );
        }

        if renewable_kw.is_empty() {
            return Err(EmsError::MalformedInput("CSV has no data rows".into()));
        }

        Ok(Self {
            source: "csv".to_string(),
            renewable_kw,
            load_kw,
            price_import_per_kwh,
            price_export_per_kwh,
        })
    }

    /// Number of rows read from the source.
    pub fn rows(&self) -> usize {
        self.renewable_kw.len()
    }
}

impl ProfileProvider for CsvProfiles {
    fn profiles(&self, horizon: usize, _dt_hours: f64, _seed: u64) -> Result<Profiles> {
        Profiles::new(
            tile_to_horizon(&self.renewable_kw, horizon)?,
            tile_to_horizon(&self.load_kw, horizon)?,
            tile_to_horizon(&self.price_import_per_kwh, horizon)?,
            tile_to_horizon(&self.price_export_per_kwh, horizon)?,
        )
    }

    fn describe(&self) -> String {
        format!("csv:{} ({} rows)", self.source, self.rows())
    }
}
