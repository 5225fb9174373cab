//! Report and telemetry writers.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::sim::StepInfo;

/// Column header for per-step telemetry CSV.
const HEADER: &str = "timestep,renewable_kw,load_kw,battery_kw,grid_kw,soc,temperature_c,\
                       net_balance_kw,unmet_load_kwh,curtailed_kwh,clipped_energy_kwh,\
                       cost_grid,cost_degradation,cost_penalty,reward";

/// Exports per-step telemetry to a CSV file, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_telemetry_csv(steps: &[StepInfo], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    write_telemetry_csv(steps, io::BufWriter::new(file))
}

/// Writes per-step telemetry as CSV to any writer.
///
/// One header row, then one row per step. Output is deterministic for
/// identical inputs.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_telemetry_csv(steps: &[StepInfo], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for s in steps {
        wtr.write_record(&[
            s.timestep.to_string(),
            format!("{:.4}", s.renewable_kw),
            format!("{:.4}", s.load_kw),
            format!("{:.4}", s.battery_kw),
            format!("{:.4}", s.grid_kw),
            format!("{:.6}", s.soc),
            format!("{:.4}", s.temperature_c),
            format!("{:.4}", s.net_balance_kw),
            format!("{:.6}", s.unmet_load_kwh),
            format!("{:.6}", s.curtailed_kwh),
            format!("{:.6}", s.clipped_energy_kwh),
            format!("{:.6}", s.cost_grid),
            format!("{:.6}", s.cost_degradation),
            format!("{:.6}", s.cost_penalty),
            format!("{:.6}", s.reward),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes `value` as pretty-printed JSON, creating parent directories.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut buf = io::BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut buf, value)?;
    buf.write_all(b"\n")?;
    buf.flush()?;
    Ok(())
}

/// Writes `text` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_text(text: &str, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, text)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_step(t: usize) -> StepInfo {
        StepInfo {
            timestep: t,
            renewable_kw: 40.0,
            load_kw: 100.0,
            battery_kw: 20.0,
            grid_kw: 40.0,
            soc: 0.48,
            temperature_c: 30.18,
            net_balance_kw: 0.0,
            unmet_load_kwh: 0.0,
            curtailed_kwh: 0.0,
            clipped_energy_kwh: 0.0,
            cost_grid: 2.0,
            cost_degradation: 0.1,
            cost_penalty: 0.0,
            reward: -2.1,
        }
    }

    #[test]
    fn header_lists_every_field() {
        let mut buf = Vec::new();
        write_telemetry_csv(&[make_step(0)], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let first_line = output.lines().next().unwrap_or("");
        assert_eq!(first_line.split(',').count(), 15);
        assert!(first_line.starts_with("timestep,renewable_kw,load_kw"));
        assert!(first_line.ends_with("cost_penalty,reward"));
    }

    #[test]
    fn row_count_matches_step_count() {
        let steps: Vec<StepInfo> = (0..24).map(make_step).collect();
        let mut buf = Vec::new();
        write_telemetry_csv(&steps, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        // 1 header + 24 data rows
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn rows_parse_back_as_numbers() {
        let steps: Vec<StepInfo> = (0..3).map(make_step).collect();
        let mut buf = Vec::new();
        write_telemetry_csv(&steps, &mut buf).unwrap();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let mut rows = 0;
        for record in rdr.records() {
            let rec = record.unwrap();
            for field in rec.iter() {
                assert!(field.parse::<f64>().is_ok(), "{field} should parse as f64");
            }
            rows += 1;
        }
        assert_eq!(rows, 3);
    }

    #[test]
    fn json_and_text_create_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("microgrid-ems-export-{}", std::process::id()));
        let json_path = dir.join("nested/report.json");
        write_json(&make_step(1), &json_path).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed["timestep"], 1);

        let md_path = dir.join("nested/report.md");
        write_text("# title\n", &md_path).unwrap();
        assert_eq!(fs::read_to_string(&md_path).unwrap(), "# title\n");

        fs::remove_dir_all(&dir).ok();
    }
}
