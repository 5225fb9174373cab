//! Integration tests for scenario files and CSV-backed profiles.

mod common;

use std::path::{Path, PathBuf};

use common::scratch_dir;
use microgrid_ems::EmsError;
use microgrid_ems::config::MicrogridConfig;
use microgrid_ems::evaluation::evaluate;
use microgrid_ems::policy::RuleBasedPolicy;
use microgrid_ems::sim::{Action, MicrogridSimulator};

#[test]
fn default_scenario_file_matches_builtin_defaults() {
    let cfg = MicrogridConfig::from_toml_file(Path::new("scenarios/default.toml")).unwrap();
    assert_eq!(cfg, MicrogridConfig::default());
}

#[test]
fn tight_grid_scenario_file_matches_preset() {
    let cfg = MicrogridConfig::from_toml_file(Path::new("scenarios/tight_grid.toml")).unwrap();
    let mut preset = MicrogridConfig::tight_grid();
    preset.environment.seed = 7;
    assert_eq!(cfg, preset);
}

#[test]
fn csv_scenario_replays_recorded_day() {
    let cfg = MicrogridConfig::from_toml_file(Path::new("scenarios/csv_profiles.toml")).unwrap();
    let mut sim = MicrogridSimulator::from_config(cfg).unwrap();
    assert_eq!(sim.dt_hours(), 1.0, "sample rows are hourly");

    let (obs, _) = sim.reset(Some(1), None).unwrap();
    let (again, _) = sim.reset(Some(999), None).unwrap();
    assert_eq!(obs, again, "CSV profiles must not depend on the seed");
    assert_eq!(obs.load_now(), 70.0);
    assert_eq!(obs.price_now(), 0.08);

    // an idle battery at midnight imports the whole hour of load
    let out = sim.step(&Action::battery_only(0.0)).unwrap();
    assert!((out.info.grid_kw - 70.0).abs() < 1e-9);
    assert!((out.info.cost_grid - 70.0 * 0.08).abs() < 1e-9);

    let mut policy = RuleBasedPolicy::new(sim.config());
    let summary = evaluate(&mut sim, &mut policy, 2, 0, true).unwrap();
    assert_eq!(summary.details[0].steps, 48);
    // seed-independent profiles make every episode identical
    assert_eq!(
        summary.details[0].total_reward,
        summary.details[1].total_reward
    );
}

#[test]
fn csv_without_export_column_uses_sell_factor() {
    let dir = scratch_dir("csv-derived");
    let path = dir.join("profiles.csv");
    std::fs::write(
        &path,
        "renewable_kw,load_kw,price_import_per_kwh\n0.0,50.0,0.20\n10.0,60.0,0.10\n",
    )
    .unwrap();

    let mut cfg = MicrogridConfig::default();
    cfg.environment.horizon = 4;
    cfg.environment.profile_csv = Some(path);
    cfg.grid.sell_price_factor = 0.5;
    let mut sim = MicrogridSimulator::from_config(cfg).unwrap();
    sim.reset(None, None).unwrap();

    let out = sim.step_raw(&[0.0, 0.0]).unwrap();
    assert!((out.info.load_kw - 50.0).abs() < 1e-12);
    // Next observation sees the second row.
    assert!((out.observation.load_now() - 60.0).abs() < 1e-12);
    assert!((out.observation.price_now() - 0.10).abs() < 1e-12);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn missing_csv_is_resource_error() {
    let mut cfg = MicrogridConfig::default();
    cfg.environment.profile_csv = Some(PathBuf::from("does/not/exist.csv"));
    assert!(matches!(
        MicrogridSimulator::from_config(cfg),
        Err(EmsError::Resource { .. })
    ));
}

#[test]
fn csv_missing_required_column_rejected() {
    let dir = scratch_dir("csv-bad");
    let path = dir.join("bad.csv");
    std::fs::write(&path, "renewable_kw,price_import_per_kwh\n1.0,0.1\n").unwrap();

    let mut cfg = MicrogridConfig::default();
    cfg.environment.profile_csv = Some(path);
    assert!(matches!(
        MicrogridSimulator::from_config(cfg),
        Err(EmsError::MalformedInput(_))
    ));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn invalid_scenario_reports_every_field() {
    let toml = r#"
[environment]
horizon = 0

[battery]
soc_min = 0.9
soc_max = 0.1
"#;
    let cfg = MicrogridConfig::from_toml_str(toml).unwrap();
    let err = cfg.ensure_valid().unwrap_err();
    let EmsError::Config(errors) = err else {
        panic!("expected config error, got {err:?}");
    };
    assert!(errors.len() >= 2, "got {errors:?}");
}
