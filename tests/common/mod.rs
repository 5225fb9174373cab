//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use microgrid_ems::config::MicrogridConfig;
use microgrid_ems::profiles::{ProfileProvider, Profiles, SyntheticProfiles};
use microgrid_ems::sim::MicrogridSimulator;
use microgrid_ems::Result;

/// Default configuration with a shortened horizon.
pub fn config_with_horizon(horizon: usize) -> MicrogridConfig {
    let mut cfg = MicrogridConfig::default();
    cfg.environment.horizon = horizon;
    cfg
}

/// Simulator over synthetic profiles with the default configuration.
pub fn synthetic_sim(horizon: usize) -> MicrogridSimulator {
    MicrogridSimulator::new(config_with_horizon(horizon), Box::new(SyntheticProfiles))
        .expect("default config is valid")
}

/// Constant profiles: the same renewable, load, and prices every step.
#[derive(Debug, Clone, Copy)]
pub struct ConstantProfiles {
    pub renewable_kw: f64,
    pub load_kw: f64,
    pub price_import: f64,
    pub price_export: f64,
}

impl ProfileProvider for ConstantProfiles {
    fn profiles(&self, horizon: usize, _dt_hours: f64, _seed: u64) -> Result<Profiles> {
        Profiles::new(
            vec![self.renewable_kw; horizon],
            vec![self.load_kw; horizon],
            vec![self.price_import; horizon],
            vec![self.price_export; horizon],
        )
    }

    fn describe(&self) -> String {
        "constant".into()
    }
}

/// Simulator over constant profiles.
pub fn constant_sim(config: MicrogridConfig, profiles: ConstantProfiles) -> MicrogridSimulator {
    MicrogridSimulator::new(config, Box::new(profiles)).expect("config is valid")
}

/// Unique scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("microgrid-ems-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir should be writable");
    dir
}
