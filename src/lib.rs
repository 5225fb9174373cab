//! Microgrid energy management: simulator, safety supervisor, dispatch
//! policies, and reproducible evaluation.

pub mod cli;
/// Microgrid configuration, presets, and validation.
pub mod config;
pub mod comparison;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod policy;
/// Renewable, load, and tariff time series.
pub mod profiles;
pub mod runner;
pub mod safety;
/// Simulation engine, battery physics, and reward.
pub mod sim;

pub use error::{EmsError, Result};
