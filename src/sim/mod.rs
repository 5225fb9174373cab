/// Battery physics and thermal proxy.
pub mod battery;
pub mod engine;
pub mod power_balance;
/// Cost breakdown and reward.
pub mod reward;
pub mod types;

pub use engine::MicrogridSimulator;
pub use types::{Action, ActionBounds, OBS_DIM, Observation, ResetInfo, StepInfo, StepOutcome};
