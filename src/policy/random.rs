use rand::{Rng, SeedableRng, rngs::StdRng};

use super::Policy;
use crate::error::Result;
use crate::sim::{Action, ActionBounds, Observation};

/// Uniform sampler over the simulator's declared action space.
///
/// Emits battery+grid actions. The generator is reseeded from the episode
/// seed on every [`Policy::reset`], so repeated evaluations match exactly.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    bounds: ActionBounds,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(bounds: ActionBounds, seed: u64) -> Self {
        Self {
            bounds,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn sample(&mut self, low: f64, high: f64) -> f64 {
        if high > low {
            self.rng.random_range(low..=high)
        } else {
            low
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn reset(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn act(&mut self, _observation: &Observation) -> Result<Action> {
        let b = self.bounds;
        let battery_kw = self.sample(b.battery_min_kw, b.battery_max_kw);
        let grid_kw = self.sample(b.grid_min_kw, b.grid_max_kw);
        Ok(Action::battery_grid(battery_kw, grid_kw))
    }
}
