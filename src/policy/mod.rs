//! Dispatch policies driving the simulator.
//!
//! Every controller implements [`Policy`]: observation in, action out. The
//! safety supervisor sanitizes the action before it reaches the simulator.

/// Externally trained policies loaded through a pluggable loader.
pub mod external;
pub mod random;
/// Cost-aware heuristic baseline.
pub mod rule_based;

pub use external::{Algorithm, ArtifactLoader, ExternalPolicy, PolicyArtifact};
pub use random::RandomPolicy;
pub use rule_based::RuleBasedPolicy;

use crate::error::Result;
use crate::sim::{Action, Observation};

/// Observation to action mapping.
pub trait Policy {
    /// Short name recorded in evaluation summaries.
    fn name(&self) -> &str;

    /// Called before each episode with that episode's seed.
    ///
    /// Stochastic policies reseed here so evaluation stays reproducible.
    fn reset(&mut self, _seed: u64) {}

    /// Proposes an action for `observation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy cannot produce a well-formed action.
    fn act(&mut self, observation: &Observation) -> Result<Action>;
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn reset(&mut self, seed: u64) {
        (**self).reset(seed);
    }

    fn act(&mut self, observation: &Observation) -> Result<Action> {
        (**self).act(observation)
    }
}
