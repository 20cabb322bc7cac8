//! Environment.
use super::{Act, Obs, Step};
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// The environment is a collaborator of the training loop: it emits one
/// scalar reward and the termination flags per step, which the loop
/// appends to an [`EpisodeBuffer`](crate::EpisodeBuffer).
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performs an environment step.
    fn step(&mut self, a: &Self::Act) -> Step<Self>
    where
        Self: Sized;

    /// Resets the environment and returns an initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way, commonly as a random seed,
    /// which is useful for evaluation of a trained agent. This method is
    /// called by [`DefaultEvaluator`](crate::DefaultEvaluator).
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;
}
