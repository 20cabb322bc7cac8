//! Agent.
use super::{Env, Policy};
use crate::{record::Record, Estimate};
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// The agent owns everything framework-side: parameters, the
/// log-probabilities it collects while sampling, and the update rule.
/// The training loop only hands it the per-step loss weights computed by
/// a [`ReturnEstimator`](crate::ReturnEstimator).
pub trait Agent<E: Env>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Critic estimate of the value of `obs`.
    ///
    /// Agents without a value head return `None` and the trainer keeps
    /// the value trace empty.
    fn value(&mut self, _obs: &E::Obs) -> Option<f32> {
        None
    }

    /// Performs an optimization step.
    ///
    /// `estimate` carries one policy-loss weight per environment step
    /// accumulated since the previous optimization step, in step order.
    /// Returns at least a `"loss"` scalar.
    fn opt(&mut self, estimate: &Estimate) -> Record;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
