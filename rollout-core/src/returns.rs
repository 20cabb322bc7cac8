//! Return and advantage estimation over episode traces.
use crate::{error::RolloutError, EpisodeBuffer};
use serde::{Deserialize, Serialize};

/// Per-step policy-loss weights with the accumulated critic loss.
///
/// `weights[i]` multiplies the log-probability of the action taken at
/// step `i` in the policy-gradient loss. For the plain estimator these
/// are the (optionally normalized) discounted returns; for the GAE
/// estimator they are advantages and `value_loss` additionally carries
/// the accumulated squared error of the critic. How the two terms are
/// combined, e.g. summed with a 0.5 weight on the value loss, is the
/// agent's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    /// Per-step policy-loss weights, in step order.
    pub weights: Vec<f32>,

    /// Accumulated value-function loss, zero for the plain estimator.
    pub value_loss: f32,
}

/// Configuration of [`ReturnEstimator`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum ReturnEstimatorConfig {
    /// Discounted returns with reset on nonzero reward.
    Plain {
        /// Discount factor in `[0, 1]`.
        gamma: f32,

        /// Normalize the returns to zero mean and unit deviation.
        var_reduce: bool,
    },

    /// Generalized advantage estimation with a single decay parameter.
    Gae {
        /// Discount factor, also used as the residual decay.
        gamma: f32,
    },
}

impl Default for ReturnEstimatorConfig {
    fn default() -> Self {
        Self::Plain {
            gamma: 0.99,
            var_reduce: false,
        }
    }
}

/// Turns the trace of one rollout window into policy-loss weights.
///
/// The strategy is chosen once at construction and invoked exactly once
/// over each accumulated [`EpisodeBuffer`]; the caller clears the buffer
/// afterwards.
#[derive(Debug, Clone)]
pub enum ReturnEstimator {
    /// Discounted returns with reset on nonzero reward.
    Plain {
        /// Discount factor in `[0, 1]`.
        gamma: f32,

        /// Normalize the returns to zero mean and unit deviation.
        var_reduce: bool,
    },

    /// Generalized advantage estimation with a single decay parameter.
    Gae {
        /// Discount factor, also used as the residual decay.
        gamma: f32,
    },
}

impl ReturnEstimator {
    /// Builds an estimator from its configuration.
    pub fn build(config: &ReturnEstimatorConfig) -> Self {
        match *config {
            ReturnEstimatorConfig::Plain { gamma, var_reduce } => {
                Self::Plain { gamma, var_reduce }
            }
            ReturnEstimatorConfig::Gae { gamma } => Self::Gae { gamma },
        }
    }

    /// Runs the estimator over the whole accumulated trace.
    ///
    /// An empty trace yields an empty estimate. The GAE variant requires
    /// one value estimate per reward and fails with
    /// [`RolloutError::TraceLengthMismatch`] otherwise; the plain variant
    /// ignores the value trace.
    pub fn estimate(&self, buf: &EpisodeBuffer) -> Result<Estimate, RolloutError> {
        match *self {
            Self::Plain { gamma, var_reduce } => Ok(plain(buf.rewards(), gamma, var_reduce)),
            Self::Gae { gamma } => gae(buf.rewards(), buf.values(), gamma),
        }
    }
}

/// Backward scan with reset on nonzero reward.
///
/// A nonzero reward marks the end of a point within a multi-point
/// episode, so the running accumulator restarts there instead of leaking
/// returns across points. This is not a generic discounted sum.
fn plain(rewards: &[f32], gamma: f32, var_reduce: bool) -> Estimate {
    let mut weights = vec![0f32; rewards.len()];
    let mut acc = 0f32;

    for i in (0..rewards.len()).rev() {
        if rewards[i] != 0.0 {
            acc = 0.0;
        }
        acc = rewards[i] + gamma * acc;
        weights[i] = acc;
    }

    // The sample deviation is undefined for a single step.
    if var_reduce && weights.len() > 1 {
        normalize(&mut weights);
    }

    Estimate {
        weights,
        value_loss: 0.0,
    }
}

/// Shifts to zero mean and scales to unit sample deviation.
fn normalize(xs: &mut [f32]) {
    let n = xs.len() as f32;
    let mean = xs.iter().sum::<f32>() / n;
    let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / (n - 1.0);
    let std = var.sqrt() + f32::EPSILON;

    for x in xs.iter_mut() {
        *x = (*x - mean) / std;
    }
}

/// Single backward scan producing advantages and the critic loss.
///
/// The bootstrap value at the end of the trace is fixed to zero. The
/// residual decays with `gamma` itself, not a separate lambda.
fn gae(rewards: &[f32], values: &[f32], gamma: f32) -> Result<Estimate, RolloutError> {
    if rewards.len() != values.len() {
        return Err(RolloutError::TraceLengthMismatch {
            n_rewards: rewards.len(),
            n_values: values.len(),
        });
    }

    let t = rewards.len();
    let mut weights = vec![0f32; t];
    let mut value_loss = 0f32;
    let mut ret = 0f32;
    let mut gae = 0f32;

    for i in (0..t).rev() {
        ret = gamma * ret + rewards[i];
        let err = ret - values[i];
        value_loss += 0.5 * err * err;

        let next_value = if i + 1 == t { 0.0 } else { values[i + 1] };
        let delta = rewards[i] + gamma * next_value - values[i];
        gae = gae * gamma + delta;
        weights[i] = gae;
    }

    Ok(Estimate { weights, value_loss })
}
