//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{Agent, Env};
use anyhow::Result;

/// Runs a fixed number of episodes and averages the episode returns.
///
/// Each episode resets the environment with the episode index, so a
/// configurable environment can vary its seed across evaluation episodes.
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// The environment instance used for evaluation.
    env: E,
}

impl<E: Env, A: Agent<E>> Evaluator<E, A> for DefaultEvaluator<E> {
    fn evaluate(&mut self, agent: &mut A) -> Result<f32> {
        let mut r_total = 0f32;

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;

            loop {
                let act = agent.sample(&prev_obs);
                let step = self.env.step(&act);
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }
        }

        Ok(r_total / self.n_episodes as f32)
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// `n_episodes` is the number of episodes to run per evaluation.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}
