//! Train [`Agent`] with episodic policy gradients.
mod config;
use crate::{
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    Agent, Env, EpisodeBuffer, Evaluator, ReturnEstimator, ReturnEstimatorConfig,
};
use anyhow::Result;
pub use config::PgTrainerConfig;
use log::info;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episodic policy-gradient training loop.
///
/// # Training loop
///
/// The loop runs `n_episodes` episodes of at most `episode_len`
/// environment steps each. During an episode the objects interact as
/// shown below:
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|reward, done|C[EpisodeBuffer]
///     C -->|RewardTrace, ValueTrace|D[ReturnEstimator]
///     D -->|Estimate|A
/// ```
///
/// * The agent samples an action for the current observation. If the
///   agent has a value head, its estimate is pushed to the
///   [`EpisodeBuffer`] before the step.
/// * The environment applies the action and the resulting reward is
///   pushed to the buffer. The episode ends on termination, truncation
///   or after `episode_len` steps.
/// * Every `opt_interval` episodes the accumulated buffer is run through
///   the [`ReturnEstimator`] once, the resulting
///   [`Estimate`](crate::Estimate) drives one agent optimization step
///   and the trainer clears the buffer. Nothing else carries state
///   between updates.
///
/// Every `eval_interval` optimization steps the agent is switched to
/// evaluation mode and scored with the given [`Evaluator`]; the best
/// model so far is saved under `(model_dir)/best`. Every `save_interval`
/// optimization steps the current model is saved under
/// `(model_dir)/(opt_steps)`.
pub struct PgTrainer<E: Env> {
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Estimator turning episode traces into policy-loss weights.
    estimator: ReturnEstimator,

    /// The number of episodes to run.
    n_episodes: usize,

    /// The maximum number of environment steps per episode.
    episode_len: usize,

    /// Interval of optimization steps in episodes.
    opt_interval: usize,

    /// Interval of evaluation in optimization steps.
    eval_interval: usize,

    /// Interval of saving the model in optimization steps.
    save_interval: usize,

    /// Interval of flushing records in optimization steps.
    flush_record_interval: usize,

    /// Where to save the trained model.
    model_dir: Option<String>,
}

impl<E: Env> PgTrainer<E> {
    /// Constructs a trainer.
    pub fn build(
        config: PgTrainerConfig,
        env_config: E::Config,
        estimator_config: ReturnEstimatorConfig,
    ) -> Self {
        Self {
            env_config,
            estimator: ReturnEstimator::build(&estimator_config),
            n_episodes: config.n_episodes,
            episode_len: config.episode_len,
            opt_interval: config.opt_interval,
            eval_interval: config.eval_interval,
            save_interval: config.save_interval,
            flush_record_interval: config.flush_record_interval,
            model_dir: config.model_dir,
        }
    }

    fn save_model<A: Agent<E>>(agent: &A, model_dir: String) {
        match agent.save_params(model_dir.as_ref()) {
            Ok(()) => info!("Saved the model in {:?}.", &model_dir),
            Err(_) => info!("Failed to save model in {:?}.", &model_dir),
        }
    }

    fn save_best_model<A: Agent<E>>(agent: &A, model_dir: String) {
        let model_dir = model_dir + "/best";
        Self::save_model(agent, model_dir);
    }

    fn save_model_with_steps<A: Agent<E>>(agent: &A, model_dir: String, steps: usize) {
        let model_dir = model_dir + format!("/{}", steps).as_str();
        Self::save_model(agent, model_dir);
    }

    /// Runs one episode, filling `buffer` with its reward/value trace.
    ///
    /// Returns the episode return and the number of steps taken.
    fn run_episode<A: Agent<E>>(
        &self,
        env: &mut E,
        agent: &mut A,
        buffer: &mut EpisodeBuffer,
    ) -> Result<(f32, usize)> {
        let mut obs = env.reset()?;
        let mut r_total = 0f32;

        for t in 0..self.episode_len {
            if let Some(v) = agent.value(&obs) {
                buffer.push_value(v);
            }
            let act = agent.sample(&obs);
            let step = env.step(&act);
            buffer.push_reward(step.reward);
            r_total += step.reward;

            if step.is_done() {
                return Ok((r_total, t + 1));
            }
            obs = step.obs;
        }

        Ok((r_total, self.episode_len))
    }

    /// Train the agent.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut Box<dyn AggregateRecorder>,
        evaluator: &mut D,
    ) -> Result<()>
    where
        A: Agent<E>,
        D: Evaluator<E, A>,
    {
        let mut env = E::build(&self.env_config, 0)?;
        let mut buffer = EpisodeBuffer::new();
        let mut running_return: Option<f32> = None;
        let mut opt_steps: usize = 0;
        let mut max_eval_return = f32::MIN;
        agent.train();

        for episode in 1..=self.n_episodes {
            let (episode_return, steps) = self.run_episode(&mut env, agent, &mut buffer)?;
            let running = match running_return {
                None => episode_return,
                Some(r) => 0.99 * r + 0.01 * episode_return,
            };
            running_return = Some(running);

            let mut record = Record::from_slice(&[
                ("episode_return", Scalar(episode_return)),
                ("running_return", Scalar(running)),
                ("episode_len", Scalar(steps as _)),
            ]);

            if episode % self.opt_interval == 0 {
                let estimate = self.estimator.estimate(&buffer)?;
                let record_agent = agent.opt(&estimate);
                buffer.clear();
                opt_steps += 1;
                record = record.merge(record_agent);

                // Evaluation
                if opt_steps % self.eval_interval == 0 {
                    info!("Starts evaluation of the trained model");
                    agent.eval();
                    let eval_return = evaluator.evaluate(agent)?;
                    agent.train();
                    record.insert("eval_return", Scalar(eval_return));

                    // Save the best model up to the current iteration
                    if eval_return > max_eval_return {
                        max_eval_return = eval_return;
                        if let Some(model_dir) = &self.model_dir {
                            Self::save_best_model(agent, model_dir.clone());
                        }
                    }
                }

                // Save the current model
                if (self.save_interval > 0) && (opt_steps % self.save_interval == 0) {
                    if let Some(model_dir) = &self.model_dir {
                        Self::save_model_with_steps(agent, model_dir.clone(), opt_steps);
                    }
                }
            }

            // Store the record of this episode
            recorder.store(record);

            // Flush records
            if opt_steps > 0 && episode % self.opt_interval == 0 {
                if opt_steps % self.flush_record_interval == 0 {
                    recorder.flush(opt_steps as _);
                }
            }
        }

        Ok(())
    }
}
