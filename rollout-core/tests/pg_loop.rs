use anyhow::Result;
use rollout_core::{
    record::{BufferedRecorder, Record},
    Act, Agent, DefaultEvaluator, Env, Estimate, Obs, PgTrainer, PgTrainerConfig, Policy,
    ReturnEstimatorConfig, Step,
};
use std::path::Path;

#[derive(Clone, Debug)]
struct CounterObs(usize);

impl Obs for CounterObs {}

#[derive(Clone, Debug)]
struct NoopAct;

impl Act for NoopAct {}

/// Replays a fixed reward trace, terminating at its end.
struct ScriptedEnv {
    rewards: Vec<f32>,
    t: usize,
}

impl Env for ScriptedEnv {
    type Config = Vec<f32>;
    type Obs = CounterObs;
    type Act = NoopAct;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            rewards: config.clone(),
            t: 0,
        })
    }

    fn step(&mut self, _a: &Self::Act) -> Step<Self> {
        let reward = self.rewards[self.t];
        self.t += 1;
        let is_terminated = self.t == self.rewards.len();
        Step::new(CounterObs(self.t), NoopAct, reward, is_terminated, false)
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        Ok(CounterObs(0))
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }
}

/// Counts optimization steps and remembers the last weight trace.
struct CountingAgent {
    is_train: bool,
    n_opts: usize,
    n_saves: std::cell::Cell<usize>,
    last_weights: Vec<f32>,
}

impl CountingAgent {
    fn new() -> Self {
        Self {
            is_train: false,
            n_opts: 0,
            n_saves: std::cell::Cell::new(0),
            last_weights: vec![],
        }
    }
}

impl Policy<ScriptedEnv> for CountingAgent {
    fn sample(&mut self, _obs: &CounterObs) -> NoopAct {
        NoopAct
    }
}

impl Agent<ScriptedEnv> for CountingAgent {
    fn train(&mut self) {
        self.is_train = true;
    }

    fn eval(&mut self) {
        self.is_train = false;
    }

    fn is_train(&self) -> bool {
        self.is_train
    }

    fn opt(&mut self, estimate: &Estimate) -> Record {
        self.n_opts += 1;
        self.last_weights = estimate.weights.clone();
        Record::from_scalar("loss", estimate.weights.len() as f32)
    }

    fn save_params(&self, _path: &Path) -> Result<()> {
        self.n_saves.set(self.n_saves.get() + 1);
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

#[test]
fn pg_loop_updates_on_interval() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let env_config = vec![0.0, 0.0, 1.0];
    let config = PgTrainerConfig::default()
        .n_episodes(4)
        .episode_len(100)
        .opt_interval(2)
        .save_interval(2)
        .flush_record_interval(1)
        .model_dir("unused");
    let estimator_config = ReturnEstimatorConfig::Plain {
        gamma: 1.0,
        var_reduce: false,
    };

    let mut trainer = PgTrainer::<ScriptedEnv>::build(config, env_config.clone(), estimator_config);
    let mut agent = CountingAgent::new();
    let mut recorder: Box<dyn rollout_core::record::AggregateRecorder> =
        Box::new(BufferedRecorder::new());
    let mut evaluator = DefaultEvaluator::<ScriptedEnv>::new(&env_config, 0, 1)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    // 4 episodes at opt_interval 2 give 2 optimization steps, each over
    // the 2 episodes accumulated since the previous one.
    assert_eq!(agent.n_opts, 2);
    assert_eq!(agent.last_weights.len(), 2 * env_config.len());
    // save_interval 2 saves once, at the second optimization step.
    assert_eq!(agent.n_saves.get(), 1);
    assert!(agent.is_train());

    Ok(())
}

#[test]
fn episode_len_truncates_rollouts() -> Result<()> {
    // The env never terminates within 2 steps, so the trainer cuts each
    // episode at episode_len.
    let env_config = vec![0.0, 0.0, 1.0];
    let config = PgTrainerConfig::default()
        .n_episodes(1)
        .episode_len(2)
        .opt_interval(1);
    let estimator_config = ReturnEstimatorConfig::Plain {
        gamma: 0.99,
        var_reduce: false,
    };

    let mut trainer = PgTrainer::<ScriptedEnv>::build(config, env_config.clone(), estimator_config);
    let mut agent = CountingAgent::new();
    let mut recorder: Box<dyn rollout_core::record::AggregateRecorder> =
        Box::new(BufferedRecorder::new());
    let mut evaluator = DefaultEvaluator::<ScriptedEnv>::new(&env_config, 0, 1)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    assert_eq!(agent.n_opts, 1);
    assert_eq!(agent.last_weights.len(), 2);

    Ok(())
}
