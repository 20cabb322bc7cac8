//! Configuration of [`PgTrainer`](super::PgTrainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`PgTrainer`](super::PgTrainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PgTrainerConfig {
    /// The number of episodes to run.
    pub n_episodes: usize,

    /// The maximum number of environment steps per episode.
    pub episode_len: usize,

    /// Interval of optimization steps in episodes.
    pub opt_interval: usize,

    /// Interval of evaluation in optimization steps.
    pub eval_interval: usize,

    /// Interval of saving model parameters in optimization steps.
    pub save_interval: usize,

    /// Interval of flushing records in optimization steps.
    pub flush_record_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,
}

impl Default for PgTrainerConfig {
    fn default() -> Self {
        Self {
            n_episodes: 0,
            episode_len: usize::MAX,
            opt_interval: 1,
            eval_interval: usize::MAX,
            save_interval: usize::MAX,
            flush_record_interval: usize::MAX,
            model_dir: None,
        }
    }
}

impl PgTrainerConfig {
    /// Sets the number of episodes to run.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets the maximum number of environment steps per episode.
    pub fn episode_len(mut self, v: usize) -> Self {
        self.episode_len = v;
        self
    }

    /// Sets the interval of optimization in episodes.
    pub fn opt_interval(mut self, v: usize) -> Self {
        self.opt_interval = v;
        self
    }

    /// Sets the interval of evaluation in optimization steps.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the interval of saving in optimization steps.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the interval of flushing records in optimization steps.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = v;
        self
    }

    /// Sets the directory where the trained model is saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Constructs [`PgTrainerConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PgTrainerConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
