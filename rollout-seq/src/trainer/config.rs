//! Configuration of [`SeqTrainer`](super::SeqTrainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`SeqTrainer`](super::SeqTrainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SeqTrainerConfig {
    /// The number of passes over the training source.
    pub n_epochs: usize,

    /// Seed of the shuffling RNG.
    pub seed: u64,

    /// Interval of saving model parameters in epochs.
    pub save_interval: usize,

    /// Interval of flushing records in optimization steps.
    pub flush_record_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,
}

impl Default for SeqTrainerConfig {
    fn default() -> Self {
        Self {
            n_epochs: 0,
            seed: 42,
            save_interval: 1,
            flush_record_interval: usize::MAX,
            model_dir: None,
        }
    }
}

impl SeqTrainerConfig {
    /// Sets the number of passes over the training source.
    pub fn n_epochs(mut self, v: usize) -> Self {
        self.n_epochs = v;
        self
    }

    /// Sets the seed of the shuffling RNG.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the interval of saving in epochs.
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

    /// Constructs [`SeqTrainerConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`SeqTrainerConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn roundtrip_through_yaml_file() -> Result<()> {
        let config = SeqTrainerConfig::default()
            .n_epochs(10)
            .seed(7)
            .save_interval(2)
            .model_dir("some/directory");

        let dir = TempDir::new("seq_trainer_config")?;
        let path = dir.path().join("seq_trainer_config.yaml");

        config.save(&path)?;
        let config_ = SeqTrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
