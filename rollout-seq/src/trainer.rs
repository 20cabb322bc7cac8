//! Train a sequence model over shuffled padded minibatches.
mod config;
use crate::{MaskedMetrics, SeqBatcher, SeqBatcherConfig, SeqModel, SequenceSource};
use anyhow::Result;
pub use config::SeqTrainerConfig;
use chrono::Local;
use log::info;
use num_traits::Float;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use rollout_core::record::{AggregateRecorder, Record, RecordValue};
use std::path::Path;

/// Manages the epoch loop of supervised sequence training.
///
/// Per epoch, the training source is shuffled with a seeded RNG and
/// walked in `batch_size` strides. Each stride is padded into a fresh
/// [`SeqBatch`](crate::SeqBatch) by the [`SeqBatcher`] and handed to the
/// model for one optimization step; the batch is dropped afterwards.
/// Strides from the tail of the source may be short, so their batches
/// carry `useful < batch_size` and the filler rows stay out of the
/// model's loss.
///
/// The model is scored on the validation source once before training and
/// after every epoch, under the masking rule, and its parameters are
/// saved under `(model_dir)/(epoch)` every `save_interval` epochs.
pub struct SeqTrainer {
    batcher: SeqBatcher,

    /// The number of passes over the training source.
    n_epochs: usize,

    /// Seed of the shuffling RNG.
    seed: u64,

    /// Interval of saving model parameters in epochs.
    save_interval: usize,

    /// Interval of flushing records in optimization steps.
    flush_record_interval: usize,

    /// Where to save the trained model.
    model_dir: Option<String>,
}

impl SeqTrainer {
    /// Constructs a trainer.
    pub fn build(config: SeqTrainerConfig, batcher_config: &SeqBatcherConfig) -> Self {
        Self {
            batcher: SeqBatcher::build(batcher_config),
            n_epochs: config.n_epochs,
            seed: config.seed,
            save_interval: config.save_interval,
            flush_record_interval: config.flush_record_interval,
            model_dir: config.model_dir,
        }
    }

    fn save_model<T, M: SeqModel<T>>(model: &M, model_dir: String) {
        match model.save_params(Path::new(&model_dir)) {
            Ok(()) => info!("Saved the model in {:?}.", &model_dir),
            Err(_) => info!("Failed to save model in {:?}.", &model_dir),
        }
    }

    fn save_model_with_epoch<T, M: SeqModel<T>>(model: &M, model_dir: String, epoch: usize) {
        let model_dir = model_dir + format!("/{}", epoch).as_str();
        Self::save_model(model, model_dir);
    }

    /// Scores `model` on `source` under the masking rule.
    pub fn evaluate<T, M, S>(&self, model: &mut M, source: &S) -> Result<MaskedMetrics>
    where
        T: Float,
        M: SeqModel<T>,
        S: SequenceSource<T>,
    {
        let mut metrics = MaskedMetrics::new();
        let batch_size = self.batcher.batch_size();

        let mut ix = 0;
        while ix < source.len() {
            let end = (ix + batch_size).min(source.len());
            let batch = self.batcher.batch((ix..end).map(|i| source.get(i)))?;
            let scores = model.predict(&batch.input, &batch.lens);
            metrics.push(&scores, &batch);
            ix = end;
        }

        Ok(metrics)
    }

    /// Scores the model on the validation source and stores the result.
    fn eval_epoch<T, M, S>(
        &self,
        epoch: usize,
        model: &mut M,
        valid_source: &S,
        recorder: &mut Box<dyn AggregateRecorder>,
    ) -> Result<()>
    where
        T: Float,
        M: SeqModel<T>,
        S: SequenceSource<T>,
    {
        let metrics = self.evaluate(model, valid_source)?;
        info!(
            "epoch {} valid loss {:.6} acc {:.2}%",
            epoch,
            metrics.mean_loss(),
            100.0 * metrics.accuracy()
        );

        let mut record = Record::from_slice(&[
            ("epoch", RecordValue::Scalar(epoch as _)),
            ("valid_loss", RecordValue::Scalar(metrics.mean_loss() as _)),
            ("valid_acc", RecordValue::Scalar(metrics.accuracy() as _)),
        ]);
        record.insert("datetime", RecordValue::DateTime(Local::now()));
        recorder.store(record);

        Ok(())
    }

    /// Train the model.
    pub fn train<T, M, S1, S2>(
        &self,
        model: &mut M,
        train_source: &S1,
        valid_source: &S2,
        recorder: &mut Box<dyn AggregateRecorder>,
    ) -> Result<()>
    where
        T: Float,
        M: SeqModel<T>,
        S1: SequenceSource<T>,
        S2: SequenceSource<T>,
    {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut ixs: Vec<usize> = (0..train_source.len()).collect();
        let batch_size = self.batcher.batch_size();
        let mut opt_steps: usize = 0;

        // Baseline before the first update.
        self.eval_epoch(0, model, valid_source, recorder)?;

        for epoch in 1..=self.n_epochs {
            ixs.shuffle(&mut rng);

            for chunk in ixs.chunks(batch_size) {
                let batch = self.batcher.batch(chunk.iter().map(|&i| train_source.get(i)))?;
                let record = model.opt_step(&batch);
                opt_steps += 1;
                recorder.store(record);

                if opt_steps % self.flush_record_interval == 0 {
                    recorder.flush(opt_steps as _);
                }
            }

            self.eval_epoch(epoch, model, valid_source, recorder)?;

            if (self.save_interval > 0) && (epoch % self.save_interval == 0) {
                if let Some(model_dir) = &self.model_dir {
                    Self::save_model_with_epoch(model, model_dir.clone(), epoch);
                }
            }
        }

        Ok(())
    }
}
