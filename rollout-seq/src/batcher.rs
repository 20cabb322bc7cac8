//! Padded minibatch construction.
use crate::SeqSample;
use anyhow::Result;
use ndarray::{s, Array2, Array3};
use num_traits::Float;
use rollout_core::error::RolloutError;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`SeqBatcher`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SeqBatcherConfig {
    /// Number of slots per batch.
    pub batch_size: usize,

    /// Width of one feature frame.
    pub feature_dim: usize,

    /// Upper bound on sequence length, if any.
    ///
    /// A sequence exceeding the bound fails the whole batch; padding it
    /// to a truncated length would corrupt the supervision signal.
    pub max_len: Option<usize>,

    /// Label id written to padding positions.
    pub pad_id: i64,
}

impl SeqBatcherConfig {
    /// Creates a configuration for batches of `batch_size` sequences of
    /// `feature_dim`-wide frames.
    pub fn new(batch_size: usize, feature_dim: usize) -> Self {
        Self {
            batch_size,
            feature_dim,
            max_len: None,
            pad_id: 0,
        }
    }

    /// Sets the upper bound on sequence length.
    pub fn max_len(mut self, v: usize) -> Self {
        self.max_len = Some(v);
        self
    }

    /// Sets the label id written to padding positions.
    pub fn pad_id(mut self, v: i64) -> Self {
        self.pad_id = v;
        self
    }

    /// Constructs [`SeqBatcherConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`SeqBatcherConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// A fixed-shape padded batch.
///
/// Only the first `lens[i]` positions of row `i` are meaningful and only
/// the first `useful` rows hold real data; everything beyond is padding
/// and must not contribute to loss or accuracy.
#[derive(Debug, Clone)]
pub struct SeqBatch<T> {
    /// Input features, shape `(batch_size, maxlen, feature_dim)`.
    pub input: Array3<T>,

    /// Target label ids, shape `(batch_size, maxlen)`.
    pub target: Array2<i64>,

    /// True length of each row; zero for filler slots.
    pub lens: Vec<usize>,

    /// Number of rows holding real data.
    pub useful: usize,
}

impl<T> SeqBatch<T> {
    /// The common padded length of the batch.
    pub fn maxlen(&self) -> usize {
        self.target.ncols()
    }
}

/// Builds fixed-shape padded batches from variable-length sequences.
///
/// Slot order equals input order, so ids supplied alongside the
/// sequences stay aligned with rows of the output arrays.
pub struct SeqBatcher {
    batch_size: usize,
    feature_dim: usize,
    max_len: Option<usize>,
    pad_id: i64,
}

impl SeqBatcher {
    /// Constructs a batcher.
    pub fn build(config: &SeqBatcherConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            feature_dim: config.feature_dim,
            max_len: config.max_len,
            pad_id: config.pad_id,
        }
    }

    /// Number of slots per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Builds one padded batch.
    ///
    /// `samples` may hold fewer sequences than `batch_size` (the tail of
    /// a dataset); the remaining slots become filler rows of pure
    /// padding with length zero. A batch drawn from nothing but filler
    /// degenerates to `maxlen == 0`.
    pub fn batch<'a, T, I>(&self, samples: I) -> Result<SeqBatch<T>, RolloutError>
    where
        T: Float + 'a,
        I: IntoIterator<Item = &'a SeqSample<T>>,
    {
        let samples: Vec<&SeqSample<T>> = samples.into_iter().collect();
        if samples.len() > self.batch_size {
            return Err(RolloutError::BatchOverflow {
                n: samples.len(),
                batch_size: self.batch_size,
            });
        }

        // One scan for the common padded length.
        let mut maxlen = 0;
        for sample in samples.iter() {
            if sample.feature_dim() != self.feature_dim {
                return Err(RolloutError::FeatureDimMismatch {
                    id: sample.id().to_string(),
                    got: sample.feature_dim(),
                    expected: self.feature_dim,
                });
            }
            if let Some(max_len) = self.max_len {
                if sample.len() > max_len {
                    return Err(RolloutError::SequenceTooLong {
                        id: sample.id().to_string(),
                        len: sample.len(),
                        max_len,
                    });
                }
            }
            maxlen = maxlen.max(sample.len());
        }

        let mut input = Array3::<T>::zeros((self.batch_size, maxlen, self.feature_dim));
        let mut target = Array2::<i64>::from_elem((self.batch_size, maxlen), self.pad_id);
        let mut lens = vec![0usize; self.batch_size];

        for (i, sample) in samples.iter().enumerate() {
            let n = sample.len();
            input
                .slice_mut(s![i, ..n, ..])
                .assign(&sample.features().view());
            target.slice_mut(s![i, ..n]).assign(&sample.labels().view());
            lens[i] = n;
        }

        Ok(SeqBatch {
            input,
            target,
            lens,
            useful: samples.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array2};

    fn sample(len: usize, dim: usize, label: i64, id: &str) -> SeqSample<f32> {
        let features = Array2::from_elem((len, dim), label as f32);
        let labels = arr1(&vec![label; len][..]);
        SeqSample::new(features, labels, id).unwrap()
    }

    #[test]
    fn shapes_and_maxlen() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(3, 2));
        let samples = vec![sample(2, 2, 1, "a"), sample(4, 2, 2, "b")];
        let batch = batcher.batch(&samples).unwrap();

        assert_eq!(batch.input.shape(), &[3, 4, 2]);
        assert_eq!(batch.target.shape(), &[3, 4]);
        assert_eq!(batch.maxlen(), *batch.lens.iter().max().unwrap());
        assert_eq!(batch.lens, vec![2, 4, 0]);
        assert_eq!(batch.useful, 2);
    }

    #[test]
    fn pads_with_zeros_beyond_true_length() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(2, 1));
        let samples = vec![sample(1, 1, 7, "a"), sample(3, 1, 9, "b")];
        let batch = batcher.batch(&samples).unwrap();

        for t in batch.lens[0]..batch.maxlen() {
            assert_eq!(batch.target[[0, t]], 0);
            assert_eq!(batch.input[[0, t, 0]], 0.0);
        }
    }

    #[test]
    fn slot_order_equals_input_order() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(3, 1));
        let samples = vec![
            sample(2, 1, 3, "a"),
            sample(1, 1, 1, "b"),
            sample(3, 1, 2, "c"),
        ];
        let batch = batcher.batch(&samples).unwrap();

        // No sorting by length: row i belongs to input i.
        assert_eq!(batch.lens, vec![2, 1, 3]);
        assert_eq!(batch.target[[0, 0]], 3);
        assert_eq!(batch.target[[1, 0]], 1);
        assert_eq!(batch.target[[2, 0]], 2);
    }

    #[test]
    fn masked_decode_roundtrips_labels() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(2, 1));
        let samples = vec![sample(3, 1, 5, "a"), sample(2, 1, 6, "b")];
        let batch = batcher.batch(&samples).unwrap();

        for (i, s) in samples.iter().enumerate() {
            let decoded: Vec<i64> = (0..batch.lens[i]).map(|t| batch.target[[i, t]]).collect();
            assert_eq!(&decoded[..], s.labels().as_slice().unwrap());
        }
    }

    #[test]
    fn single_unique_length_needs_no_padding() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(2, 1));
        let samples = vec![sample(3, 1, 1, "a"), sample(3, 1, 2, "b")];
        let batch = batcher.batch(&samples).unwrap();
        assert_eq!(batch.maxlen(), 3);
        assert_eq!(batch.lens, vec![3, 3]);
    }

    #[test]
    fn zero_length_sample_becomes_all_padding_row() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(2, 1));
        let samples = vec![sample(0, 1, 0, "empty"), sample(2, 1, 4, "a")];
        let batch = batcher.batch(&samples).unwrap();

        assert_eq!(batch.lens, vec![0, 2]);
        assert!(batch.target.row(0).iter().all(|&x| x == 0));
    }

    #[test]
    fn all_filler_batch_is_empty_not_an_error() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(4, 3));
        let batch = batcher.batch::<f32, _>(&[]).unwrap();

        assert_eq!(batch.input.shape(), &[4, 0, 3]);
        assert_eq!(batch.useful, 0);
        assert_eq!(batch.lens, vec![0; 4]);
    }

    #[test]
    fn rejects_overlong_sequence() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(2, 1).max_len(3));
        let samples = vec![sample(5, 1, 1, "long")];
        let err = batcher.batch(&samples).unwrap_err();
        assert!(matches!(
            err,
            RolloutError::SequenceTooLong {
                len: 5,
                max_len: 3,
                ..
            }
        ));
    }

    #[test]
    fn rejects_feature_dim_mismatch() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(2, 4));
        let samples = vec![sample(2, 3, 1, "narrow")];
        let err = batcher.batch(&samples).unwrap_err();
        assert!(matches!(err, RolloutError::FeatureDimMismatch { .. }));
    }

    #[test]
    fn rejects_batch_overflow() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(1, 1));
        let samples = vec![sample(1, 1, 1, "a"), sample(1, 1, 2, "b")];
        let err = batcher.batch(&samples).unwrap_err();
        assert!(matches!(
            err,
            RolloutError::BatchOverflow { n: 2, batch_size: 1 }
        ));
    }

    #[test]
    fn padding_invariant_holds_for_random_lengths() {
        fastrand::seed(7);
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(8, 3));
        let samples: Vec<_> = (0..6)
            .map(|i| sample(fastrand::usize(1..10), 3, (i + 1) as i64, "r"))
            .collect();
        let batch = batcher.batch(&samples).unwrap();

        assert_eq!(batch.maxlen(), samples.iter().map(|s| s.len()).max().unwrap());
        for i in 0..batch.lens.len() {
            for t in batch.lens[i]..batch.maxlen() {
                assert_eq!(batch.target[[i, t]], 0);
                for f in 0..3 {
                    assert_eq!(batch.input[[i, t, f]], 0.0);
                }
            }
        }
    }

    #[test]
    fn custom_pad_id_fills_padding() {
        let batcher = SeqBatcher::build(&SeqBatcherConfig::new(2, 1).pad_id(-1));
        let samples = vec![sample(1, 1, 3, "a"), sample(2, 1, 4, "b")];
        let batch = batcher.batch(&samples).unwrap();
        assert_eq!(batch.target[[0, 1]], -1);
    }
}
