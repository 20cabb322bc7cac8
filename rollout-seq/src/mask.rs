//! Masked loss and accuracy over padded batches.
use crate::SeqBatch;
use ndarray::{s, Array3};
use num_traits::{Float, ToPrimitive};

/// Per-frame loss and accuracy totals restricted to true sequence
/// lengths.
///
/// Frames beyond `lens[i]` and rows beyond `useful` never contribute.
/// When nothing was counted, the reported mean loss and accuracy are an
/// explicit zero rather than a division fault.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MaskedMetrics {
    loss_sum: f64,
    n_correct: usize,
    n_frames: usize,
}

impl MaskedMetrics {
    /// Creates zeroed totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates loss and accuracy for one batch of per-step scores.
    ///
    /// `scores` holds unnormalized per-class scores of shape
    /// `(batch_size, maxlen, n_classes)`, exactly what
    /// [`SeqModel::predict`](crate::SeqModel::predict) produces for the
    /// batch. The loss is the negative log-likelihood of the target
    /// class under a numerically stable log-softmax.
    pub fn push<T: Float>(&mut self, scores: &Array3<T>, batch: &SeqBatch<T>) {
        for i in 0..batch.useful {
            for t in 0..batch.lens[i] {
                let row = scores.slice(s![i, t, ..]);
                let target = batch.target[[i, t]] as usize;

                let max = row.fold(T::neg_infinity(), |m, &x| m.max(x));
                let mut denom = T::zero();
                let mut argmax = 0;
                let mut best = T::neg_infinity();
                for (k, &x) in row.iter().enumerate() {
                    denom = denom + (x - max).exp();
                    if x > best {
                        best = x;
                        argmax = k;
                    }
                }
                let log_prob = row[target] - max - denom.ln();

                self.loss_sum -= log_prob.to_f64().unwrap_or(0.0);
                if argmax == target {
                    self.n_correct += 1;
                }
                self.n_frames += 1;
            }
        }
    }

    /// Number of frames counted so far.
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Mean per-frame negative log-likelihood; zero when no frame was
    /// counted.
    pub fn mean_loss(&self) -> f64 {
        if self.n_frames == 0 {
            0.0
        } else {
            self.loss_sum / self.n_frames as f64
        }
    }

    /// Fraction of correctly classified frames; zero when no frame was
    /// counted.
    pub fn accuracy(&self) -> f64 {
        if self.n_frames == 0 {
            0.0
        } else {
            self.n_correct as f64 / self.n_frames as f64
        }
    }
}
