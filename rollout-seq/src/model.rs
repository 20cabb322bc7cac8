//! Model collaborator interface.
use crate::SeqBatch;
use anyhow::Result;
use ndarray::Array3;
use rollout_core::record::Record;
use std::path::Path;

/// An opaque per-step classifier over padded batches.
///
/// The implementation owns everything framework-side: parameters,
/// gradients and the update rule. This crate only fixes the batch shapes
/// the model consumes and the masking rule its losses must obey.
pub trait SeqModel<T> {
    /// Performs one optimization step on `batch` and reports metrics,
    /// at least a `"loss"` scalar.
    ///
    /// The loss must follow the masking rule: positions beyond
    /// `batch.lens[i]` and rows beyond `batch.useful` are padding and
    /// must not contribute.
    fn opt_step(&mut self, batch: &SeqBatch<T>) -> Record;

    /// Per-step class scores for a padded input, shape
    /// `(batch_size, maxlen, n_classes)`.
    fn predict(&mut self, input: &Array3<T>, lens: &[usize]) -> Array3<T>;

    /// Saves model parameters under the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Loads model parameters from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
