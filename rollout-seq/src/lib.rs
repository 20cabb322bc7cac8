#![warn(missing_docs)]
//! Padded minibatch construction and masked metrics for variable-length
//! labeled sequences.
//!
//! A [`SeqSample`] pairs a frame of features with one label id per step.
//! The [`SeqBatcher`] pads a group of samples into the fixed-shape
//! [`SeqBatch`] arrays a per-step classifier consumes, and
//! [`MaskedMetrics`] scores predictions while keeping padding out of
//! loss and accuracy. [`SeqTrainer`] wires these into an epoch loop over
//! a [`SequenceSource`] and an opaque [`SeqModel`].
mod batcher;
mod dataset;
mod mask;
mod model;
mod sample;
mod trainer;

pub use batcher::{SeqBatch, SeqBatcher, SeqBatcherConfig};
pub use dataset::SequenceSource;
pub use mask::MaskedMetrics;
pub use model::SeqModel;
pub use sample::SeqSample;
pub use trainer::{SeqTrainer, SeqTrainerConfig};
