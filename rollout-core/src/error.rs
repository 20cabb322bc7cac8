//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum RolloutError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// Feature and label lengths of a sequence disagree.
    ///
    /// Truncating either side would silently corrupt the supervision
    /// signal, so the sequence is rejected instead.
    #[error("Sequence {id}: {n_features} feature frames but {n_labels} labels")]
    LengthMismatch {
        /// Identifier of the offending sequence.
        id: String,
        /// Number of feature frames.
        n_features: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// A sequence is longer than the configured maximum padded length.
    #[error("Sequence {id}: length {len} exceeds the maximum {max_len}")]
    SequenceTooLong {
        /// Identifier of the offending sequence.
        id: String,
        /// True length of the sequence.
        len: usize,
        /// Configured maximum length.
        max_len: usize,
    },

    /// A sequence's feature width differs from the configured dimension.
    #[error("Sequence {id}: feature dimension {got}, batcher expects {expected}")]
    FeatureDimMismatch {
        /// Identifier of the offending sequence.
        id: String,
        /// Feature width of the sequence.
        got: usize,
        /// Feature width the batcher was configured with.
        expected: usize,
    },

    /// More sequences than slots were handed to the batcher.
    #[error("Got {n} sequences for a batch of {batch_size} slots")]
    BatchOverflow {
        /// Number of sequences supplied.
        n: usize,
        /// Configured batch size.
        batch_size: usize,
    },

    /// The value trace does not match the reward trace.
    #[error("Value trace has {n_values} entries for {n_rewards} rewards")]
    TraceLengthMismatch {
        /// Entries in the reward trace.
        n_rewards: usize,
        /// Entries in the value trace.
        n_values: usize,
    },
}
