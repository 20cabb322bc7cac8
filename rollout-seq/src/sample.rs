//! A variable-length labeled sequence.
use ndarray::{Array1, Array2};
use rollout_core::error::RolloutError;

/// One variable-length labeled example: a feature frame and an integer
/// label id per step.
#[derive(Debug, Clone)]
pub struct SeqSample<T> {
    features: Array2<T>,
    labels: Array1<i64>,
    id: String,
}

impl<T> SeqSample<T> {
    /// Constructs a sample from per-step features of shape `(len, F)`
    /// and `len` label ids.
    ///
    /// A feature/label length mismatch is rejected; truncating either
    /// side would silently corrupt the supervision signal.
    pub fn new(
        features: Array2<T>,
        labels: Array1<i64>,
        id: impl Into<String>,
    ) -> Result<Self, RolloutError> {
        let id = id.into();
        if features.nrows() != labels.len() {
            return Err(RolloutError::LengthMismatch {
                id,
                n_features: features.nrows(),
                n_labels: labels.len(),
            });
        }
        Ok(Self {
            features,
            labels,
            id,
        })
    }

    /// Number of steps in the sequence.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` for a zero-length sequence.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Width of one feature frame.
    pub fn feature_dim(&self) -> usize {
        self.features.ncols()
    }

    /// Feature frames, one row per step.
    pub fn features(&self) -> &Array2<T> {
        &self.features
    }

    /// Label ids, one per step.
    pub fn labels(&self) -> &Array1<i64> {
        &self.labels
    }

    /// Identifier supplied by the dataset.
    pub fn id(&self) -> &str {
        &self.id
    }
}
