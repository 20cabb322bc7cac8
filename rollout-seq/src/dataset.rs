//! Dataset collaborator interface.
use crate::SeqSample;

/// An ordered collection of sequences, as handed over by a data loader.
///
/// Sources hand out fully formed, immutable samples with at least one
/// step each; any parallelism in producing them stays on the loader's
/// side of this trait.
pub trait SequenceSource<T> {
    /// Number of sequences available.
    fn len(&self) -> usize;

    /// Returns `true` when the source holds no sequences.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sequence at `ix`, in source order.
    fn get(&self, ix: usize) -> &SeqSample<T>;
}

impl<T> SequenceSource<T> for Vec<SeqSample<T>> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, ix: usize) -> &SeqSample<T> {
        &self[ix]
    }
}
