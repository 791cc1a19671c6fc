//! Batches sampled from replay memories.

/// Transitions sampled from a replay memory along with the information needed
/// to correct the learning update and to write priorities back.
///
/// `indices`, `generations`, `transitions` and `weights` are aligned.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledBatch<T> {
    /// Indices of the sampled transitions, to be passed back to
    /// [`ReplayBufferBase::update_priority`](crate::ReplayBufferBase::update_priority).
    pub indices: Vec<usize>,

    /// Write generations of the sampled slots. A slot overwritten after
    /// sampling no longer matches, see [`ReplayMemory::batch_update_current`].
    ///
    /// [`ReplayMemory::batch_update_current`]: super::ReplayMemory::batch_update_current
    pub generations: Vec<u64>,

    /// Sampled transitions.
    pub transitions: Vec<T>,

    /// Importance-sampling weights. All 1.0 for uniform sampling.
    pub weights: Vec<f32>,
}

impl<T> SampledBatch<T> {
    /// Number of sampled transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the batch holds no transition.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Decomposes the batch into `(indices, transitions, weights)`.
    pub fn unpack(self) -> (Vec<usize>, Vec<T>, Vec<f32>) {
        (self.indices, self.transitions, self.weights)
    }
}
