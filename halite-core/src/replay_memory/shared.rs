//! Replay memory shared between threads.
use super::{ReplayMemory, SampledBatch};
use crate::error::HaliteError;
use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard};

/// A handle to a [`ReplayMemory`] guarded by a single mutex.
///
/// Clones share the same memory, so a data-collection thread can `store` while
/// a training thread calls `sample` and `batch_update`. Each call takes the lock
/// on its own, so slots may be overwritten between `sample` and `batch_update`;
/// `batch_update` takes the generations of the sampled batch and leaves such
/// slots alone.
pub struct SharedReplayMemory<T> {
    memory: Arc<Mutex<ReplayMemory<T>>>,
}

impl<T> Clone for SharedReplayMemory<T> {
    fn clone(&self) -> Self {
        Self {
            memory: Arc::clone(&self.memory),
        }
    }
}

impl<T: Clone> SharedReplayMemory<T> {
    /// Wraps `memory` for sharing.
    pub fn new(memory: ReplayMemory<T>) -> Self {
        Self {
            memory: Arc::new(Mutex::new(memory)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ReplayMemory<T>>> {
        self.memory
            .lock()
            .map_err(|_| HaliteError::LockPoisoned.into())
    }

    /// See [`ReplayMemory::store`].
    pub fn store(&self, transition: T) -> Result<usize> {
        self.lock()?.store(transition)
    }

    /// See [`ReplayMemory::sample`].
    pub fn sample(&self, n: usize) -> Result<SampledBatch<T>> {
        self.lock()?.sample(n)
    }

    /// See [`ReplayMemory::batch_update_current`].
    pub fn batch_update(
        &self,
        leaf_indices: &[usize],
        generations: &[u64],
        abs_td_errors: &[f32],
    ) -> Result<usize> {
        self.lock()?
            .batch_update_current(leaf_indices, generations, abs_td_errors)
    }

    /// Number of stored transitions.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.tree().len())
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.tree().is_empty())
    }

    /// See [`ReplayMemory::beta`].
    pub fn beta(&self) -> Result<f32> {
        Ok(self.lock()?.beta())
    }

    /// See [`ReplayMemory::total_priority`].
    pub fn total_priority(&self) -> Result<f32> {
        Ok(self.lock()?.total_priority())
    }
}
