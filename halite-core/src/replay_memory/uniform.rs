//! Replay memory with uniform sampling.
use super::{ReplayMemoryConfig, SampledBatch};
use crate::{error::HaliteError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::{bail, Result};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A ring buffer of transitions sampled uniformly with replacement.
///
/// Indices in sampled batches are slot indices, and all importance-sampling
/// weights are 1.0.
pub struct UniformMemory<T> {
    capacity: usize,
    i: usize,
    data: Vec<Option<T>>,
    size: usize,
    generations: Vec<u64>,
    n_writes: u64,
    rng: StdRng,
}

impl<T: Clone> UniformMemory<T> {
    /// Creates an empty memory holding up to `capacity` transitions.
    pub fn new(capacity: usize, seed: u64) -> Result<Self> {
        if capacity == 0 {
            bail!(HaliteError::InvalidArgument(
                "capacity must be positive".to_string()
            ));
        }
        info!("Built uniform replay memory: capacity={}", capacity);

        Ok(Self {
            capacity,
            i: 0,
            data: (0..capacity).map(|_| None).collect(),
            size: 0,
            generations: vec![0; capacity],
            n_writes: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Stores a transition, overwriting the oldest one once full.
    ///
    /// Returns the slot of the transition.
    pub fn store(&mut self, transition: T) -> usize {
        let slot = self.i;
        self.data[slot] = Some(transition);
        self.n_writes += 1;
        self.generations[slot] = self.n_writes;
        self.i = (self.i + 1) % self.capacity;
        if self.size < self.capacity {
            self.size += 1;
        }
        slot
    }

    /// Samples `n` transitions uniformly with replacement.
    pub fn sample(&mut self, n: usize) -> Result<SampledBatch<T>> {
        if self.size == 0 {
            bail!(HaliteError::EmptyMemory);
        }
        if n == 0 || n > self.capacity {
            bail!(HaliteError::InvalidArgument(format!(
                "batch size must be in 1..={}, got {}",
                self.capacity, n
            )));
        }

        let indices = (0..n)
            .map(|_| self.rng.gen_range(0..self.size))
            .collect::<Vec<_>>();
        let transitions = indices
            .iter()
            .map(|&ix| match &self.data[ix] {
                Some(transition) => Ok(transition.clone()),
                None => bail!(HaliteError::OutOfRange {
                    value: ix as f32,
                    total: self.size as f32,
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        let generations = indices.iter().map(|&ix| self.generations[ix]).collect();

        Ok(SampledBatch {
            indices,
            generations,
            transitions,
            weights: vec![1.0; n],
        })
    }

    /// Maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> ExperienceBufferBase for UniformMemory<T> {
    type Item = T;

    fn push(&mut self, tr: T) -> Result<()> {
        self.store(tr);
        Ok(())
    }

    fn len(&self) -> usize {
        self.size
    }
}

impl<T: Clone> ReplayBufferBase for UniformMemory<T> {
    type Config = ReplayMemoryConfig;
    type Batch = SampledBatch<T>;

    /// Builds the memory; `per_config` is ignored.
    fn build(config: &Self::Config) -> Result<Self> {
        Self::new(config.capacity, config.seed)
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.sample(size)
    }

    fn update_priority(&mut self, ixs: &[usize], td_errs: &[f32]) -> Result<()> {
        if ixs.len() != td_errs.len() {
            bail!(HaliteError::InvalidArgument(format!(
                "{} indices but {} TD errors",
                ixs.len(),
                td_errs.len()
            )));
        }
        if let Some(ix) = ixs.iter().find(|&&ix| ix >= self.size) {
            bail!(HaliteError::InvalidArgument(format!(
                "{} is not the slot of a stored transition",
                ix
            )));
        }
        Ok(())
    }
}
