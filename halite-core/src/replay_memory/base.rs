//! Prioritized replay memory.
//!
//! Transitions are stored in a ring buffer backed by a [`PrioritySumTree`] and
//! sampled proportionally to their priorities, which are derived from absolute
//! TD errors reported by the learner.

mod beta_scheduler;
mod sum_tree;
use super::{PerConfig, ReplayMemoryConfig, SampledBatch};
use crate::{error::HaliteError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::{bail, Result};
pub use beta_scheduler::BetaScheduler;
use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
pub use sum_tree::PrioritySumTree;

/// A replay memory with prioritized experience replay.
///
/// # Examples
///
/// ```rust
/// use halite_core::replay_memory::{PerConfig, ReplayMemory};
///
/// let mut memory = ReplayMemory::new(4, PerConfig::default(), 42).unwrap();
/// for t in 0..4 {
///     memory.store(t).unwrap();
/// }
///
/// let batch = memory.sample(2).unwrap();
/// let abs_errors = vec![0.5; batch.len()];
/// memory.batch_update(&batch.indices, &abs_errors).unwrap();
/// ```
pub struct ReplayMemory<T> {
    tree: PrioritySumTree<T>,
    per_config: PerConfig,
    beta_scheduler: BetaScheduler,
    rng: StdRng,
}

impl<T: Clone> ReplayMemory<T> {
    /// Creates an empty memory holding up to `capacity` transitions.
    pub fn new(capacity: usize, per_config: PerConfig, seed: u64) -> Result<Self> {
        per_config.validate()?;
        let tree = PrioritySumTree::new(capacity)?;
        let beta_scheduler = BetaScheduler::new(
            per_config.beta_0,
            per_config.beta_final,
            per_config.beta_increment,
        );
        info!(
            "Built prioritized replay memory: capacity={}, alpha={}, beta_0={}",
            capacity, per_config.alpha, per_config.beta_0
        );

        Ok(Self {
            tree,
            per_config,
            beta_scheduler,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Stores a transition with the largest priority held so far, so that it is
    /// sampled at least once before the learner corrects its priority.
    ///
    /// Into an empty memory, transitions are stored with `abs_error_upper`.
    /// Returns the leaf index of the transition.
    pub fn store(&mut self, transition: T) -> Result<usize> {
        let p = match self.tree.max_priority() {
            Some(p) if p > 0.0 => p,
            _ => self.per_config.abs_error_upper,
        };
        let leaf_index = self.tree.add(p, transition)?;
        trace!("Stored transition at leaf {} with priority {}", leaf_index, p);
        Ok(leaf_index)
    }

    /// Samples `n` transitions by stratified sampling over the priority range.
    ///
    /// `[0, total)` is split into `n` equal segments and one value is drawn in
    /// each. Every call anneals $\beta$ before the importance-sampling weights
    /// $w_i = (P(i) / \min_j P(j))^{-\beta}$ are computed, so $w_i \le 1$.
    pub fn sample(&mut self, n: usize) -> Result<SampledBatch<T>> {
        if self.tree.is_empty() {
            bail!(HaliteError::EmptyMemory);
        }
        if n == 0 || n > self.tree.capacity() {
            bail!(HaliteError::InvalidArgument(format!(
                "batch size must be in 1..={}, got {}",
                self.tree.capacity(),
                n
            )));
        }

        let total = self.tree.total_priority();
        let min_p = match self.tree.min_priority() {
            Some(p) if total > 0.0 && p > 0.0 => p,
            _ => bail!(HaliteError::OutOfRange { value: 0.0, total }),
        };

        self.beta_scheduler.add_n_samples();
        let beta = self.beta_scheduler.beta();
        let min_prob = min_p / total;
        let segment = total / n as f32;

        let mut indices = Vec::with_capacity(n);
        let mut generations = Vec::with_capacity(n);
        let mut transitions = Vec::with_capacity(n);
        let mut weights = Vec::with_capacity(n);

        for i in 0..n {
            let a = segment * i as f32;
            let b = (segment * (i + 1) as f32).min(total);

            // Draw from (a, b]: with left-biased ties the slot ending at b owns b.
            let u: f32 = self.rng.gen();
            let v = b - (b - a) * u;
            let v = if v > a { v } else { b };

            let (leaf_index, p, transition) = self.tree.get(v)?;
            let prob = p / total;
            indices.push(leaf_index);
            generations.push(self.tree.generation(leaf_index)?);
            transitions.push(transition.clone());
            weights.push((prob / min_prob).powf(-beta));
        }

        debug!(
            "Sampled {} transitions: total priority={}, beta={}",
            n, total, beta
        );

        Ok(SampledBatch {
            indices,
            generations,
            transitions,
            weights,
        })
    }

    /// Writes priorities derived from absolute TD errors back to the tree.
    ///
    /// The priority of error $e$ is $\min(|e| + \epsilon, e_{upper})^\alpha$,
    /// floored at the smallest positive `f32`. All pairs are checked before any
    /// priority is changed.
    pub fn batch_update(&mut self, leaf_indices: &[usize], abs_td_errors: &[f32]) -> Result<()> {
        let priorities = self.priorities(leaf_indices, abs_td_errors)?;
        for (ix, p) in priorities {
            self.tree.update(ix, p)?;
        }
        Ok(())
    }

    /// Like [`batch_update`](Self::batch_update), but skips every leaf whose
    /// slot has been overwritten since it was sampled, i.e. whose current
    /// generation differs from the one in `generations`.
    ///
    /// Returns the number of priorities written.
    pub fn batch_update_current(
        &mut self,
        leaf_indices: &[usize],
        generations: &[u64],
        abs_td_errors: &[f32],
    ) -> Result<usize> {
        if leaf_indices.len() != generations.len() {
            bail!(HaliteError::InvalidArgument(format!(
                "{} indices but {} generations",
                leaf_indices.len(),
                generations.len()
            )));
        }
        let priorities = self.priorities(leaf_indices, abs_td_errors)?;

        let mut n_written = 0;
        for ((ix, p), &generation) in priorities.into_iter().zip(generations.iter()) {
            if self.tree.generation(ix)? != generation {
                debug!("Skipped priority update of overwritten leaf {}", ix);
                continue;
            }
            self.tree.update(ix, p)?;
            n_written += 1;
        }
        Ok(n_written)
    }

    fn priorities(
        &self,
        leaf_indices: &[usize],
        abs_td_errors: &[f32],
    ) -> Result<Vec<(usize, f32)>> {
        if leaf_indices.len() != abs_td_errors.len() {
            bail!(HaliteError::InvalidArgument(format!(
                "{} indices but {} TD errors",
                leaf_indices.len(),
                abs_td_errors.len()
            )));
        }

        leaf_indices
            .iter()
            .zip(abs_td_errors.iter())
            .map(|(&ix, &err)| {
                if err.is_nan() {
                    bail!(HaliteError::InvalidArgument(format!(
                        "TD error of leaf {} is NaN",
                        ix
                    )));
                }
                if !self.tree.is_written(ix) {
                    bail!(HaliteError::InvalidArgument(format!(
                        "{} is not the leaf index of a stored transition",
                        ix
                    )));
                }
                Ok((ix, self.priority(err)))
            })
            .collect()
    }

    // A priority that underflows to zero would make its transition unreachable
    // and leave the minimum probability at zero.
    fn priority(&self, abs_td_error: f32) -> f32 {
        let clipped = (abs_td_error.abs() + self.per_config.epsilon)
            .min(self.per_config.abs_error_upper);
        clipped.powf(self.per_config.alpha).max(f32::MIN_POSITIVE)
    }

    /// Current exponent of importance-sampling weights.
    pub fn beta(&self) -> f32 {
        self.beta_scheduler.beta()
    }

    /// Maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    /// Sum of the priorities of all stored transitions.
    pub fn total_priority(&self) -> f32 {
        self.tree.total_priority()
    }

    /// The underlying sum tree.
    pub fn tree(&self) -> &PrioritySumTree<T> {
        &self.tree
    }

    /// PER parameters of the memory.
    pub fn per_config(&self) -> &PerConfig {
        &self.per_config
    }
}

impl<T: Clone> ExperienceBufferBase for ReplayMemory<T> {
    type Item = T;

    fn push(&mut self, tr: T) -> Result<()> {
        self.store(tr).map(|_| ())
    }

    fn len(&self) -> usize {
        self.tree.len()
    }
}

impl<T: Clone> ReplayBufferBase for ReplayMemory<T> {
    type Config = ReplayMemoryConfig;
    type Batch = SampledBatch<T>;

    /// Fails if `per_config` is `None`; use [`UniformMemory`](super::UniformMemory)
    /// for uniform sampling.
    fn build(config: &Self::Config) -> Result<Self> {
        match &config.per_config {
            Some(per_config) => Self::new(config.capacity, per_config.clone(), config.seed),
            None => bail!(HaliteError::InvalidArgument(
                "per_config is required for a prioritized replay memory".to_string()
            )),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.sample(size)
    }

    fn update_priority(&mut self, ixs: &[usize], td_errs: &[f32]) -> Result<()> {
        self.batch_update(ixs, td_errs)
    }
}
