//! Configuration of the tabular Q-learning agent.
use super::{explorer::EpsilonGreedy, model::TabularQModelConfig};
use anyhow::Result;
use halite_core::replay_memory::ReplayMemoryConfig;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Constructs [`TabularQLearner`](super::TabularQLearner).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TabularQLearnerConfig {
    /// Configuration of the action-value table.
    pub model_config: TabularQModelConfig,

    /// Configuration of the replay memory. Its `per_config` selects
    /// prioritized or uniform replay.
    pub memory_config: ReplayMemoryConfig,

    /// Epsilon-greedy explorer used by `pick_action`.
    pub explorer: EpsilonGreedy,

    /// Number of transitions sampled per learning step.
    pub batch_size: usize,

    /// Discount factor of future rewards.
    pub discount_factor: f32,

    /// Number of learning steps between copies of the table into the target
    /// table.
    pub replace_target_iter: usize,
}

impl Default for TabularQLearnerConfig {
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            memory_config: Default::default(),
            explorer: EpsilonGreedy::new(),
            batch_size: 100,
            discount_factor: 0.9,
            replace_target_iter: 500,
        }
    }
}

impl TabularQLearnerConfig {
    /// Sets the configuration of the action-value table.
    pub fn model_config(mut self, v: TabularQModelConfig) -> Self {
        self.model_config = v;
        self
    }

    /// Sets the configuration of the replay memory.
    pub fn memory_config(mut self, v: ReplayMemoryConfig) -> Self {
        self.memory_config = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the number of transitions sampled per learning step.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the interval of learning steps between target table replacements.
    pub fn replace_target_iter(mut self, v: usize) -> Self {
        self.replace_target_iter = v;
        self
    }

    /// Constructs [`TabularQLearnerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TabularQLearnerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
