//! Configuration of replay memories.
//!
//! [`ReplayMemoryConfig`] holds the capacity and seed of a memory; its optional
//! [`PerConfig`] turns on prioritized experience replay. Both can be stored in
//! and read from YAML files.

use crate::error::HaliteError;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration for Prioritized Experience Replay (PER).
///
/// # Examples
///
/// ```rust
/// use halite_core::replay_memory::PerConfig;
///
/// let config = PerConfig::default()
///     .alpha(0.6)
///     .beta_0(0.4)
///     .beta_increment(0.001)
///     .abs_error_upper(1.0);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerConfig {
    /// Added to absolute TD errors so that no transition has zero priority.
    pub epsilon: f32,

    /// Exponent for prioritization, in `[0, 1]`. A value of 0 results in
    /// uniform sampling.
    pub alpha: f32,

    /// Initial value of the importance sampling exponent.
    pub beta_0: f32,

    /// Increment of the importance sampling exponent per sampling call.
    pub beta_increment: f32,

    /// Final value of the importance sampling exponent.
    pub beta_final: f32,

    /// Ceiling of absolute TD errors before exponentiation. Also the priority
    /// given to transitions stored into an empty memory.
    pub abs_error_upper: f32,
}

impl Default for PerConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            alpha: 0.6,
            beta_0: 0.4,
            beta_increment: 0.001,
            beta_final: 1.0,
            abs_error_upper: 1.0,
        }
    }
}

impl PerConfig {
    /// Sets the priority floor `epsilon`.
    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the prioritization exponent `alpha`.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the initial importance sampling exponent `beta_0`.
    pub fn beta_0(mut self, beta_0: f32) -> Self {
        self.beta_0 = beta_0;
        self
    }

    /// Sets the increment of the importance sampling exponent per sampling call.
    pub fn beta_increment(mut self, beta_increment: f32) -> Self {
        self.beta_increment = beta_increment;
        self
    }

    /// Sets the final importance sampling exponent `beta_final`.
    pub fn beta_final(mut self, beta_final: f32) -> Self {
        self.beta_final = beta_final;
        self
    }

    /// Sets the ceiling of absolute TD errors.
    pub fn abs_error_upper(mut self, abs_error_upper: f32) -> Self {
        self.abs_error_upper = abs_error_upper;
        self
    }

    /// Checks that the parameters describe a valid priority scheme.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| -> Result<()> {
            bail!(HaliteError::InvalidArgument(format!(
                "{} in {:?}",
                msg, self
            )))
        };

        if !(self.epsilon > 0.0) {
            return invalid("epsilon must be positive");
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return invalid("alpha must be in [0, 1]");
        }
        if !(self.abs_error_upper > 0.0) || !self.abs_error_upper.is_finite() {
            return invalid("abs_error_upper must be positive and finite");
        }
        if !(self.beta_increment >= 0.0) {
            return invalid("beta_increment must be non-negative");
        }
        if !(self.beta_0 >= 0.0 && self.beta_0 <= self.beta_final && self.beta_final <= 1.0) {
            return invalid("beta must satisfy 0 <= beta_0 <= beta_final <= 1");
        }
        Ok(())
    }
}

/// Configuration of replay memories.
///
/// # Examples
///
/// ```rust
/// use halite_core::replay_memory::{PerConfig, ReplayMemoryConfig};
///
/// // Uniform replay
/// let config = ReplayMemoryConfig::default()
///     .capacity(10000)
///     .seed(42)
///     .per_config(None);
///
/// // Prioritized replay
/// let config_with_per = ReplayMemoryConfig::default()
///     .capacity(10000)
///     .per_config(Some(PerConfig::default().alpha(0.7)));
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayMemoryConfig {
    /// Maximum number of transitions. When the memory is full, new transitions
    /// replace the oldest ones.
    pub capacity: usize,

    /// Random seed used for sampling transitions.
    pub seed: u64,

    /// Configuration for prioritized experience replay. `None` selects uniform
    /// sampling.
    pub per_config: Option<PerConfig>,
}

impl Default for ReplayMemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 5000,
            seed: 42,
            per_config: Some(PerConfig::default()),
        }
    }
}

impl ReplayMemoryConfig {
    /// Sets the capacity of the replay memory.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the configuration for prioritized experience replay.
    pub fn per_config(mut self, per_config: Option<PerConfig>) -> Self {
        self.per_config = per_config;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_replay_memory_config() -> Result<()> {
        let config = ReplayMemoryConfig::default()
            .capacity(100)
            .seed(3)
            .per_config(Some(PerConfig::default().alpha(0.5).beta_increment(0.01)));

        let dir = TempDir::new("replay_memory_config")?;
        let path = dir.path().join("replay_memory_config.yaml");

        config.save(&path)?;
        let config_ = ReplayMemoryConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_per_config_validate() {
        assert!(PerConfig::default().validate().is_ok());
        assert!(PerConfig::default().epsilon(0.0).validate().is_err());
        assert!(PerConfig::default().alpha(-1.0).validate().is_err());
        assert!(PerConfig::default().alpha(30.0).validate().is_err());
        assert!(PerConfig::default().alpha(f32::NAN).validate().is_err());
        assert!(PerConfig::default().abs_error_upper(f32::NAN).validate().is_err());
        assert!(PerConfig::default().beta_0(1.2).validate().is_err());
        assert!(PerConfig::default().alpha(0.0).validate().is_ok());
        assert!(PerConfig::default().alpha(1.0).validate().is_ok());
    }
}
