//! Replay memories for Q-learning agents.
//!
//! # Key Components
//!
//! - [`ReplayMemory`]: prioritized experience replay over a [`PrioritySumTree`]
//! - [`UniformMemory`]: plain ring buffer sampled uniformly
//! - [`SharedReplayMemory`]: a [`ReplayMemory`] behind a mutex, for use across threads
//! - [`ReplayMemoryConfig`], [`PerConfig`]: configuration, loadable from YAML
//!
//! # Examples
//!
//! ```rust
//! use halite_core::{
//!     replay_memory::{PerConfig, ReplayMemory, ReplayMemoryConfig},
//!     ExperienceBufferBase, ReplayBufferBase, Transition,
//! };
//!
//! let config = ReplayMemoryConfig::default()
//!     .capacity(1000)
//!     .seed(42)
//!     .per_config(Some(PerConfig::default().alpha(0.6).beta_0(0.4)));
//! let mut memory = ReplayMemory::<Transition<usize, usize>>::build(&config).unwrap();
//!
//! memory.push(Transition::new(0, 1, 1.0, 1, false)).unwrap();
//! let batch = memory.batch(1).unwrap();
//! memory.update_priority(&batch.indices, &[0.3]).unwrap();
//! ```
mod base;
mod batch;
mod config;
mod shared;
mod uniform;
pub use base::{BetaScheduler, PrioritySumTree, ReplayMemory};
pub use batch::SampledBatch;
pub use config::{PerConfig, ReplayMemoryConfig};
pub use shared::SharedReplayMemory;
pub use uniform::UniformMemory;
