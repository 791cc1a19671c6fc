#![warn(missing_docs)]
//! Prioritized experience replay for Q-learning agents.
//!
//! The core of the crate is [`replay_memory::ReplayMemory`], a ring buffer of
//! transitions backed by a sum tree, sampled proportionally to TD-error-derived
//! priorities with importance-sampling weight correction.
pub mod error;
pub mod replay_memory;

mod base;
pub use base::{ActionModel, Configurable, ExperienceBufferBase, ReplayBufferBase};

mod transition;
pub use transition::Transition;
